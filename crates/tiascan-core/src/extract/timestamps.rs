//! Timestamp extraction.
//!
//! The container stores edit timestamps as literal locale-formatted text
//! (`M/D/YYYY H:MM:SS AM`) scattered through data pages. The pattern is
//! matched over raw bytes, so pages that are not valid UTF-8 as a whole
//! still yield their timestamps.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::scanner::Segment;

use super::PAGE_SIZE;

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,2}/\d{1,2}/\d{4} \d{1,2}:\d{2}:\d{2} [AP]M").expect("timestamp pattern")
});

/// Collect all distinct timestamps, in discovery order.
pub fn timestamps(segments: &[Segment]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for segment in segments {
        if segment.len() != PAGE_SIZE {
            continue;
        }
        for needle in TIMESTAMP_RE.find_iter(&segment.payload) {
            let text = String::from_utf8_lossy(needle.as_bytes()).into_owned();
            if !found.contains(&text) {
                found.push(text);
            }
        }
    }

    found
}
