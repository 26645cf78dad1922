//! Package name extraction from MetaInfo pages.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scanner::Segment;

use super::contains_bytes;

/// MetaInfo pages are large XML documents; anything smaller is a different
/// page type that merely mentions packages.
const MIN_PAGE_SIZE: usize = 10_000;

/// How far into the payload the opening marker may appear
const MARKER_WINDOW: usize = 200;

static PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"Package name="([^"]+)""#).expect("package pattern"));

/// Extract schema package names from MetaInfo segments.
pub fn packages(segments: &[Segment]) -> Vec<String> {
    let mut names = Vec::new();

    for segment in segments {
        if segment.len() <= MIN_PAGE_SIZE {
            continue;
        }
        let head = &segment.payload[..segment.len().min(MARKER_WINDOW)];
        if !contains_bytes(head, b"<MetaInfo") {
            continue;
        }

        let text = String::from_utf8_lossy(&segment.payload);
        for capture in PACKAGE_RE.captures_iter(&text) {
            names.push(capture[1].to_string());
        }
    }

    names
}
