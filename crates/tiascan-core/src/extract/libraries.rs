//! Library version reference extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::LibraryRef;
use crate::scanner::Segment;

use super::contains_bytes;

/// How far into the payload the version-list marker may appear
const MARKER_WINDOW: usize = 100;

static LIBRARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Library LibGuid="([^"]+)" DisplayVersion="([^"]+)"(?:\s+SwitchMinor="([^"]*)")?"#)
        .expect("library pattern")
});

/// Extract library references from version-list segments.
pub fn libraries(segments: &[Segment]) -> Vec<LibraryRef> {
    let mut refs = Vec::new();

    for segment in segments {
        let head = &segment.payload[..segment.len().min(MARKER_WINDOW)];
        if !contains_bytes(head, b"<LibraryVersions") {
            continue;
        }

        let text = String::from_utf8_lossy(&segment.payload);
        for capture in LIBRARY_RE.captures_iter(&text) {
            refs.push(LibraryRef {
                guid: capture[1].to_string(),
                display_version: capture[2].to_string(),
                switch_minor: capture.get(3).map(|m| m.as_str()) == Some("true"),
            });
        }
    }

    refs
}
