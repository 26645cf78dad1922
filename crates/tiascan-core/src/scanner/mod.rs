//! Binary scanning module for recovering compressed segments.
//!
//! The container file has no authoritative index: embedded zlib streams sit
//! at arbitrary offsets between opaque bytes. This module walks the raw
//! buffer, probes every position that carries a plausible stream signature,
//! and keeps the regions that actually decompress.
//!
//! ## Algorithm Overview
//!
//! 1. Test each cursor position for the two-byte zlib signature
//! 2. On a match, speculatively inflate starting at that position
//! 3. On success, record the segment and jump the cursor past the
//!    consumed input bytes
//! 4. On failure, advance the cursor by exactly one byte and retry
//!
//! The signature is necessary but not sufficient proof of a segment
//! boundary, so every rejection falls back to single-byte advancement.

mod inflate;

use tracing::{debug, trace};

use inflate::inflate_prefix;

/// First byte of a zlib stream header
const SIGNATURE_FIRST: u8 = 0x78;

/// Recognized second bytes of a zlib stream header (compression levels)
const SIGNATURE_SECOND: [u8; 4] = [0x01, 0x5E, 0x9C, 0xDA];

/// A recovered, independently-decompressed region of the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Byte offset in the original input where the stream started
    pub offset: usize,
    /// Number of input bytes the compressed stream occupied
    pub compressed_len: usize,
    /// The decompressed payload
    pub payload: Vec<u8>,
}

impl Segment {
    /// Returns the decompressed payload as a slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Length of the decompressed payload in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Outcome of probing a single candidate position.
///
/// An explicit two-variant result rather than exception suppression: a
/// signature match on arbitrary bytes is expected and must stay auditable.
#[derive(Debug, Clone)]
enum Candidate {
    /// The position held a real stream and produced a segment
    Recovered(Segment),
    /// The signature match was coincidental or the stream was too small
    Rejected,
}

/// Configuration for the segment scanner
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Minimum decompressed size for a valid segment (filters noise from
    /// coincidental signature matches)
    pub min_payload_size: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_payload_size: 10,
        }
    }
}

impl ScannerConfig {
    /// Creates a new scanner config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum payload size filter
    pub fn min_payload_size(mut self, size: usize) -> Self {
        self.min_payload_size = size;
        self
    }
}

/// Scanner that recovers compressed segments from an opaque byte stream
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    /// Creates a new scanner with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Scan the buffer and return every recovered segment in offset order.
    ///
    /// Segments never overlap: the cursor always jumps past an accepted
    /// segment's consumed bytes, since re-scanning inside a recovered
    /// stream could only find spurious internal matches.
    pub fn scan(&self, data: &[u8]) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut position = 0;

        debug!("Starting scan of {} bytes", data.len());

        while position + 2 <= data.len() {
            if !has_signature(data, position) {
                position += 1;
                continue;
            }

            match self.probe(data, position) {
                Candidate::Recovered(segment) => {
                    trace!(
                        "Recovered segment at offset {} ({} compressed, {} decompressed)",
                        segment.offset,
                        segment.compressed_len,
                        segment.len()
                    );
                    position += segment.compressed_len;
                    segments.push(segment);
                }
                Candidate::Rejected => {
                    position += 1;
                }
            }
        }

        debug!("Scan complete: {} segments", segments.len());
        segments
    }

    /// Probe a single candidate position for a decompressible stream
    fn probe(&self, data: &[u8], offset: usize) -> Candidate {
        match inflate_prefix(&data[offset..]) {
            Some(inflated) if inflated.payload.len() >= self.config.min_payload_size => {
                Candidate::Recovered(Segment {
                    offset,
                    compressed_len: inflated.consumed,
                    payload: inflated.payload,
                })
            }
            _ => Candidate::Rejected,
        }
    }
}

/// Test whether the two bytes at `position` form a zlib stream signature
fn has_signature(data: &[u8], position: usize) -> bool {
    data[position] == SIGNATURE_FIRST && SIGNATURE_SECOND.contains(&data[position + 1])
}

/// Scan a file for compressed segments.
///
/// This is a convenience function that reads the file and scans it.
pub fn scan_file(path: impl AsRef<std::path::Path>) -> crate::Result<Vec<Segment>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| crate::Error::file_read(path, e))?;
    Ok(Scanner::new().scan(&data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    /// Random-ish filler that never contains the 0x78 signature byte
    fn filler(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 31 + 7) % 0x77) as u8).collect()
    }

    #[test]
    fn test_recovers_embedded_segment() {
        let original = b"payload embedded between opaque bytes".repeat(3);
        let compressed = deflate(&original);

        let mut buffer = filler(137);
        let insertion_point = buffer.len();
        buffer.extend_from_slice(&compressed);
        buffer.extend_from_slice(&filler(71));

        let segments = Scanner::new().scan(&buffer);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].offset, insertion_point);
        assert_eq!(segments[0].payload, original);
        assert_eq!(segments[0].compressed_len, compressed.len());
    }

    #[test]
    fn test_multiple_segments_in_order() {
        let first = deflate(&[0xAAu8; 64]);
        let second = deflate(&[0xBBu8; 64]);

        let mut buffer = Vec::new();
        buffer.extend_from_slice(&first);
        buffer.extend_from_slice(&filler(19));
        let second_offset = buffer.len();
        buffer.extend_from_slice(&second);

        let segments = Scanner::new().scan(&buffer);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].offset, 0);
        assert_eq!(segments[1].offset, second_offset);
        assert_eq!(segments[1].payload, vec![0xBBu8; 64]);
    }

    #[test]
    fn test_rejected_candidate_resynchronizes() {
        // [0x78, 0xDA] is a well-formed zlib header, but the deflate body
        // behind it (the next stream's own header bytes) is malformed. The
        // scanner must reject the candidate at offset 0 and still recover
        // the real stream starting at offset 2.
        let compressed = deflate(b"resynchronization target payload");
        let mut buffer = vec![0x78, 0xDA];
        buffer.extend_from_slice(&compressed);

        let segments = Scanner::new().scan(&buffer);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].offset, 2);
        assert_eq!(segments[0].payload, b"resynchronization target payload");
    }

    #[test]
    fn test_small_payload_rejected() {
        // Decompresses fine but to fewer than the minimum bytes
        let compressed = deflate(b"tiny");
        let segments = Scanner::new().scan(&compressed);
        assert!(segments.is_empty());

        let relaxed = Scanner::with_config(ScannerConfig::new().min_payload_size(1));
        let segments = relaxed.scan(&compressed);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].payload, b"tiny");
    }

    #[test]
    fn test_empty_input() {
        assert!(Scanner::new().scan(&[]).is_empty());
    }

    #[test]
    fn test_no_signature_no_segments() {
        let segments = Scanner::new().scan(&filler(4096));
        assert!(segments.is_empty());
    }

    #[test]
    fn test_segments_do_not_overlap() {
        let inner = deflate(&[0x11u8; 512]);
        let mut buffer = Vec::new();
        for _ in 0..3 {
            buffer.extend_from_slice(&inner);
        }

        let segments = Scanner::new().scan(&buffer);
        assert_eq!(segments.len(), 3);
        for pair in segments.windows(2) {
            assert!(pair[0].offset + pair[0].compressed_len <= pair[1].offset);
        }
    }
}
