//! Speculative zlib inflation.
//!
//! The container carries no index, so every candidate position is probed by
//! actually running the decompressor. A probe must report not only the
//! recovered bytes but also how many input bytes the stream occupied, so the
//! scanner can jump past an accepted segment.

use flate2::{Decompress, FlushDecompress, Status};

/// Output of a successful speculative inflation.
#[derive(Debug, Clone)]
pub(crate) struct Inflated {
    /// The decompressed payload
    pub payload: Vec<u8>,
    /// Input bytes consumed up to and including end-of-stream; trailing
    /// bytes the decompressor never touched are excluded
    pub consumed: usize,
}

/// Inflate a zlib stream that starts at the beginning of `input`.
///
/// Returns `None` when the bytes are not a decodable stream (a coincidental
/// signature match). A stream that is cut off by the end of the input is
/// still returned with whatever it produced, mirroring how a stream at the
/// tail of the container would otherwise be lost.
pub(crate) fn inflate_prefix(input: &[u8]) -> Option<Inflated> {
    let mut inflater = Decompress::new(true);
    let mut payload = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let in_before = inflater.total_in() as usize;
        let out_before = inflater.total_out();

        let status = inflater
            .decompress(&input[in_before..], &mut chunk, FlushDecompress::None)
            .ok()?;

        let produced = (inflater.total_out() - out_before) as usize;
        payload.extend_from_slice(&chunk[..produced]);

        match status {
            Status::StreamEnd => {
                return Some(Inflated {
                    payload,
                    consumed: inflater.total_in() as usize,
                });
            }
            Status::Ok | Status::BufError => {
                let consumed = inflater.total_in() as usize;
                if consumed >= input.len() && produced == 0 {
                    // Input exhausted before end-of-stream
                    if payload.is_empty() {
                        return None;
                    }
                    return Some(Inflated { payload, consumed });
                }
                if consumed == in_before && produced == 0 {
                    // Decoder stalled without consuming or producing
                    return None;
                }
            }
        }
    }
}
