//! Property-based robustness tests for the codec.
//!
//! Malformed input must never panic: the parser degrades to a status
//! code and the decoder produces best-effort frames or nothing.

use gifwall_codec::{GifDecoder, HeaderParser};
use gifwall_core::SharedPools;
use proptest::prelude::*;

proptest! {
    /// Arbitrary bytes never panic the structural parser.
    #[test]
    fn parser_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let header = HeaderParser::new(&data).parse();
        // Frames are only indexed while the stream still parses.
        if header.status.is_error() {
            prop_assert!(header.frames.len() <= data.len());
        }
    }

    /// Arbitrary bytes behind a valid signature never panic a full
    /// decode pass.
    #[test]
    fn decode_never_panics(tail in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&tail);

        let mut decoder = GifDecoder::new(SharedPools::new());
        let status = decoder.read(data);
        if status.is_error() {
            return Ok(());
        }
        for _ in 0..decoder.frame_count() {
            decoder.advance();
            if let Some(frame) = decoder.next_frame() {
                decoder.pools().release_frame(frame);
            }
        }
    }

    /// Corrupting a single byte of a well-formed stream never panics.
    #[test]
    fn single_byte_corruption_never_panics(pos in 6usize..64, byte in any::<u8>()) {
        let mut data = well_formed_gif();
        if pos < data.len() {
            data[pos] = byte;
        }

        let mut decoder = GifDecoder::new(SharedPools::new());
        if decoder.read(data).is_error() {
            return Ok(());
        }
        for _ in 0..decoder.frame_count() {
            decoder.advance();
            if let Some(frame) = decoder.next_frame() {
                decoder.pools().release_frame(frame);
            }
        }
    }
}

fn well_formed_gif() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"GIF89a");
    data.extend_from_slice(&[0x02, 0x00, 0x02, 0x00, 0x80, 0x00, 0x00]);
    data.extend_from_slice(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF]);
    data.extend_from_slice(&[0x21, 0xF9, 0x04, 0x00, 0x0A, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00]);
    // Codes: clear(4), 0, 1, 0, 1, eoi(5); the width grows to 4 bits
    // mid-stream.
    data.extend_from_slice(&[0x02, 0x03, 0x44, 0x10, 0x05, 0x00]);
    data.push(0x3B);
    data
}
