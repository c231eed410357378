//! GIF89a codec for the gifwall engine.
//!
//! Supports GIF87a and GIF89a streams with animation.
//!
//! ## Features
//!
//! - Structural header pre-scan without pixel decoding
//! - LZW decompression with best-effort recovery from truncation
//! - Frame disposal compositing (none / background / previous)
//! - Transparency and interlaced images
//! - Local and global color tables, NETSCAPE2.0 loop counts
//!
//! ## Example
//!
//! ```no_run
//! use gifwall_codec::GifDecoder;
//! use gifwall_core::SharedPools;
//!
//! # let gif_bytes: Vec<u8> = vec![];
//! let mut decoder = GifDecoder::new(SharedPools::new());
//! let status = decoder.read(gif_bytes);
//! assert!(status.is_ok());
//!
//! decoder.advance();
//! if let Some(frame) = decoder.next_frame() {
//!     // display `frame`, then hand it back
//!     decoder.pools().release_frame(frame);
//! }
//! ```

mod decoder;
mod header;
mod lzw;
mod parser;

pub use decoder::GifDecoder;
pub use header::{ColorTable, Disposal, GifFrame, GifHeader, LoopCount};
pub use lzw::{LzwDecoder, LzwOutput};
pub use parser::HeaderParser;

/// Detect whether a byte stream carries a GIF signature.
pub fn is_gif(data: &[u8]) -> bool {
    data.len() >= 6 && (&data[0..6] == header::GIF87A_SIGNATURE || &data[0..6] == header::GIF89A_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_gif() {
        assert!(is_gif(b"GIF89a\x00\x00"));
        assert!(is_gif(b"GIF87a\x00\x00"));
        assert!(!is_gif(b"GIF"));
        assert!(!is_gif(b"\x89PNG\r\n\x1a\n"));
    }
}
