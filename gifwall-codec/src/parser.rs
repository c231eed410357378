//! Structural GIF header parser.
//!
//! Reads the logical screen descriptor, color tables, and the content
//! block sequence into a [`GifHeader`], recording each frame's position,
//! timing, and compressed-data offset. Pixel data is skipped, not
//! decoded; this is a pre-scan that lets the decoder session seek
//! straight to a frame's LZW stream later.
//!
//! Failure never surfaces as `Err` or a panic: any truncation or
//! unexpected byte sets a sticky format-error status on the header, and
//! all further reads become no-ops that preserve it.

use crate::header::{
    ColorTable, Disposal, GifFrame, GifHeader, LoopCount, APPLICATION_LABEL, COMMENT_LABEL,
    DEFAULT_FRAME_DELAY_CS, EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, IMAGE_SEPARATOR,
    MIN_FRAME_DELAY_CS, PLAIN_TEXT_LABEL, TRAILER,
};
use gifwall_core::{ByteReader, Status};
use tracing::debug;

/// Maximum sub-block payload size.
const MAX_BLOCK_SIZE: usize = 256;

/// Parses [`GifHeader`]s from raw GIF byte streams.
pub struct HeaderParser<'a> {
    reader: ByteReader<'a>,
    header: GifHeader,
    /// Frame under construction, created by a graphic control extension
    /// or lazily at the image separator when no extension preceded it.
    current_frame: Option<GifFrame>,
    /// Working array for sub-block reads.
    block: [u8; MAX_BLOCK_SIZE],
    block_size: usize,
}

impl<'a> HeaderParser<'a> {
    /// Create a parser over a raw GIF byte buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(data),
            header: GifHeader::default(),
            current_frame: None,
            block: [0; MAX_BLOCK_SIZE],
            block_size: 0,
        }
    }

    /// Parse the full header and frame index.
    pub fn parse(mut self) -> GifHeader {
        self.read_header();
        if !self.err() {
            self.read_contents(usize::MAX);
        }
        self.header
    }

    /// Determine whether the stream is animated by reading at most the
    /// first two frames. Cheaper than a full parse for large files.
    pub fn is_animated(mut self) -> bool {
        self.read_header();
        if !self.err() {
            self.read_contents(2);
        }
        self.header.frame_count() > 1
    }

    fn err(&self) -> bool {
        self.header.status.is_error()
    }

    /// Read one byte; on underrun set format-error and return 0.
    fn read_u8(&mut self) -> u8 {
        if self.err() {
            return 0;
        }
        match self.reader.read_u8() {
            Ok(byte) => byte,
            Err(_) => {
                self.header.status = Status::FormatError;
                0
            }
        }
    }

    /// Read a 16-bit little-endian value with the same error contract.
    fn read_u16(&mut self) -> u16 {
        if self.err() {
            return 0;
        }
        match self.reader.read_u16_le() {
            Ok(value) => value,
            Err(_) => {
                self.header.status = Status::FormatError;
                0
            }
        }
    }

    /// Signature and logical screen descriptor, plus the global color
    /// table when one is declared.
    fn read_header(&mut self) {
        let mut signature = [0u8; 6];
        for byte in &mut signature {
            *byte = self.read_u8();
        }
        if !signature.starts_with(b"GIF") {
            self.header.status = Status::FormatError;
            return;
        }

        self.read_logical_screen_descriptor();
    }

    fn read_logical_screen_descriptor(&mut self) {
        self.header.width = self.read_u16();
        self.header.height = self.read_u16();

        // Packed field: GCT flag (bit 7), color resolution (6-4),
        // sort flag (3), GCT size exponent (2-0).
        let packed = self.read_u8();
        let gct_flag = packed & 0x80 != 0;
        let gct_size = 2usize.pow(u32::from(packed & 0x07) + 1);

        self.header.background_index = self.read_u8();
        self.header.pixel_aspect = self.read_u8();

        if gct_flag && !self.err() {
            self.header.global_color_table = self.read_color_table(gct_size);
            if let Some(table) = &self.header.global_color_table {
                self.header.background_color = table.get(self.header.background_index);
            }
        }
    }

    /// Read `n_colors` 3-byte RGB entries into a fixed-capacity table.
    ///
    /// A buffer underrun degrades to format-error with no table.
    fn read_color_table(&mut self, n_colors: usize) -> Option<ColorTable> {
        match self.reader.read_slice(3 * n_colors) {
            Ok(rgb) => Some(ColorTable::from_rgb(rgb)),
            Err(_) => {
                debug!("format error reading color table");
                self.header.status = Status::FormatError;
                None
            }
        }
    }

    /// Main content loop. Reads blocks until the trailer, an error, or
    /// more than `max_frames` frames have been indexed.
    fn read_contents(&mut self, max_frames: usize) {
        let mut done = false;
        while !(done || self.err() || self.header.frame_count() > max_frames) {
            match self.read_u8() {
                IMAGE_SEPARATOR => self.read_image_descriptor(),
                EXTENSION_INTRODUCER => match self.read_u8() {
                    GRAPHIC_CONTROL_LABEL => {
                        // Starts a new frame; the descriptor follows.
                        self.current_frame = Some(GifFrame::default());
                        self.read_graphic_control_ext();
                    }
                    APPLICATION_LABEL => {
                        self.read_block();
                        if &self.block[..11.min(self.block_size)] == b"NETSCAPE2.0" {
                            self.read_netscape_ext();
                        } else {
                            self.skip_sub_blocks();
                        }
                    }
                    COMMENT_LABEL | PLAIN_TEXT_LABEL => self.skip_sub_blocks(),
                    _ => self.skip_sub_blocks(),
                },
                TRAILER => done = true,
                _ => {
                    if !self.err() {
                        self.header.status = Status::FormatError;
                    }
                }
            }
        }
    }

    /// Graphic control extension: disposal, transparency, delay.
    fn read_graphic_control_ext(&mut self) {
        // Block size byte, always 4.
        self.read_u8();

        let packed = self.read_u8();
        let mut delay_cs = self.read_u16();
        if delay_cs < MIN_FRAME_DELAY_CS {
            delay_cs = DEFAULT_FRAME_DELAY_CS;
        }
        let transparent_index = self.read_u8();
        // Block terminator.
        self.read_u8();

        if let Some(frame) = &mut self.current_frame {
            frame.disposal = Disposal::from_packed(packed);
            frame.transparency = packed & 0x01 != 0;
            frame.delay_ms = u32::from(delay_cs) * 10;
            frame.transparent_index = transparent_index;
        }
    }

    /// Image descriptor plus optional local color table. Records the
    /// compressed-data offset and skips the LZW sub-blocks.
    fn read_image_descriptor(&mut self) {
        // The graphic control extension is optional; without one the
        // frame is created here with default timing and disposal.
        let mut frame = self.current_frame.take().unwrap_or_default();

        frame.x = self.read_u16();
        frame.y = self.read_u16();
        frame.width = self.read_u16();
        frame.height = self.read_u16();

        // Packed field: LCT flag (bit 7), interlace (6), sort (5),
        // LCT size exponent (2-0).
        let packed = self.read_u8();
        let lct_flag = packed & 0x80 != 0;
        let lct_size = 2usize.pow(u32::from(packed & 0x07) + 1);
        frame.interlaced = packed & 0x40 != 0;

        if lct_flag {
            frame.local_color_table = self.read_color_table(lct_size);
        }

        // The decoder session seeks here to find the LZW stream.
        frame.data_offset = self.reader.position();

        self.skip_image_data();
        if self.err() {
            return;
        }
        self.header.frames.push(frame);
    }

    /// NETSCAPE2.0 application extension: loop count sub-block.
    fn read_netscape_ext(&mut self) {
        loop {
            self.read_block();
            if self.block_size >= 3 && self.block[0] == 0x01 {
                let raw = u16::from_le_bytes([self.block[1], self.block[2]]);
                self.header.loop_count = LoopCount::from_raw(raw);
            }
            if self.block_size == 0 || self.err() {
                break;
            }
        }
    }

    /// Skip a frame's pixel data: the LZW minimum code size byte plus
    /// the data sub-blocks.
    fn skip_image_data(&mut self) {
        self.read_u8();
        self.skip_sub_blocks();
    }

    /// Skip variable-length sub-blocks up to and including the next
    /// zero-length terminator.
    fn skip_sub_blocks(&mut self) {
        loop {
            let block_size = self.read_u8();
            self.reader.skip(block_size as usize);
            if block_size == 0 || self.err() {
                break;
            }
        }
    }

    /// Read the next sub-block into the working array.
    fn read_block(&mut self) {
        self.block_size = self.read_u8() as usize;
        if self.block_size > 0 {
            if self
                .reader
                .read_exact(&mut self.block[..self.block_size])
                .is_err()
            {
                debug!(block_size = self.block_size, "format error reading block");
                self.header.status = Status::FormatError;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gifwall_core::Status;

    /// Minimal two-frame GIF used across the codec tests: 2x1 logical
    /// screen, global table [red, blue], frame delays 100ms and 50ms.
    pub(crate) fn two_frame_gif() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        // Logical screen: 2x1, GCT of 2 entries, background index 0.
        data.extend_from_slice(&[0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00]);
        // Global color table: red, blue.
        data.extend_from_slice(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF]);
        // Netscape loop extension, loop count 5.
        data.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        data.extend_from_slice(b"NETSCAPE2.0");
        data.extend_from_slice(&[0x03, 0x01, 0x05, 0x00, 0x00]);
        // Frame 0: GCE delay 10cs, no transparency; full-rect image.
        data.extend_from_slice(&[0x21, 0xF9, 0x04, 0x00, 0x0A, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&[0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00]);
        // LZW min code size 2; codes: clear(4), 0, 0, eoi(5) => pixels [0, 0].
        data.extend_from_slice(&[0x02, 0x02, 0x04, 0x0A, 0x00]);
        // Frame 1: GCE delay 5cs, disposal background.
        data.extend_from_slice(&[0x21, 0xF9, 0x04, 0x08, 0x05, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&[0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00]);
        // Codes: clear(4), 1, 1, eoi(5) => pixels [1, 1].
        data.extend_from_slice(&[0x02, 0x02, 0x4C, 0x0A, 0x00]);
        data.push(0x3B);
        data
    }

    #[test]
    fn test_parse_two_frames() {
        let data = two_frame_gif();
        let header = HeaderParser::new(&data).parse();

        assert_eq!(header.status, Status::Ok);
        assert_eq!(header.width, 2);
        assert_eq!(header.height, 1);
        assert_eq!(header.frame_count(), 2);
        assert_eq!(header.loop_count, LoopCount::Count(5));

        let table = header.global_color_table.as_ref().unwrap();
        assert_eq!(table.get(0), 0xFFFF0000);
        assert_eq!(table.get(1), 0xFF0000FF);
        assert_eq!(header.background_color, 0xFFFF0000);

        assert_eq!(header.frames[0].delay_ms, 100);
        assert_eq!(header.frames[0].disposal, Disposal::None);
        // 5cs sits above the 2cs floor, so it stands as declared.
        assert_eq!(header.frames[1].delay_ms, 50);
        assert_eq!(header.frames[1].disposal, Disposal::Background);
    }

    #[test]
    fn test_delay_floor_substitution() {
        let mut data = two_frame_gif();
        // Rewrite frame 0's delay to 1cs (below the 2cs floor).
        let gce_pos = data.windows(4).position(|w| w == [0x21, 0xF9, 0x04, 0x00]).unwrap();
        data[gce_pos + 4] = 0x01;
        let header = HeaderParser::new(&data).parse();
        assert_eq!(header.frames[0].delay_ms, 100);
    }

    #[test]
    fn test_bad_signature() {
        let header = HeaderParser::new(b"NOTAGIF______").parse();
        assert_eq!(header.status, Status::FormatError);
        assert_eq!(header.frame_count(), 0);
    }

    #[test]
    fn test_truncated_screen_descriptor() {
        // Signature present, LSD cut short.
        let header = HeaderParser::new(b"GIF89a\x02\x00").parse();
        assert_eq!(header.status, Status::FormatError);
        assert_eq!(header.frame_count(), 0);
    }

    #[test]
    fn test_truncated_color_table() {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00]);
        // GCT declared (2 entries = 6 bytes) but only 2 bytes present.
        data.extend_from_slice(&[0xFF, 0x00]);
        let header = HeaderParser::new(&data).parse();
        assert_eq!(header.status, Status::FormatError);
        assert!(header.global_color_table.is_none());
    }

    #[test]
    fn test_unexpected_block_byte() {
        let mut data = two_frame_gif();
        let trailer = data.len() - 1;
        data[trailer] = 0x00; // not a valid block type
        let header = HeaderParser::new(&data).parse();
        assert_eq!(header.status, Status::FormatError);
        // Frames indexed before the error are kept.
        assert_eq!(header.frame_count(), 2);
    }

    #[test]
    fn test_frame_without_gce() {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00]);
        data.extend_from_slice(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF]);
        // Image descriptor with no preceding graphic control extension.
        data.extend_from_slice(&[0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00]);
        data.extend_from_slice(&[0x02, 0x02, 0x04, 0x0A, 0x00]);
        data.push(0x3B);

        let header = HeaderParser::new(&data).parse();
        assert_eq!(header.status, Status::Ok);
        assert_eq!(header.frame_count(), 1);
        assert_eq!(header.frames[0].delay_ms, 0);
        assert_eq!(header.loop_count, LoopCount::Missing);
    }

    #[test]
    fn test_is_animated() {
        let data = two_frame_gif();
        assert!(HeaderParser::new(&data).is_animated());

        let mut single = Vec::new();
        single.extend_from_slice(b"GIF89a");
        single.extend_from_slice(&[0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00]);
        single.extend_from_slice(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF]);
        single.extend_from_slice(&[0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00]);
        single.extend_from_slice(&[0x02, 0x02, 0x04, 0x0A, 0x00]);
        single.push(0x3B);
        assert!(!HeaderParser::new(&single).is_animated());
    }
}
