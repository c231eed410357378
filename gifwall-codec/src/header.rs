//! GIF data model: header, frame metadata, color tables, constants.

use gifwall_core::Status;

/// GIF87a file signature.
pub const GIF87A_SIGNATURE: &[u8; 6] = b"GIF87a";
/// GIF89a file signature.
pub const GIF89A_SIGNATURE: &[u8; 6] = b"GIF89a";

/// Extension introducer byte.
pub const EXTENSION_INTRODUCER: u8 = 0x21;
/// Image separator byte.
pub const IMAGE_SEPARATOR: u8 = 0x2C;
/// File trailer byte.
pub const TRAILER: u8 = 0x3B;

/// Graphic control extension label.
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
/// Comment extension label.
pub const COMMENT_LABEL: u8 = 0xFE;
/// Application extension label.
pub const APPLICATION_LABEL: u8 = 0xFF;
/// Plain text extension label.
pub const PLAIN_TEXT_LABEL: u8 = 0x01;

/// The minimum frame delay in hundredths of a second.
pub const MIN_FRAME_DELAY_CS: u16 = 2;
/// Substitute delay in hundredths of a second for frames below the floor.
pub const DEFAULT_FRAME_DELAY_CS: u16 = 10;

/// Maximum number of color table entries.
pub const MAX_COLORS: usize = 256;

/// A fixed-capacity table of packed ARGB colors (alpha forced opaque).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: [u32; MAX_COLORS],
    len: usize,
}

impl ColorTable {
    /// Build a table from raw 3-byte RGB entries.
    pub fn from_rgb(rgb: &[u8]) -> Self {
        let mut colors = [0u32; MAX_COLORS];
        let len = (rgb.len() / 3).min(MAX_COLORS);
        for (i, chunk) in rgb.chunks_exact(3).take(len).enumerate() {
            colors[i] = 0xFF00_0000
                | (u32::from(chunk[0]) << 16)
                | (u32::from(chunk[1]) << 8)
                | u32::from(chunk[2]);
        }
        Self { colors, len }
    }

    /// Number of colors read into the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the table holds no colors.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Look up a packed ARGB color by index.
    ///
    /// Out-of-table indices resolve to transparent black, matching the
    /// zero-filled slack of the fixed 256-slot table.
    pub fn get(&self, index: u8) -> u32 {
        self.colors[index as usize]
    }

    /// Borrow the full 256-slot table.
    pub fn colors(&self) -> &[u32; MAX_COLORS] {
        &self.colors
    }
}

/// GIF frame disposal method: the action taken on the canvas after a
/// frame is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposal {
    /// Leave the canvas as-is.
    #[default]
    None,
    /// Clear the frame's rectangle to the background color.
    Background,
    /// Restore the frame's rectangle to its pre-frame contents.
    Previous,
}

impl Disposal {
    /// Decode the 3-bit disposal field of a graphic control extension
    /// packed byte. "Unspecified" (0) and reserved values normalize to
    /// [`Disposal::None`].
    pub fn from_packed(packed: u8) -> Self {
        match (packed >> 2) & 0x07 {
            2 => Disposal::Background,
            3 => Disposal::Previous,
            _ => Disposal::None,
        }
    }
}

/// Netscape loop extension value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopCount {
    /// No NETSCAPE2.0 extension was present.
    #[default]
    Missing,
    /// Loop count 0: repeat indefinitely.
    Forever,
    /// Loop count n > 0.
    Count(u16),
}

impl LoopCount {
    /// Interpret a raw loop-count value from the extension sub-block.
    pub fn from_raw(raw: u16) -> Self {
        if raw == 0 {
            LoopCount::Forever
        } else {
            LoopCount::Count(raw)
        }
    }

    /// Total number of times the animation sequence plays, matching
    /// common browser behavior: no extension plays once, a count of n
    /// plays n + 1 times.
    pub fn total_iterations(self) -> Option<u32> {
        match self {
            LoopCount::Missing => Some(1),
            LoopCount::Forever => None,
            LoopCount::Count(n) => Some(u32::from(n) + 1),
        }
    }
}

/// Metadata for a single frame, recorded by the structural pre-scan.
///
/// The compressed pixel data itself is not held here; `data_offset`
/// points at the LZW minimum-code-size byte inside the source buffer.
#[derive(Debug, Clone, Default)]
pub struct GifFrame {
    /// X offset of the frame rectangle within the logical screen.
    pub x: u16,
    /// Y offset of the frame rectangle within the logical screen.
    pub y: u16,
    /// Frame rectangle width.
    pub width: u16,
    /// Frame rectangle height.
    pub height: u16,
    /// Rows are stored in four-pass interlace order.
    pub interlaced: bool,
    /// A transparent index is declared for this frame.
    pub transparency: bool,
    /// The declared transparent index.
    pub transparent_index: u8,
    /// Disposal method applied after this frame displays.
    pub disposal: Disposal,
    /// Display duration in milliseconds, floor-adjusted.
    pub delay_ms: u32,
    /// Byte offset of the frame's compressed data in the source buffer.
    pub data_offset: usize,
    /// Local color table, overriding the global one for this frame.
    pub local_color_table: Option<ColorTable>,
}

/// Parsed GIF header and frame index.
///
/// Immutable once parsing completes; owned by the decoder session that
/// parsed it.
#[derive(Debug, Clone, Default)]
pub struct GifHeader {
    /// Logical screen width.
    pub width: u16,
    /// Logical screen height.
    pub height: u16,
    /// Global color table, if the stream declares one.
    pub global_color_table: Option<ColorTable>,
    /// Background color index into the global table.
    pub background_index: u8,
    /// Background color resolved through the global table (opaque ARGB),
    /// or 0 when no global table exists.
    pub background_color: u32,
    /// Pixel aspect ratio byte, kept verbatim.
    pub pixel_aspect: u8,
    /// Netscape loop count.
    pub loop_count: LoopCount,
    /// Frame metadata in stream order.
    pub frames: Vec<GifFrame>,
    /// Overall parse status.
    pub status: Status,
}

impl GifHeader {
    /// Number of frames found by the pre-scan.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// True when the stream parsed cleanly and holds at least one frame.
    pub fn is_usable(&self) -> bool {
        self.status.is_ok() && !self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposal_from_packed() {
        assert_eq!(Disposal::from_packed(0x00), Disposal::None);
        // "Do not dispose" (1) and "unspecified" (0) both keep the canvas.
        assert_eq!(Disposal::from_packed(0x04), Disposal::None);
        assert_eq!(Disposal::from_packed(0x08), Disposal::Background);
        assert_eq!(Disposal::from_packed(0x0C), Disposal::Previous);
        // Reserved values normalize to None.
        assert_eq!(Disposal::from_packed(0x1C), Disposal::None);
    }

    #[test]
    fn test_color_table_packing() {
        let table = ColorTable::from_rgb(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0), 0xFFFF0000);
        assert_eq!(table.get(1), 0xFF0000FF);
        // Slack entries are zero.
        assert_eq!(table.get(200), 0);
    }

    #[test]
    fn test_loop_count_mapping() {
        assert_eq!(LoopCount::Missing.total_iterations(), Some(1));
        assert_eq!(LoopCount::Forever.total_iterations(), None);
        assert_eq!(LoopCount::Count(5).total_iterations(), Some(6));
        assert_eq!(LoopCount::from_raw(0), LoopCount::Forever);
        assert_eq!(LoopCount::from_raw(5), LoopCount::Count(5));
    }
}
