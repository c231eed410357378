//! Stateful GIF decode session.
//!
//! [`GifDecoder`] owns a parsed [`GifHeader`] plus the raw byte buffer
//! and walks the animation forward one frame at a time, compositing each
//! frame onto an accumulated canvas according to its disposal method.
//! Decoding is inherently sequential: LZW state and disposal compositing
//! are cumulative, so random access means replaying from frame 0.
//!
//! Output rasters come from a [`SharedPools`] and are handed to the
//! caller owned; the caller releases superseded buffers back to the same
//! pools.

use crate::header::{Disposal, GifFrame, GifHeader, LoopCount};
use crate::lzw::LzwDecoder;
use crate::parser::HeaderParser;
use gifwall_core::{ByteReader, PixelBuffer, SharedPools, Status};
use std::io::Read;
use tracing::{debug, trace};

/// Interlace pass table: (starting row, row step).
const INTERLACE_PASSES: [(u32, u32); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// A GIF decode session.
///
/// State machine: `Created` → [`GifDecoder::read`] → header parsed or a
/// sticky format/open error. From there, repeated
/// [`advance`](GifDecoder::advance) / [`next_frame`](GifDecoder::next_frame)
/// calls cycle through the frames, wrapping past the last frame back to
/// 0. Loop-count enforcement is a caller concern.
/// [`clear`](GifDecoder::clear) is terminal.
pub struct GifDecoder {
    pools: SharedPools,
    lzw: LzwDecoder,
    header: GifHeader,
    data: Vec<u8>,
    status: Status,
    /// Cursor; `None` before the first `advance`.
    frame_index: Option<usize>,
    /// Accumulated compositing canvas at screen dimensions.
    canvas: Vec<u32>,
    /// Rect snapshot for a pending `Previous` disposal.
    saved_rect: Vec<u32>,
    cleared: bool,
}

impl GifDecoder {
    /// Create a decoder that draws its buffers from `pools`.
    pub fn new(pools: SharedPools) -> Self {
        Self {
            pools,
            lzw: LzwDecoder::new(),
            header: GifHeader::default(),
            data: Vec::new(),
            status: Status::Ok,
            frame_index: None,
            canvas: Vec::new(),
            saved_rect: Vec::new(),
            cleared: false,
        }
    }

    /// Parse a GIF byte buffer and take ownership of it.
    pub fn read(&mut self, data: Vec<u8>) -> Status {
        if self.cleared {
            return self.status;
        }
        let header = HeaderParser::new(&data).parse();
        self.set_data(header, data)
    }

    /// Read all bytes from `source`, then parse.
    ///
    /// An I/O failure surfaces as a sticky [`Status::OpenError`].
    pub fn read_from(&mut self, mut source: impl Read) -> Status {
        let mut data = Vec::new();
        match source.read_to_end(&mut data) {
            Ok(_) => self.read(data),
            Err(err) => {
                debug!(%err, "failed to read gif source");
                self.status = Status::OpenError;
                self.status
            }
        }
    }

    /// Adopt an already-parsed header together with its source buffer.
    ///
    /// Any buffers held by a previous stream go back to the pools.
    pub fn set_data(&mut self, header: GifHeader, data: Vec<u8>) -> Status {
        self.status = header.status;
        self.header = header;
        self.data = data;
        self.frame_index = None;
        if !self.canvas.is_empty() {
            let old = std::mem::take(&mut self.canvas);
            self.pools.release_pixels(old);
        }
        if !self.saved_rect.is_empty() {
            let old = std::mem::take(&mut self.saved_rect);
            self.pools.release_pixels(old);
        }
        if self.status.is_ok() {
            let pixels = self.header.width as usize * self.header.height as usize;
            self.canvas = self.pools.obtain_pixels(pixels);
            self.canvas.fill(0);
        }
        self.status
    }

    /// Current decode status. Format and open failures persist; a
    /// partial decode applies to the most recent frame only.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Logical screen width.
    pub fn width(&self) -> u32 {
        u32::from(self.header.width)
    }

    /// Logical screen height.
    pub fn height(&self) -> u32 {
        u32::from(self.header.height)
    }

    /// Number of frames indexed by the pre-scan.
    pub fn frame_count(&self) -> usize {
        self.header.frame_count()
    }

    /// The cursor position, or `None` before the first `advance`.
    pub fn current_frame_index(&self) -> Option<usize> {
        self.frame_index
    }

    /// The shared pools this session draws from.
    pub fn pools(&self) -> &SharedPools {
        &self.pools
    }

    /// Borrow the parsed header.
    pub fn header(&self) -> &GifHeader {
        &self.header
    }

    /// Netscape loop count as declared by the stream.
    pub fn netscape_loop_count(&self) -> LoopCount {
        self.header.loop_count
    }

    /// Total plays of the sequence; `None` means forever.
    pub fn total_iteration_count(&self) -> Option<u32> {
        self.header.loop_count.total_iterations()
    }

    /// Display duration of frame `n` in milliseconds.
    pub fn delay(&self, n: usize) -> u32 {
        self.header.frames.get(n).map_or(0, |f| f.delay_ms)
    }

    /// Display duration of the frame the next `advance` moves to.
    pub fn next_delay(&self) -> u32 {
        if self.header.frames.is_empty() {
            return 0;
        }
        let next = match self.frame_index {
            None => 0,
            Some(i) => (i + 1) % self.header.frames.len(),
        };
        self.delay(next)
    }

    /// Move the frame cursor forward, wrapping to 0 after the last frame.
    pub fn advance(&mut self) {
        if self.cleared || self.status.is_terminal() || self.header.frames.is_empty() {
            return;
        }
        self.frame_index = Some(match self.frame_index {
            None => 0,
            Some(i) => (i + 1) % self.header.frames.len(),
        });
    }

    /// Reset the cursor to before the 0th frame.
    pub fn reset_frame_index(&mut self) {
        self.frame_index = None;
    }

    /// Decode and composite the frame at the cursor.
    ///
    /// Returns an owned pooled raster at the logical screen dimensions;
    /// release it back through [`pools`](GifDecoder::pools) once
    /// superseded. Returns `None` before the first `advance`, after
    /// `clear`, or when the session is in a terminal error state.
    pub fn next_frame(&mut self) -> Option<PixelBuffer> {
        if self.cleared || self.status.is_terminal() {
            return None;
        }
        let index = self.frame_index?;
        if index >= self.header.frames.len() {
            return None;
        }

        // Partial decode is a per-frame verdict.
        if self.status == Status::PartialDecode {
            self.status = Status::Ok;
        }

        let frame = self.header.frames[index].clone();
        let table = match frame
            .local_color_table
            .as_ref()
            .or(self.header.global_color_table.as_ref())
        {
            Some(table) => table.clone(),
            None => {
                debug!(index, "frame has no color table");
                self.status = Status::PartialDecode;
                return None;
            }
        };

        let frame_pixels = frame.width as usize * frame.height as usize;
        let mut indices = self.pools.obtain_bytes(frame_pixels);

        let mut reader = ByteReader::new(&self.data);
        reader.seek(frame.data_offset);
        let out = self.lzw.decode(&mut reader, &mut indices);
        if out.partial {
            trace!(index, produced = out.produced, "partial lzw stream");
            self.status = Status::PartialDecode;
        }

        // Snapshot the rect before drawing when this frame restores it.
        if frame.disposal == Disposal::Previous {
            self.save_rect(&frame);
        }

        // Blit the decoded sub-rectangle onto the accumulated canvas.
        let screen_w = u32::from(self.header.width);
        let screen_h = u32::from(self.header.height);
        let mut src_row = 0u32;
        let passes: &[(u32, u32)] = if frame.interlaced {
            &INTERLACE_PASSES
        } else {
            &[(0, 1)]
        };
        for &(start, step) in passes {
            let mut y = start;
            while y < u32::from(frame.height) {
                let dst_y = u32::from(frame.y) + y;
                if dst_y < screen_h {
                    let row_base = src_row as usize * frame.width as usize;
                    let dst_base = dst_y as usize * screen_w as usize;
                    for x in 0..u32::from(frame.width) {
                        let dst_x = u32::from(frame.x) + x;
                        if dst_x >= screen_w {
                            break;
                        }
                        let color_index = indices[row_base + x as usize];
                        if frame.transparency && color_index == frame.transparent_index {
                            continue;
                        }
                        self.canvas[dst_base + dst_x as usize] = table.get(color_index);
                    }
                }
                src_row += 1;
                y += step;
            }
        }
        self.pools.release_bytes(indices);

        // The displayed raster is a copy of the canvas; the canvas keeps
        // accumulating for the next frame.
        let mut output = self.pools.obtain_frame(screen_w, screen_h);
        output.pixels_mut().copy_from_slice(&self.canvas);

        // Prepare the canvas for the next frame per this frame's own
        // disposal method.
        match frame.disposal {
            Disposal::None => {}
            Disposal::Background => {
                let fill = if frame.transparency {
                    0
                } else {
                    self.header.background_color
                };
                self.fill_rect(&frame, fill);
            }
            Disposal::Previous => self.restore_rect(&frame),
        }

        Some(output)
    }

    /// Release every buffer and pooled resource. Terminal: no further
    /// decode calls are valid.
    pub fn clear(&mut self) {
        if self.cleared {
            return;
        }
        self.cleared = true;
        if !self.canvas.is_empty() {
            let canvas = std::mem::take(&mut self.canvas);
            self.pools.release_pixels(canvas);
        }
        if !self.saved_rect.is_empty() {
            let saved = std::mem::take(&mut self.saved_rect);
            self.pools.release_pixels(saved);
        }
        self.data = Vec::new();
    }

    fn clipped_rect(&self, frame: &GifFrame) -> (u32, u32, u32, u32) {
        let screen_w = u32::from(self.header.width);
        let screen_h = u32::from(self.header.height);
        let x0 = u32::from(frame.x).min(screen_w);
        let y0 = u32::from(frame.y).min(screen_h);
        let x1 = (u32::from(frame.x) + u32::from(frame.width)).min(screen_w);
        let y1 = (u32::from(frame.y) + u32::from(frame.height)).min(screen_h);
        (x0, y0, x1, y1)
    }

    fn save_rect(&mut self, frame: &GifFrame) {
        let (x0, y0, x1, y1) = self.clipped_rect(frame);
        let len = ((x1 - x0) * (y1 - y0)) as usize;
        if self.saved_rect.len() != len {
            if !self.saved_rect.is_empty() {
                let old = std::mem::take(&mut self.saved_rect);
                self.pools.release_pixels(old);
            }
            self.saved_rect = self.pools.obtain_pixels(len);
        }
        let screen_w = u32::from(self.header.width) as usize;
        let rect_w = (x1 - x0) as usize;
        for (row, y) in (y0..y1).enumerate() {
            let src = y as usize * screen_w + x0 as usize;
            self.saved_rect[row * rect_w..(row + 1) * rect_w]
                .copy_from_slice(&self.canvas[src..src + rect_w]);
        }
    }

    fn restore_rect(&mut self, frame: &GifFrame) {
        let (x0, y0, x1, y1) = self.clipped_rect(frame);
        let rect_w = (x1 - x0) as usize;
        if self.saved_rect.len() != rect_w * (y1 - y0) as usize {
            return;
        }
        let screen_w = u32::from(self.header.width) as usize;
        for (row, y) in (y0..y1).enumerate() {
            let dst = y as usize * screen_w + x0 as usize;
            self.canvas[dst..dst + rect_w]
                .copy_from_slice(&self.saved_rect[row * rect_w..(row + 1) * rect_w]);
        }
    }

    fn fill_rect(&mut self, frame: &GifFrame, argb: u32) {
        let (x0, y0, x1, y1) = self.clipped_rect(frame);
        let screen_w = u32::from(self.header.width) as usize;
        for y in y0..y1 {
            let base = y as usize * screen_w;
            self.canvas[base + x0 as usize..base + x1 as usize].fill(argb);
        }
    }
}

impl Drop for GifDecoder {
    fn drop(&mut self) {
        self.clear();
    }
}
