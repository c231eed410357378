//! ARGB raster buffer abstractions.
//!
//! Decoded GIF frames are composited into packed-ARGB rasters at the
//! logical screen dimensions. Buffers are tagged with a capacity class
//! (`width * height * 4` bytes) which the pools use as their key: a
//! pooled buffer can be reshaped to any dimensions of the same class
//! without reallocating.

use std::fmt;

/// Bytes per packed-ARGB pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A mutable 2D raster of packed ARGB pixels (`0xAARRGGBB`).
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Allocate a zeroed (fully transparent) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Get the buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Capacity class: the byte length used as the pooling key.
    pub fn capacity_class(&self) -> usize {
        self.pixels.len() * BYTES_PER_PIXEL
    }

    /// Reshape the buffer to new dimensions of the same capacity class.
    ///
    /// Returns false (and leaves the buffer untouched) when the pixel
    /// count differs; the pool falls back to a fresh allocation in that
    /// case.
    pub fn reconfigure(&mut self, width: u32, height: u32) -> bool {
        if width as usize * height as usize != self.pixels.len() {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Fill every pixel with a packed ARGB value.
    pub fn fill(&mut self, argb: u32) {
        self.pixels.fill(argb);
    }

    /// Get the pixel data.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Get mutable pixel data.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Get one row of pixels.
    pub fn row(&self, y: u32) -> &[u32] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// Get one mutable row of pixels.
    pub fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let start = y as usize * self.width as usize;
        let width = self.width as usize;
        &mut self.pixels[start..start + width]
    }

    /// Read a single pixel.
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Write a single pixel.
    pub fn put(&mut self, x: u32, y: u32, argb: u32) {
        self.pixels[y as usize * self.width as usize + x as usize] = argb;
    }

    /// Copy all pixels from another buffer of identical dimensions.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        assert_eq!(self.width, other.width);
        assert_eq!(self.height, other.height);
        self.pixels.copy_from_slice(&other.pixels);
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buf = PixelBuffer::new(10, 10);
        assert_eq!(buf.width(), 10);
        assert_eq!(buf.height(), 10);
        assert_eq!(buf.capacity_class(), 400);
        assert!(buf.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_reconfigure_same_class() {
        let mut buf = PixelBuffer::new(10, 10);
        assert!(buf.reconfigure(20, 5));
        assert_eq!(buf.width(), 20);
        assert_eq!(buf.height(), 5);
        assert_eq!(buf.capacity_class(), 400);
    }

    #[test]
    fn test_reconfigure_rejects_mismatch() {
        let mut buf = PixelBuffer::new(10, 10);
        assert!(!buf.reconfigure(10, 11));
        assert_eq!(buf.width(), 10);
    }

    #[test]
    fn test_pixel_access() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.put(2, 3, 0xFFFF0000);
        assert_eq!(buf.get(2, 3), 0xFFFF0000);
        assert_eq!(buf.row(3)[2], 0xFFFF0000);
    }
}
