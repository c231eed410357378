//! Byte-level reading over in-memory buffers.
//!
//! GIF is a byte-aligned little-endian format, so this reader exposes
//! byte and `u16` reads plus cursor control. Reads past the end of the
//! buffer return [`Error::TruncatedData`]; the structural parser maps
//! that to a sticky format-error status.

use crate::error::{Error, Result};

/// A cursor over a borrowed byte slice, little-endian.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a new reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if the cursor is at or past the end of the buffer.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Move the cursor to an absolute position.
    ///
    /// Positions past the end are clamped to the end of the buffer.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Advance the cursor by `n` bytes, clamped to the end of the buffer.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.data.len());
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(Error::TruncatedData {
                expected: self.pos + 1,
                actual: self.data.len(),
            })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read a 16-bit value, LSB first.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        if self.pos + 2 > self.data.len() {
            return Err(Error::TruncatedData {
                expected: self.pos + 2,
                actual: self.data.len(),
            });
        }
        let value = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    /// Read exactly `buf.len()` bytes into `buf`.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.pos + buf.len() > self.data.len() {
            return Err(Error::TruncatedData {
                expected: self.pos + buf.len(),
                actual: self.data.len(),
            });
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    /// Borrow `n` bytes at the cursor without copying.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(Error::TruncatedData {
                expected: self.pos + n,
                actual: self.data.len(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}
