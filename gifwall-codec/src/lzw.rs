//! GIF-variant LZW decompression.
//!
//! Decodes the sub-block-framed code stream that follows a frame's
//! image descriptor into color indices. The code width starts at
//! `min_code_size + 1` bits and grows with the dictionary up to 12; a
//! clear code resets the dictionary and an end-of-information code
//! terminates the stream.
//!
//! Corrupt or truncated streams never fail hard: decoding stops at the
//! first unusable code and the caller receives whatever indices were
//! produced, flagged as partial.

use gifwall_core::ByteReader;
use tracing::trace;

/// Maximum dictionary size (12-bit codes).
const MAX_CODES: usize = 1 << 12;

/// Result of decompressing one frame's code stream.
#[derive(Debug)]
pub struct LzwOutput {
    /// Number of indices actually produced (the rest of the caller's
    /// buffer is zero-filled).
    pub produced: usize,
    /// The stream ended early or held an out-of-range code.
    pub partial: bool,
}

/// Streaming GIF LZW decoder.
///
/// The dictionary is held as prefix chains: `prefix[c]` is the code for
/// all but the last byte of entry `c`, `suffix[c]` its last byte. This
/// avoids per-entry allocation and handles the KwKwK special case by
/// re-expanding the previous chain.
pub struct LzwDecoder {
    prefix: Box<[u16; MAX_CODES]>,
    suffix: Box<[u8; MAX_CODES]>,
    /// Expansion stack for walking a prefix chain tail-first.
    stack: Vec<u8>,
}

impl LzwDecoder {
    /// Create a decoder with an empty dictionary.
    pub fn new() -> Self {
        Self {
            prefix: Box::new([0; MAX_CODES]),
            suffix: Box::new([0; MAX_CODES]),
            stack: Vec::with_capacity(MAX_CODES),
        }
    }

    /// Decode a frame's code stream into `output`.
    ///
    /// `reader` must be positioned at the LZW minimum-code-size byte (a
    /// frame's `data_offset`). `output` is sized to the frame's pixel
    /// count; decoding stops when it is full.
    pub fn decode(&mut self, reader: &mut ByteReader<'_>, output: &mut [u8]) -> LzwOutput {
        let min_code_size = match reader.read_u8() {
            Ok(size) if (2..=11).contains(&size) => u32::from(size),
            Ok(_) | Err(_) => {
                return LzwOutput {
                    produced: 0,
                    partial: true,
                }
            }
        };

        let clear_code = 1u16 << min_code_size;
        let eoi_code = clear_code + 1;
        let mut next_code = eoi_code + 1;
        let mut code_size = min_code_size + 1;
        let mut code_mask = (1u32 << code_size) - 1;

        for (i, p) in self.prefix.iter_mut().take(clear_code as usize).enumerate() {
            *p = 0;
            self.suffix[i] = i as u8;
        }
        self.stack.clear();

        // Sub-block framing state.
        let mut block_remaining = 0usize;
        // Bit accumulator, LSB-first.
        let mut datum = 0u32;
        let mut bits = 0u32;

        let mut prev_code: Option<u16> = None;
        let mut first_byte = 0u8;
        let mut produced = 0usize;
        let mut partial = false;

        'decode: while produced < output.len() {
            // Refill the accumulator one sub-block byte at a time.
            while bits < code_size {
                if block_remaining == 0 {
                    match reader.read_u8() {
                        Ok(0) | Err(_) => {
                            // Terminator or truncation before EOI.
                            partial = true;
                            break 'decode;
                        }
                        Ok(size) => block_remaining = size as usize,
                    }
                }
                match reader.read_u8() {
                    Ok(byte) => {
                        datum |= u32::from(byte) << bits;
                        bits += 8;
                        block_remaining -= 1;
                    }
                    Err(_) => {
                        partial = true;
                        break 'decode;
                    }
                }
            }

            let code = (datum & code_mask) as u16;
            datum >>= code_size;
            bits -= code_size;

            if code == clear_code {
                next_code = eoi_code + 1;
                code_size = min_code_size + 1;
                code_mask = (1 << code_size) - 1;
                prev_code = None;
                continue;
            }
            if code == eoi_code {
                break;
            }

            // An unseen code other than `next_code` is corruption.
            if code > next_code {
                trace!(code, next_code, "lzw code out of range");
                partial = true;
                break;
            }

            let mut current = if code == next_code {
                // KwKwK: expand the previous chain plus its first byte.
                match prev_code {
                    Some(prev) => {
                        self.stack.push(first_byte);
                        prev
                    }
                    None => {
                        trace!(code, "kwkwk code with no previous chain");
                        partial = true;
                        break;
                    }
                }
            } else {
                code
            };

            while current >= clear_code {
                self.stack.push(self.suffix[current as usize]);
                current = self.prefix[current as usize];
            }
            first_byte = self.suffix[current as usize];
            self.stack.push(first_byte);

            while let Some(byte) = self.stack.pop() {
                if produced == output.len() {
                    break;
                }
                output[produced] = byte;
                produced += 1;
            }

            if let Some(prev) = prev_code {
                if next_code < MAX_CODES as u16 {
                    self.prefix[next_code as usize] = prev;
                    self.suffix[next_code as usize] = first_byte;
                    next_code += 1;
                    if u32::from(next_code) & code_mask == 0 && code_size < 12 {
                        code_size += 1;
                        code_mask += u32::from(next_code);
                    }
                }
            }
            prev_code = Some(code);
        }

        // Best-effort: unset pixels are left as index 0.
        for slot in output.iter_mut().skip(produced) {
            *slot = 0;
        }

        LzwOutput { produced, partial }
    }
}

impl Default for LzwDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8], pixels: usize) -> (Vec<u8>, LzwOutput) {
        let mut reader = ByteReader::new(data);
        let mut output = vec![0u8; pixels];
        let out = LzwDecoder::new().decode(&mut reader, &mut output);
        (output, out)
    }

    #[test]
    fn test_simple_stream() {
        // min code size 2; codes clear(4), 0, 0, eoi(5).
        let (pixels, out) = decode_all(&[0x02, 0x02, 0x04, 0x0A, 0x00], 2);
        assert_eq!(pixels, vec![0, 0]);
        assert_eq!(out.produced, 2);
        assert!(!out.partial);
    }

    #[test]
    fn test_dictionary_growth() {
        // Codes: clear(4), 1, 6, eoi(5). Code 6 is the first dictionary
        // entry (KwKwK), expanding to [1, 1].
        // 3-bit LSB-first packing of [4, 1, 6, 5]: 0x8C, 0x0B.
        let (pixels, out) = decode_all(&[0x02, 0x02, 0x8C, 0x0B, 0x00], 3);
        assert_eq!(pixels, vec![1, 1, 1]);
        assert!(!out.partial);
    }

    #[test]
    fn test_truncated_stream_is_partial() {
        // Sub-block claims 2 bytes but the buffer ends after one.
        let (pixels, out) = decode_all(&[0x02, 0x02, 0x4C], 4);
        assert!(out.partial);
        assert!(out.produced < 4);
        assert_eq!(pixels.len(), 4);
    }

    #[test]
    fn test_output_fills_before_missing_terminator() {
        let (_, out) = decode_all(&[0x02, 0x02, 0x04, 0x0A], 2);
        // The output fills before the absent terminator is ever read.
        assert_eq!(out.produced, 2);
        assert!(!out.partial);
    }

    #[test]
    fn test_garbage_code_is_partial() {
        // Codes: clear(4), 7 (out of range, dictionary has 6 entries).
        let (_, out) = decode_all(&[0x02, 0x02, 0x3C, 0x00, 0x00], 4);
        assert!(out.partial);
    }

    #[test]
    fn test_invalid_min_code_size() {
        let (_, out) = decode_all(&[0x0D, 0x01, 0x00, 0x00], 4);
        assert_eq!(out.produced, 0);
        assert!(out.partial);
    }
}
