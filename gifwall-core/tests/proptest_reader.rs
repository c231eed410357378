//! Property-based tests for the byte reader.
//!
//! Uses proptest to verify that cursor operations never panic and keep
//! the position within bounds for arbitrary inputs.

use gifwall_core::{ByteReader, Error};
use proptest::prelude::*;

proptest! {
    /// The cursor never leaves the buffer, whatever sequence of reads
    /// and skips is applied.
    #[test]
    fn position_stays_in_bounds(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        ops in proptest::collection::vec(0u8..4, 0..64),
    ) {
        let mut reader = ByteReader::new(&data);
        for op in ops {
            match op {
                0 => { let _ = reader.read_u8(); }
                1 => { let _ = reader.read_u16_le(); }
                2 => reader.skip(3),
                _ => reader.seek(reader.position().saturating_sub(1)),
            }
            prop_assert!(reader.position() <= data.len());
            prop_assert_eq!(reader.remaining(), data.len() - reader.position());
        }
    }

    /// A failed read does not advance the cursor.
    #[test]
    fn failed_read_keeps_position(data in proptest::collection::vec(any::<u8>(), 0..8)) {
        let mut reader = ByteReader::new(&data);
        reader.seek(data.len());
        let before = reader.position();
        let truncated = matches!(reader.read_u8(), Err(Error::TruncatedData { .. }));
        prop_assert!(truncated, "read past the end must report truncation");
        prop_assert_eq!(reader.position(), before);
    }

    /// Reading two bytes little-endian agrees with manual assembly.
    #[test]
    fn u16_is_little_endian(lo in any::<u8>(), hi in any::<u8>()) {
        let data = [lo, hi];
        let mut reader = ByteReader::new(&data);
        prop_assert_eq!(reader.read_u16_le().unwrap(), u16::from_le_bytes([lo, hi]));
    }
}
