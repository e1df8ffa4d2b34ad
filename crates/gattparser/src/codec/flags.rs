//! Flag resolver
//!
//! Converts a bit-field's raw bytes into symbolic flags (read path) and maps
//! an enumeration-backed field's value to the requirement label it selects
//! (write path). A symbolic flag is a Bit label followed by the decimal value
//! of that Bit, e.g. `G10`.

use super::bits;
use crate::error::{GattParserError, GattResult};
use crate::spec::constants::MAX_ENUMERATED_BIT_WIDTH;
use crate::spec::{BitField, Field};
use log::debug;
use std::collections::BTreeSet;

/// Decode every Bit of `bit_field` from `raw`, in ordinal order.
///
/// Zero-valued bits are reported like any other.
pub fn decode_flags(bit_field: &BitField, raw: &[u8]) -> GattResult<Vec<(String, u64)>> {
    let ordered = bit_field.ordered_bits();
    let widths: Vec<u32> = ordered.iter().map(|bit| bit.width).collect();
    let values = bits::unpack(raw, &widths)?;

    Ok(ordered
        .into_iter()
        .zip(values)
        .map(|(bit, value)| (bit.label.clone(), value))
        .collect())
}

/// The symbolic flags of a flags field `declared_width` bits wide starting at
/// bit `offset` of `raw`.
///
/// Only the field's own bits are visible to its Bits, so a bit-field wider
/// than the field fails with `OutOfRange`.
pub fn read_field_flags(
    bit_field: &BitField,
    raw: &[u8],
    offset: usize,
    declared_width: u32,
) -> GattResult<BTreeSet<String>> {
    let total = bit_field.total_width();
    if total > declared_width {
        return Err(GattParserError::OutOfRange {
            required_bits: total as usize,
            available_bits: declared_width as usize,
        });
    }

    let value = bits::read_bits(raw, offset, declared_width)?;
    let bytes = value.to_le_bytes();
    read_flags(bit_field, &bytes[..(declared_width as usize).div_ceil(8)])
}

/// Render decoded bits as symbolic flags
pub fn render_flags(decoded: &[(String, u64)]) -> BTreeSet<String> {
    decoded
        .iter()
        .map(|(label, value)| render_flag(label, *value))
        .collect()
}

/// The symbolic flags a raw flags value asserts
pub fn read_flags(bit_field: &BitField, raw: &[u8]) -> GattResult<BTreeSet<String>> {
    Ok(render_flags(&decode_flags(bit_field, raw)?))
}

/// Every symbolic flag `bit_field` could ever produce
pub fn all_possible_read_flags(bit_field: &BitField) -> BTreeSet<String> {
    let mut flags = BTreeSet::new();
    for bit in bit_field.bits() {
        let width = if bit.width > MAX_ENUMERATED_BIT_WIDTH {
            debug!(
                "Bit \"{}\" is {} bits wide; enumerating only its first {} bits of values",
                bit.label, bit.width, MAX_ENUMERATED_BIT_WIDTH
            );
            MAX_ENUMERATED_BIT_WIDTH
        } else {
            bit.width
        };
        for value in 0..(1u64 << width) {
            flags.insert(render_flag(&bit.label, value));
        }
    }
    flags
}

/// The requirement label a value of an enumeration-backed field selects
pub fn write_flag_for(field: &Field, value: Option<i64>) -> Option<&str> {
    field.enumeration(value?)?.requires.as_deref()
}

/// Every requirement label the field's enumeration table can select
pub fn all_possible_write_flags(field: &Field) -> BTreeSet<String> {
    field
        .enumerations()
        .unwrap_or(&[])
        .iter()
        .filter_map(|enumeration| enumeration.requires.clone())
        .collect()
}

/// Pack per-label values into the integer value of a flags field
/// `declared_width` bits wide.
///
/// Labels not listed are packed as zero.
pub fn encode_flags(bit_field: &BitField, declared_width: u32, values: &[(&str, u64)]) -> GattResult<u64> {
    for (label, _) in values {
        if !bit_field.bits().iter().any(|bit| bit.label == *label) {
            return Err(GattParserError::UnknownField(label.to_string()));
        }
    }

    let pairs: Vec<(u32, u64)> = bit_field
        .ordered_bits()
        .into_iter()
        .map(|bit| {
            let value = values
                .iter()
                .find(|(label, _)| *label == bit.label)
                .map_or(0, |(_, value)| *value);
            (bit.width, value)
        })
        .collect();

    let packed = bits::pack(&pairs, declared_width)?;
    bits::read_bits(&packed, 0, declared_width)
}

fn render_flag(label: &str, value: u64) -> String {
    format!("{}{}", label, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Bit, Enumeration, FieldFormat};

    fn lettered_bit_field() -> BitField {
        BitField::new(vec![
            Bit::new(0, 1, "A"),
            Bit::new(1, 2, "B"),
            Bit::new(2, 1, "C"),
            Bit::new(3, 3, "D"),
            Bit::new(4, 2, "E"),
            Bit::new(5, 2, "F"),
            Bit::new(6, 4, "G"),
        ])
    }

    fn op_code_field() -> Field {
        Field::new("Op Code", FieldFormat::uint(8)).with_enumerations(vec![
            Enumeration::new(1, "First").with_requires("C1"),
            Enumeration::new(2, "Second"),
            Enumeration::new(3, "Third").with_requires("C2"),
        ])
    }

    #[test]
    fn test_decode_flags() {
        let raw = [0b1010_0101, 0b0101_0001];
        let decoded = decode_flags(&lettered_bit_field(), &raw).unwrap();
        let values: Vec<u64> = decoded.iter().map(|(_, value)| *value).collect();
        assert_eq!(values, vec![1, 2, 0, 2, 3, 0, 10]);

        let flags = render_flags(&decoded);
        assert_eq!(flags.len(), 7);
        for flag in ["A1", "B2", "C0", "D2", "E3", "F0", "G10"] {
            assert!(flags.contains(flag), "missing {}", flag);
        }
    }

    #[test]
    fn test_decode_flags_orders_by_ordinal() {
        // Same bits declared out of order decode identically
        let mut bits = lettered_bit_field().bits().to_vec();
        bits.reverse();
        let shuffled = BitField::new(bits);

        let raw = [0b1010_0101, 0b0101_0001];
        assert_eq!(
            read_flags(&shuffled, &raw).unwrap(),
            read_flags(&lettered_bit_field(), &raw).unwrap()
        );
    }

    #[test]
    fn test_decode_flags_short_buffer() {
        assert!(matches!(
            decode_flags(&lettered_bit_field(), &[0xFF]),
            Err(GattParserError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_all_possible_read_flags() {
        let bit_field = BitField::new(vec![Bit::new(0, 1, "C"), Bit::new(1, 2, "S")]);
        let flags = all_possible_read_flags(&bit_field);
        let expected: BTreeSet<String> = ["C0", "C1", "S0", "S1", "S2", "S3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(flags, expected);
    }

    #[test]
    fn test_write_flag_for() {
        let field = op_code_field();
        assert_eq!(write_flag_for(&field, Some(1)), Some("C1"));
        assert_eq!(write_flag_for(&field, Some(2)), None);
        assert_eq!(write_flag_for(&field, Some(3)), Some("C2"));
        assert_eq!(write_flag_for(&field, Some(4)), None);
        assert_eq!(write_flag_for(&field, None), None);

        let cleared = Field::new("Op Code", FieldFormat::uint(8));
        assert_eq!(write_flag_for(&cleared, Some(1)), None);
    }

    #[test]
    fn test_all_possible_write_flags() {
        assert!(all_possible_write_flags(&Field::new("Op Code", FieldFormat::uint(8))).is_empty());

        let flags = all_possible_write_flags(&op_code_field());
        assert_eq!(flags.len(), 2);
        assert!(flags.contains("C1"));
        assert!(flags.contains("C2"));
    }

    #[test]
    fn test_encode_flags() {
        let bit_field = lettered_bit_field();
        let value = encode_flags(
            &bit_field,
            16,
            &[("A", 1), ("B", 2), ("D", 2), ("E", 3), ("G", 10)],
        )
        .unwrap();
        assert_eq!(value, 0x51A5);

        assert!(matches!(
            encode_flags(&bit_field, 16, &[("Z", 1)]),
            Err(GattParserError::UnknownField(_))
        ));
        assert!(matches!(
            encode_flags(&bit_field, 16, &[("A", 2)]),
            Err(GattParserError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_encode_flags_overflowing_field() {
        // 15 bits of Bits cannot be packed into an 8-bit field
        assert!(matches!(
            encode_flags(&lettered_bit_field(), 8, &[("A", 1)]),
            Err(GattParserError::OutOfRange {
                required_bits: 15,
                available_bits: 8
            })
        ));
    }

    #[test]
    fn test_read_field_flags() {
        let bit_field = BitField::new(vec![Bit::new(0, 4, "A"), Bit::new(1, 4, "B")]);
        // The flags field starts at bit 8 and is followed by more data
        let raw = [0x00, 0x2F, 0xFF];
        let flags = read_field_flags(&bit_field, &raw, 8, 8).unwrap();
        let expected: BTreeSet<String> = ["A15", "B2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(flags, expected);
    }

    #[test]
    fn test_read_field_flags_wider_than_field() {
        let bit_field = BitField::new(vec![Bit::new(0, 4, "A"), Bit::new(1, 8, "B")]);
        assert!(matches!(
            read_field_flags(&bit_field, &[0xFF, 0x01], 0, 8),
            Err(GattParserError::OutOfRange {
                required_bits: 12,
                available_bits: 8
            })
        ));
    }
}
