//! Bit-field engine
//!
//! A byte buffer is treated as one little-endian bit stream: bit 0 is the
//! least significant bit of byte 0, bit 8 the least significant bit of byte 1,
//! and so on. Every value read or written here is itself little-endian within
//! its bit range.

use crate::error::{GattParserError, GattResult};

/// Widest value a single read or write can carry
pub const MAX_BIT_WIDTH: u32 = 64;

/// Read `width` bits starting at absolute bit `offset`
pub fn read_bits(raw: &[u8], offset: usize, width: u32) -> GattResult<u64> {
    if width > MAX_BIT_WIDTH {
        return Err(GattParserError::OutOfRange {
            required_bits: width as usize,
            available_bits: MAX_BIT_WIDTH as usize,
        });
    }

    let available = raw.len() * 8;
    let end = offset + width as usize;
    if end > available {
        return Err(GattParserError::OutOfRange {
            required_bits: end,
            available_bits: available,
        });
    }

    let mut value = 0u64;
    for i in 0..width as usize {
        let bit = offset + i;
        if (raw[bit / 8] >> (bit % 8)) & 1 == 1 {
            value |= 1 << i;
        }
    }

    Ok(value)
}

/// Write the low `width` bits of `value` at absolute bit `offset`.
///
/// The buffer grows with zero bytes as needed. Fails if `value` does not fit
/// in `width` bits.
pub fn write_bits(buf: &mut Vec<u8>, offset: usize, width: u32, value: u64) -> GattResult<()> {
    if width > MAX_BIT_WIDTH {
        return Err(GattParserError::OutOfRange {
            required_bits: width as usize,
            available_bits: MAX_BIT_WIDTH as usize,
        });
    }
    if width < MAX_BIT_WIDTH && value >> width != 0 {
        return Err(GattParserError::OutOfRange {
            required_bits: (MAX_BIT_WIDTH - value.leading_zeros()) as usize,
            available_bits: width as usize,
        });
    }

    let end = offset + width as usize;
    let needed = end.div_ceil(8);
    if buf.len() < needed {
        buf.resize(needed, 0);
    }

    for i in 0..width as usize {
        let bit = offset + i;
        let mask = 1u8 << (bit % 8);
        if (value >> i) & 1 == 1 {
            buf[bit / 8] |= mask;
        } else {
            buf[bit / 8] &= !mask;
        }
    }

    Ok(())
}

/// Cumulative bit offset of each width: entry `i` is the sum of widths before `i`
pub fn offsets(widths: &[u32]) -> Vec<usize> {
    widths
        .iter()
        .scan(0usize, |offset, &width| {
            let start = *offset;
            *offset += width as usize;
            Some(start)
        })
        .collect()
}

/// Extract consecutive values of the given widths from the start of `raw`
pub fn unpack(raw: &[u8], widths: &[u32]) -> GattResult<Vec<u64>> {
    widths
        .iter()
        .zip(offsets(widths))
        .map(|(&width, offset)| read_bits(raw, offset, width))
        .collect()
}

/// Pack `(width, value)` pairs consecutively into a buffer of `declared_width` bits
pub fn pack(values: &[(u32, u64)], declared_width: u32) -> GattResult<Vec<u8>> {
    let total: usize = values.iter().map(|(width, _)| *width as usize).sum();
    if total > declared_width as usize {
        return Err(GattParserError::OutOfRange {
            required_bits: total,
            available_bits: declared_width as usize,
        });
    }

    let mut buf = vec![0u8; (declared_width as usize).div_ceil(8)];
    let mut offset = 0usize;
    for &(width, value) in values {
        write_bits(&mut buf, offset, width, value)?;
        offset += width as usize;
    }

    Ok(buf)
}

/// Interpret the low `width` bits of `raw` as a two's-complement integer
pub fn sign_extend(raw: u64, width: u32) -> i64 {
    if width == 0 {
        return 0;
    }
    let shift = MAX_BIT_WIDTH - width.min(MAX_BIT_WIDTH);
    ((raw << shift) as i64) >> shift
}
