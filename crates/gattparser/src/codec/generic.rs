//! Generic field codec
//!
//! Walks a characteristic's (reference-free) field list in declaration order
//! and converts between a raw value and field holders. The whole value is one
//! cumulative little-endian bit stream, so fields need not be byte aligned.

use super::bits;
use super::flags;
use super::float;
use crate::error::{GattParserError, GattResult};
use crate::gatt::{FieldHolder, FieldValue};
use crate::spec::constants::{MANDATORY_FLAG, MAX_INTEGER_WIDTH, OPTIONAL_FLAG};
use crate::spec::{Characteristic, Field, FieldFormat, FormatKind};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::trace;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::Arc;

/// Decodes and encodes the value of one characteristic
///
/// The generic codec handles every characteristic whose layout its schema
/// fully describes. Register a custom implementation with
/// [`GattParser::register_codec`](crate::GattParser::register_codec) for the
/// rest.
pub trait CharacteristicCodec: Send + Sync {
    /// Decode a raw value. `fields` is the characteristic's field list with
    /// references already expanded.
    fn decode(
        &self,
        characteristic: &Characteristic,
        fields: &[Arc<Field>],
        raw: &[u8],
    ) -> GattResult<Vec<FieldHolder>>;

    /// Encode holders, in field order, into a raw value
    fn encode(&self, holders: &[FieldHolder]) -> GattResult<Vec<u8>>;
}

/// Schema-driven codec used when no custom codec is registered
#[derive(Debug, Clone, Default)]
pub struct GenericCodec {
    reject_trailing_bytes: bool,
}

impl GenericCodec {
    /// Create a new generic codec
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail decoding when bytes remain after the last field
    pub fn reject_trailing_bytes(mut self, reject: bool) -> Self {
        self.reject_trailing_bytes = reject;
        self
    }

    fn decode_field(
        &self,
        field: &Field,
        format: &FieldFormat,
        raw: &[u8],
        offset: usize,
    ) -> GattResult<(FieldValue, usize)> {
        let available = raw.len() * 8;

        if format.is_variable() {
            if offset % 8 != 0 {
                return Err(GattParserError::MalformedPayload {
                    field: field.name().to_string(),
                    reason: format!("variable-length field starts at unaligned bit {}", offset),
                });
            }
            let bytes = raw.get(offset / 8..).unwrap_or(&[]);
            let value = decode_variable(field, format.kind(), bytes)?;
            return Ok((value, available - offset));
        }

        let size = format.size() as usize;
        if offset + size > available {
            return Err(GattParserError::short_payload(field.name(), offset + size, available));
        }

        let value = match format.kind() {
            FormatKind::Boolean => FieldValue::Boolean(bits::read_bits(raw, offset, 1)? != 0),
            FormatKind::UInt => {
                let value = read_unsigned(field, raw, offset, format.size())?;
                apply_exponent(field, value as i128)
            }
            FormatKind::SInt => {
                let value = read_signed(field, raw, offset, format.size())?;
                apply_exponent(field, value as i128)
            }
            FormatKind::SFloat => {
                let value = bits::read_bits(raw, offset, 16)? as u16;
                FieldValue::Float(float::sfloat_to_f64(value))
            }
            FormatKind::Float => {
                let value = bits::read_bits(raw, offset, 32)? as u32;
                FieldValue::Float(float::float_to_f64(value))
            }
            FormatKind::Float32 => {
                let value = bits::read_bits(raw, offset, 32)? as u32;
                FieldValue::Float(f32::from_bits(value) as f64)
            }
            FormatKind::Float64 => {
                FieldValue::Float(f64::from_bits(bits::read_bits(raw, offset, 64)?))
            }
            FormatKind::Reserved => FieldValue::Unset,
            FormatKind::Utf8 | FormatKind::Utf16 | FormatKind::Struct => {
                return Err(GattParserError::UnsupportedFormat(format.to_string()))
            }
        };

        Ok((value, size))
    }

    fn encode_field(
        &self,
        buf: &mut Vec<u8>,
        offset: usize,
        field: &Field,
        format: &FieldFormat,
        value: &FieldValue,
    ) -> GattResult<usize> {
        let mismatch = || {
            GattParserError::invalid_value(
                field.name(),
                format!("a {} value does not fit format {}", value.type_name(), format),
            )
        };

        if format.is_variable() {
            if offset % 8 != 0 {
                return Err(GattParserError::invalid_value(
                    field.name(),
                    format!("variable-length field starts at unaligned bit {}", offset),
                ));
            }
            let bytes = match (format.kind(), value) {
                (FormatKind::Utf8, FieldValue::String(text)) => text.as_bytes().to_vec(),
                (FormatKind::Utf16, FieldValue::String(text)) => text
                    .encode_utf16()
                    .flat_map(|unit| unit.to_le_bytes())
                    .collect(),
                (FormatKind::Struct, FieldValue::Bytes(bytes)) => bytes.clone(),
                _ => return Err(mismatch()),
            };
            buf.resize(offset / 8, 0);
            buf.extend_from_slice(&bytes);
            return Ok(bytes.len() * 8);
        }

        let size = format.size();
        match format.kind() {
            FormatKind::Boolean => {
                let bit = match value {
                    FieldValue::Boolean(flag) => *flag as u64,
                    FieldValue::Integer(0) => 0,
                    FieldValue::Integer(1) => 1,
                    FieldValue::Integer(_) => {
                        return Err(GattParserError::invalid_value(
                            field.name(),
                            "boolean fields accept only 0 or 1",
                        ))
                    }
                    _ => return Err(mismatch()),
                };
                bits::write_bits(buf, offset, 1, bit)?;
            }
            FormatKind::UInt | FormatKind::SInt => {
                check_integer_width(field, size)?;
                let integer = match value {
                    FieldValue::Integer(integer) => *integer,
                    FieldValue::Boolean(flag) => *flag as i128,
                    FieldValue::Float(number) => match field.decimal_exponent() {
                        Some(exponent) => float::scale(*number, -exponent).round() as i128,
                        None => return Err(mismatch()),
                    },
                    _ => return Err(mismatch()),
                };
                let raw = if format.kind() == FormatKind::UInt {
                    unsigned_to_raw(integer, size)?
                } else {
                    signed_to_raw(integer, size)?
                };
                write_integer(buf, offset, size, raw)?;
            }
            FormatKind::SFloat | FormatKind::Float | FormatKind::Float32 | FormatKind::Float64 => {
                let number = match value {
                    FieldValue::Float(number) => *number,
                    FieldValue::Integer(integer) => *integer as f64,
                    _ => return Err(mismatch()),
                };
                let raw = match format.kind() {
                    FormatKind::SFloat => float::f64_to_sfloat(number).map(u64::from),
                    FormatKind::Float => float::f64_to_float(number).map(u64::from),
                    FormatKind::Float32 => Some((number as f32).to_bits() as u64),
                    _ => Some(number.to_bits()),
                }
                .ok_or_else(|| {
                    GattParserError::invalid_value(
                        field.name(),
                        format!("{} cannot be represented as {}", number, format),
                    )
                })?;
                write_integer(buf, offset, size, raw)?;
            }
            FormatKind::Reserved => write_zeros(buf, offset, size)?,
            FormatKind::Utf8 | FormatKind::Utf16 | FormatKind::Struct => {
                return Err(GattParserError::UnsupportedFormat(format.to_string()))
            }
        }

        Ok(size as usize)
    }
}

impl CharacteristicCodec for GenericCodec {
    fn decode(
        &self,
        characteristic: &Characteristic,
        fields: &[Arc<Field>],
        raw: &[u8],
    ) -> GattResult<Vec<FieldHolder>> {
        let available = raw.len() * 8;
        let mut asserted: BTreeSet<String> = BTreeSet::new();
        asserted.insert(MANDATORY_FLAG.to_string());

        let mut holders = Vec::with_capacity(fields.len());
        let mut offset = 0usize;

        for field in fields {
            let format = field
                .format()
                .ok_or_else(|| GattParserError::UnsupportedFormat(field.name().to_string()))?;

            if !requirements_met(field, &asserted) {
                trace!(
                    "Skipping field \"{}\" of {}: requirements {:?} not asserted",
                    field.name(),
                    characteristic.name(),
                    field.requirements()
                );
                continue;
            }
            if field.has_requirement(OPTIONAL_FLAG) && !fits(format, offset, available) {
                continue;
            }

            let (value, consumed) = self.decode_field(field, format, raw, offset)?;

            if let Some(bit_field) = field.bit_field() {
                asserted.extend(flags::read_field_flags(bit_field, raw, offset, format.size())?);
            }

            offset += consumed;
            if !format.is_reserved() {
                holders.push(FieldHolder::with_value(Arc::clone(field), value));
            }
        }

        if self.reject_trailing_bytes && offset.div_ceil(8) < raw.len() {
            return Err(GattParserError::MalformedPayload {
                field: characteristic.name().to_string(),
                reason: format!(
                    "{} trailing bytes after the last field",
                    raw.len() - offset.div_ceil(8)
                ),
            });
        }

        Ok(holders)
    }

    fn encode(&self, holders: &[FieldHolder]) -> GattResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut offset = 0usize;

        for holder in holders {
            let field = holder.field();
            let format = field
                .format()
                .ok_or_else(|| GattParserError::UnsupportedFormat(field.name().to_string()))?;

            if format.is_reserved() {
                offset += self.encode_field(&mut buf, offset, field, format, &FieldValue::Unset)?;
                continue;
            }
            if !holder.is_value_set() {
                continue;
            }

            offset += self.encode_field(&mut buf, offset, field, format, holder.value())?;
        }

        buf.resize(offset.div_ceil(8), 0);
        Ok(buf)
    }
}

/// A field is present when it is unconditional, mandatory, or every symbolic
/// requirement it names is asserted.
fn requirements_met(field: &Field, asserted: &BTreeSet<String>) -> bool {
    let requirements = field.requirements();
    if requirements.is_empty() || field.is_mandatory() {
        return true;
    }
    requirements
        .iter()
        .filter(|requirement| requirement.as_str() != OPTIONAL_FLAG)
        .all(|requirement| asserted.contains(requirement))
}

/// Whether enough of the buffer remains for an optional field
fn fits(format: &FieldFormat, offset: usize, available: usize) -> bool {
    if format.is_variable() {
        offset + 8 <= available
    } else {
        offset + format.size() as usize <= available
    }
}

fn decode_variable(field: &Field, kind: FormatKind, bytes: &[u8]) -> GattResult<FieldValue> {
    let malformed = |reason: String| GattParserError::MalformedPayload {
        field: field.name().to_string(),
        reason,
    };

    match kind {
        FormatKind::Utf8 => String::from_utf8(bytes.to_vec())
            .map(FieldValue::String)
            .map_err(|e| malformed(e.to_string())),
        FormatKind::Utf16 => {
            if bytes.len() % 2 != 0 {
                return Err(malformed(format!("odd UTF-16 length {}", bytes.len())));
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map(FieldValue::String)
                .map_err(|e| malformed(e.to_string()))
        }
        _ => Ok(FieldValue::Bytes(bytes.to_vec())),
    }
}

fn check_integer_width(field: &Field, size: u32) -> GattResult<()> {
    if size == 0 || size > MAX_INTEGER_WIDTH {
        return Err(GattParserError::UnsupportedFormat(format!(
            "{} ({} bit integer)",
            field.name(),
            size
        )));
    }
    Ok(())
}

fn read_unsigned(field: &Field, raw: &[u8], offset: usize, size: u32) -> GattResult<u64> {
    check_integer_width(field, size)?;
    if offset % 8 != 0 {
        return bits::read_bits(raw, offset, size);
    }

    // Byte-aligned standard widths
    let mut cursor = Cursor::new(&raw[offset / 8..]);
    let value = match size {
        8 => cursor.read_u8()? as u64,
        16 => cursor.read_u16::<LittleEndian>()? as u64,
        32 => cursor.read_u32::<LittleEndian>()? as u64,
        64 => cursor.read_u64::<LittleEndian>()?,
        _ => bits::read_bits(raw, offset, size)?,
    };
    Ok(value)
}

fn read_signed(field: &Field, raw: &[u8], offset: usize, size: u32) -> GattResult<i64> {
    check_integer_width(field, size)?;
    if offset % 8 != 0 {
        return Ok(bits::sign_extend(bits::read_bits(raw, offset, size)?, size));
    }

    let mut cursor = Cursor::new(&raw[offset / 8..]);
    let value = match size {
        8 => cursor.read_i8()? as i64,
        16 => cursor.read_i16::<LittleEndian>()? as i64,
        32 => cursor.read_i32::<LittleEndian>()? as i64,
        64 => cursor.read_i64::<LittleEndian>()?,
        _ => bits::sign_extend(bits::read_bits(raw, offset, size)?, size),
    };
    Ok(value)
}

fn apply_exponent(field: &Field, value: i128) -> FieldValue {
    match field.decimal_exponent() {
        Some(exponent) => FieldValue::Float(float::scale(value as f64, exponent)),
        None => FieldValue::Integer(value),
    }
}

fn unsigned_to_raw(value: i128, size: u32) -> GattResult<u64> {
    let max = if size >= 64 {
        u64::MAX as i128
    } else {
        (1i128 << size) - 1
    };
    if value < 0 || value > max {
        return Err(GattParserError::OutOfRange {
            required_bits: required_bits(value, false),
            available_bits: size as usize,
        });
    }
    Ok(value as u64)
}

fn signed_to_raw(value: i128, size: u32) -> GattResult<u64> {
    let min = -(1i128 << (size - 1));
    let max = (1i128 << (size - 1)) - 1;
    if value < min || value > max {
        return Err(GattParserError::OutOfRange {
            required_bits: required_bits(value, true),
            available_bits: size as usize,
        });
    }
    let mask = if size >= 64 { u64::MAX } else { (1u64 << size) - 1 };
    Ok((value as i64 as u64) & mask)
}

/// Minimum width that can hold `value`
fn required_bits(value: i128, signed: bool) -> usize {
    if signed {
        let magnitude = if value < 0 { !value } else { value };
        (128 - magnitude.leading_zeros()) as usize + 1
    } else if value < 0 {
        128
    } else {
        (128 - value.leading_zeros()) as usize
    }
}

fn write_integer(buf: &mut Vec<u8>, offset: usize, size: u32, raw: u64) -> GattResult<()> {
    if offset % 8 != 0 || buf.len() != offset / 8 {
        return bits::write_bits(buf, offset, size, raw);
    }

    // Byte-aligned standard widths append directly
    match size {
        8 => buf.write_u8(raw as u8)?,
        16 => buf.write_u16::<LittleEndian>(raw as u16)?,
        32 => buf.write_u32::<LittleEndian>(raw as u32)?,
        64 => buf.write_u64::<LittleEndian>(raw)?,
        _ => bits::write_bits(buf, offset, size, raw)?,
    }
    Ok(())
}

fn write_zeros(buf: &mut Vec<u8>, offset: usize, size: u32) -> GattResult<()> {
    let mut written = 0u32;
    while written < size {
        let chunk = (size - written).min(bits::MAX_BIT_WIDTH);
        bits::write_bits(buf, offset + written as usize, chunk, 0)?;
        written += chunk;
    }
    Ok(())
}
