//! IEEE-11073 SFLOAT / FLOAT encodings
//!
//! Both are `mantissa * 10^exponent` with a two's-complement mantissa and
//! exponent: SFLOAT packs a 4-bit exponent over a 12-bit mantissa, FLOAT an
//! 8-bit exponent over a 24-bit mantissa. A handful of mantissa values with a
//! zero exponent are reserved for NaN, NRes and the infinities.

use super::bits::sign_extend;

const SFLOAT_NAN: u16 = 0x07FF;
const SFLOAT_NRES: u16 = 0x0800;
const SFLOAT_POSITIVE_INFINITY: u16 = 0x07FE;
const SFLOAT_NEGATIVE_INFINITY: u16 = 0x0802;
const SFLOAT_RESERVED: u16 = 0x0801;
const SFLOAT_MANTISSA_MAX: i64 = 0x07FD;
const SFLOAT_EXPONENT_MIN: i32 = -8;
const SFLOAT_EXPONENT_MAX: i32 = 7;

const FLOAT_NAN: u32 = 0x007F_FFFF;
const FLOAT_NRES: u32 = 0x0080_0000;
const FLOAT_POSITIVE_INFINITY: u32 = 0x007F_FFFE;
const FLOAT_NEGATIVE_INFINITY: u32 = 0x0080_0002;
const FLOAT_RESERVED: u32 = 0x0080_0001;
const FLOAT_MANTISSA_MAX: i64 = 0x007F_FFFD;
const FLOAT_EXPONENT_MIN: i32 = -128;
const FLOAT_EXPONENT_MAX: i32 = 127;

/// Decode a 16-bit SFLOAT
pub fn sfloat_to_f64(raw: u16) -> f64 {
    match raw {
        SFLOAT_NAN | SFLOAT_NRES | SFLOAT_RESERVED => f64::NAN,
        SFLOAT_POSITIVE_INFINITY => f64::INFINITY,
        SFLOAT_NEGATIVE_INFINITY => f64::NEG_INFINITY,
        _ => {
            let mantissa = sign_extend((raw & 0x0FFF) as u64, 12);
            let exponent = sign_extend((raw >> 12) as u64, 4) as i32;
            scale(mantissa as f64, exponent)
        }
    }
}

/// Decode a 32-bit FLOAT
pub fn float_to_f64(raw: u32) -> f64 {
    match raw {
        FLOAT_NAN | FLOAT_NRES | FLOAT_RESERVED => f64::NAN,
        FLOAT_POSITIVE_INFINITY => f64::INFINITY,
        FLOAT_NEGATIVE_INFINITY => f64::NEG_INFINITY,
        _ => {
            let mantissa = sign_extend((raw & 0x00FF_FFFF) as u64, 24);
            let exponent = (raw >> 24) as u8 as i8 as i32;
            scale(mantissa as f64, exponent)
        }
    }
}

/// Encode a value as SFLOAT, or `None` if it is too large to represent
pub fn f64_to_sfloat(value: f64) -> Option<u16> {
    if value.is_nan() {
        return Some(SFLOAT_NAN);
    }
    if value.is_infinite() {
        return Some(if value > 0.0 {
            SFLOAT_POSITIVE_INFINITY
        } else {
            SFLOAT_NEGATIVE_INFINITY
        });
    }

    let (mantissa, exponent) = to_decimal(
        value,
        SFLOAT_MANTISSA_MAX,
        SFLOAT_EXPONENT_MIN,
        SFLOAT_EXPONENT_MAX,
    )?;
    Some((((exponent as u16) & 0x000F) << 12) | ((mantissa as u16) & 0x0FFF))
}

/// Encode a value as FLOAT, or `None` if it is too large to represent
pub fn f64_to_float(value: f64) -> Option<u32> {
    if value.is_nan() {
        return Some(FLOAT_NAN);
    }
    if value.is_infinite() {
        return Some(if value > 0.0 {
            FLOAT_POSITIVE_INFINITY
        } else {
            FLOAT_NEGATIVE_INFINITY
        });
    }

    let (mantissa, exponent) = to_decimal(
        value,
        FLOAT_MANTISSA_MAX,
        FLOAT_EXPONENT_MIN,
        FLOAT_EXPONENT_MAX,
    )?;
    Some(((exponent as i8 as u8 as u32) << 24) | ((mantissa as u32) & 0x00FF_FFFF))
}

/// `value * 10^exponent`, dividing for negative exponents to keep exact
/// decimals such as 36.5 exact.
pub fn scale(value: f64, exponent: i32) -> f64 {
    if exponent < 0 {
        value / 10f64.powi(-exponent)
    } else {
        value * 10f64.powi(exponent)
    }
}

/// Smallest exponent whose rounded mantissa fits, with trailing decimal zeros
/// then folded back into the exponent.
fn to_decimal(value: f64, mantissa_max: i64, exponent_min: i32, exponent_max: i32) -> Option<(i64, i32)> {
    for exponent in exponent_min..=exponent_max {
        let mantissa = scale(value, -exponent).round();
        if !mantissa.is_finite() || mantissa.abs() > mantissa_max as f64 {
            continue;
        }

        let mut mantissa = mantissa as i64;
        let mut exponent = exponent;
        if mantissa == 0 {
            return Some((0, 0));
        }
        while mantissa % 10 == 0 && exponent < exponent_max {
            mantissa /= 10;
            exponent += 1;
        }
        return Some((mantissa, exponent));
    }
    None
}
