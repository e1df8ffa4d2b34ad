//! Identifier canonicalization
//!
//! Services and characteristics are registered and looked up by a short,
//! upper-case hex identifier. Callers may pass either that short form
//! (e.g. `"2A19"`) or a full 128-bit UUID string
//! (e.g. `"00002a19-0000-1000-8000-00805f9b34fb"`); both map to the same key.

use crate::error::{GattParserError, GattResult};

/// Number of leading characters of a long UUID that carry the short identifier.
const SHORT_UUID_PREFIX_LEN: usize = 8;

/// Canonicalizes a service or characteristic identifier.
///
/// An input shorter than 8 characters is upper-cased as-is. Otherwise its
/// first 8 characters are read as a big-endian 32-bit hex value and
/// re-rendered as upper-case hex without leading zeros, so
/// `"0000180F-0000-1000-8000-00805F9B34FB"` becomes `"180F"`.
pub fn short_uuid(uuid: &str) -> GattResult<String> {
    if uuid.chars().count() < SHORT_UUID_PREFIX_LEN {
        return Ok(uuid.to_uppercase());
    }

    let prefix = uuid
        .get(..SHORT_UUID_PREFIX_LEN)
        .ok_or_else(|| GattParserError::InvalidIdentifier(uuid.to_string()))?;

    let mut bytes = [0u8; 4];
    hex::decode_to_slice(prefix, &mut bytes)
        .map_err(|_| GattParserError::InvalidIdentifier(uuid.to_string()))?;

    Ok(format!("{:X}", u32::from_be_bytes(bytes)))
}

/// Same as [`short_uuid`], but yields `None` instead of an error.
pub fn try_short_uuid(uuid: &str) -> Option<String> {
    short_uuid(uuid).ok()
}
