//! Field value formats
//!
//! Formats are declared in GATT documents as short tags (`uint8`, `SFLOAT`,
//! `utf8s`, ...). [`FieldFormat::parse`] turns such a tag into a kind plus a
//! width in bits.

use crate::error::{GattParserError, GattResult};
use std::fmt;

/// The value interpretation of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Single bit, nonzero is true
    Boolean,
    /// Unsigned little-endian integer
    UInt,
    /// Two's-complement little-endian integer
    SInt,
    /// IEEE-11073 16-bit SFLOAT
    SFloat,
    /// IEEE-11073 32-bit FLOAT
    Float,
    /// IEEE-754 binary32
    Float32,
    /// IEEE-754 binary64
    Float64,
    /// UTF-8 string filling the rest of the value
    Utf8,
    /// UTF-16LE string filling the rest of the value
    Utf16,
    /// Opaque bytes filling the rest of the value
    Struct,
    /// Padding, consumed and discarded
    Reserved,
}

impl FormatKind {
    /// Returns true for formats that consume the rest of the buffer
    pub fn is_variable(&self) -> bool {
        matches!(self, FormatKind::Utf8 | FormatKind::Utf16 | FormatKind::Struct)
    }

    /// Returns true for integer formats
    pub fn is_integer(&self) -> bool {
        matches!(self, FormatKind::UInt | FormatKind::SInt)
    }

    /// Returns true for floating point formats
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            FormatKind::SFloat | FormatKind::Float | FormatKind::Float32 | FormatKind::Float64
        )
    }
}

/// A field format: kind plus width in bits (0 for variable-length formats)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldFormat {
    kind: FormatKind,
    size: u32,
}

impl FieldFormat {
    /// Create a new format
    pub fn new(kind: FormatKind, size: u32) -> Self {
        Self { kind, size }
    }

    /// Unsigned integer of the given width
    pub fn uint(size: u32) -> Self {
        Self::new(FormatKind::UInt, size)
    }

    /// Signed integer of the given width
    pub fn sint(size: u32) -> Self {
        Self::new(FormatKind::SInt, size)
    }

    /// Single bit boolean
    pub fn boolean() -> Self {
        Self::new(FormatKind::Boolean, 1)
    }

    /// Reserved padding of the given width
    pub fn reserved(size: u32) -> Self {
        Self::new(FormatKind::Reserved, size)
    }

    /// UTF-8 string
    pub fn utf8s() -> Self {
        Self::new(FormatKind::Utf8, 0)
    }

    /// Opaque bytes
    pub fn opaque() -> Self {
        Self::new(FormatKind::Struct, 0)
    }

    /// Parse a format tag as it appears in a GATT document
    pub fn parse(tag: &str) -> GattResult<Self> {
        let tag = tag.trim();
        let lower = tag.to_ascii_lowercase();
        let unsupported = || GattParserError::UnsupportedFormat(tag.to_string());

        let format = match lower.as_str() {
            "boolean" => Self::boolean(),
            "nibble" => Self::uint(4),
            "sfloat" => Self::new(FormatKind::SFloat, 16),
            "float" => Self::new(FormatKind::Float, 32),
            "float32" => Self::new(FormatKind::Float32, 32),
            "float64" => Self::new(FormatKind::Float64, 64),
            "utf8s" => Self::utf8s(),
            "utf16s" => Self::new(FormatKind::Utf16, 0),
            "struct" | "variable" | "reg-cert-data-list" | "gatt_uuid" => Self::opaque(),
            _ => {
                let (kind, digits) = if let Some(digits) = lower.strip_prefix("uint") {
                    (FormatKind::UInt, digits)
                } else if let Some(digits) = lower.strip_prefix("sint") {
                    (FormatKind::SInt, digits)
                } else if let Some(digits) = lower.strip_suffix("bit") {
                    (FormatKind::UInt, digits)
                } else {
                    return Err(unsupported());
                };
                let size: u32 = digits.parse().map_err(|_| unsupported())?;
                if size == 0 {
                    return Err(unsupported());
                }
                Self::new(kind, size)
            }
        };

        Ok(format)
    }

    /// The value interpretation
    pub fn kind(&self) -> FormatKind {
        self.kind
    }

    /// Width in bits, 0 for variable-length formats
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns true if the format consumes the rest of the buffer
    pub fn is_variable(&self) -> bool {
        self.kind.is_variable()
    }

    /// Returns true for reserved padding
    pub fn is_reserved(&self) -> bool {
        self.kind == FormatKind::Reserved
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FormatKind::Boolean => write!(f, "boolean"),
            FormatKind::UInt => write!(f, "uint{}", self.size),
            FormatKind::SInt => write!(f, "sint{}", self.size),
            FormatKind::SFloat => write!(f, "SFLOAT"),
            FormatKind::Float => write!(f, "FLOAT"),
            FormatKind::Float32 => write!(f, "float32"),
            FormatKind::Float64 => write!(f, "float64"),
            FormatKind::Utf8 => write!(f, "utf8s"),
            FormatKind::Utf16 => write!(f, "utf16s"),
            FormatKind::Struct => write!(f, "struct"),
            FormatKind::Reserved => write!(f, "reserved{}", self.size),
        }
    }
}
