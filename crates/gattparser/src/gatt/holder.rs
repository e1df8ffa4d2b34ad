//! Field values bound to one request or response

use crate::error::{GattParserError, GattResult};
use crate::spec::{Enumeration, Field, FormatKind};
use std::fmt;
use std::sync::Arc;

/// The value of a field
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Unset,
    Boolean(bool),
    Integer(i128),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Short name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Unset => "unset",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::Bytes(_) => "bytes",
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, FieldValue::Unset)
    }

    /// Returns true if a value of this type can be stored in a field of the given format
    pub fn fits(&self, kind: FormatKind) -> bool {
        match (self, kind) {
            (FieldValue::Unset, _) => true,
            (_, FormatKind::Reserved) => false,
            (FieldValue::Boolean(_), FormatKind::Boolean) => true,
            (FieldValue::Integer(_), FormatKind::Boolean) => true,
            (FieldValue::Integer(_) | FieldValue::Boolean(_), k) if k.is_integer() => true,
            (FieldValue::Float(_), k) if k.is_integer() || k.is_float() => true,
            (FieldValue::Integer(_), k) if k.is_float() => true,
            (FieldValue::String(_), FormatKind::Utf8 | FormatKind::Utf16) => true,
            (FieldValue::Bytes(_), FormatKind::Struct) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unset => write!(f, "<unset>"),
            FieldValue::Boolean(value) => write!(f, "{}", value),
            FieldValue::Integer(value) => write!(f, "{}", value),
            FieldValue::Float(value) => write!(f, "{}", value),
            FieldValue::String(value) => write!(f, "{}", value),
            FieldValue::Bytes(value) => write!(f, "0x{}", hex::encode(value)),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Integer(value as i128)
                }
            }
        )*
    };
}

impl_from_integer!(u8, u16, u32, u64, i8, i16, i32, i64, i128, usize);

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        FieldValue::Bytes(value.to_vec())
    }
}

/// A field paired with its value in one request or response
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHolder {
    field: Arc<Field>,
    value: FieldValue,
}

impl FieldHolder {
    /// Create a holder with no value
    pub fn new(field: Arc<Field>) -> Self {
        Self {
            field,
            value: FieldValue::Unset,
        }
    }

    /// Create a holder with a value
    pub fn with_value(field: Arc<Field>, value: FieldValue) -> Self {
        Self { field, value }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn is_value_set(&self) -> bool {
        self.value.is_set()
    }

    /// Set the value, checking that its type fits the field's format and that
    /// a number lies within the field's declared range
    pub fn set(&mut self, value: FieldValue) -> GattResult<()> {
        let kind = self
            .field
            .format()
            .map(|format| format.kind())
            .ok_or_else(|| GattParserError::UnsupportedFormat(self.field.name().to_string()))?;

        if !value.fits(kind) {
            return Err(GattParserError::invalid_value(
                self.field.name(),
                format!("a {} value does not fit a {:?} field", value.type_name(), kind),
            ));
        }

        let number = match value {
            FieldValue::Integer(number) => Some(number as f64),
            FieldValue::Float(number) => Some(number),
            _ => None,
        };
        if let Some(number) = number {
            let below = self.field.minimum().map_or(false, |minimum| number < minimum);
            let above = self.field.maximum().map_or(false, |maximum| number > maximum);
            if below || above {
                return Err(GattParserError::invalid_value(
                    self.field.name(),
                    format!(
                        "{} is outside the range {:?}..={:?}",
                        number,
                        self.field.minimum(),
                        self.field.maximum()
                    ),
                ));
            }
        }

        self.value = value;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.value = FieldValue::Unset;
    }

    pub fn boolean(&self) -> Option<bool> {
        match self.value {
            FieldValue::Boolean(value) => Some(value),
            FieldValue::Integer(value) => Some(value != 0),
            _ => None,
        }
    }

    pub fn integer(&self) -> Option<i128> {
        match self.value {
            FieldValue::Integer(value) => Some(value),
            FieldValue::Boolean(value) => Some(value as i128),
            _ => None,
        }
    }

    /// Float value; integers are widened
    pub fn float(&self) -> Option<f64> {
        match self.value {
            FieldValue::Float(value) => Some(value),
            FieldValue::Integer(value) => Some(value as f64),
            _ => None,
        }
    }

    pub fn string(&self) -> Option<&str> {
        match &self.value {
            FieldValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.value {
            FieldValue::Bytes(value) => Some(value),
            _ => None,
        }
    }

    /// The enumeration entry matching the current integer value
    pub fn enumeration(&self) -> Option<&Enumeration> {
        let key = i64::try_from(self.integer()?).ok()?;
        self.field.enumeration(key)
    }

    /// The requirement label selected by the current value
    pub fn enumeration_requirement(&self) -> Option<&str> {
        self.enumeration()?.requires.as_deref()
    }
}

impl fmt::Display for FieldHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.value)?;
        if let Some(unit) = self.field.unit() {
            write!(f, " ({})", unit)?;
        }
        Ok(())
    }
}
