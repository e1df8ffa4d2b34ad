//! Error types for the gattparser library
//!
//! This module defines the error types used throughout the library.

use std::fmt;
use thiserror::Error;

/// Errors that can occur when decoding or encoding GATT characteristic values
#[derive(Error, Debug)]
pub enum GattParserError {
    #[error("Schema inconsistency in characteristic \"{characteristic}\": {reason}")]
    SchemaInconsistency { characteristic: String, reason: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("GATT request is not valid; field is not set: {field}")]
    InvalidRequest { field: String },

    #[error("Malformed payload for field \"{field}\": {reason}")]
    MalformedPayload { field: String, reason: String },

    #[error("Unsupported field format: {0}")]
    UnsupportedFormat(String),

    #[error("Bit range out of bounds: {required_bits} bits required, {available_bits} available")]
    OutOfRange {
        required_bits: usize,
        available_bits: usize,
    },

    #[error("Unknown characteristic: {0}")]
    UnknownCharacteristic(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid value for field \"{field}\": {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GattParserError {
    /// Builds a `MalformedPayload` error for a field that needs more bits than remain
    pub fn short_payload(field: &str, required_bits: usize, available_bits: usize) -> Self {
        GattParserError::MalformedPayload {
            field: field.to_string(),
            reason: format!(
                "{} bits required, {} available",
                required_bits, available_bits
            ),
        }
    }

    /// Builds an `InvalidValue` error
    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        GattParserError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// A schema problem recorded against a registered characteristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency {
    pub characteristic: String,
    pub reason: String,
}

impl Inconsistency {
    pub fn new(characteristic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            characteristic: characteristic.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.characteristic, self.reason)
    }
}

impl From<Inconsistency> for GattParserError {
    fn from(inconsistency: Inconsistency) -> Self {
        GattParserError::SchemaInconsistency {
            characteristic: inconsistency.characteristic,
            reason: inconsistency.reason,
        }
    }
}

/// Result type used throughout the library
pub type GattResult<T> = Result<T, GattParserError>;
