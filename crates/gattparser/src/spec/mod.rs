//! GATT specification model
//!
//! This module holds the in-memory schema of services and characteristics,
//! the registry that resolves field references between them, and the static
//! analysis that decides which directions each characteristic supports.

pub mod constants;
pub mod format;
pub mod registry;
pub mod types;
pub mod validity;

#[cfg(test)]
mod tests;

pub use format::{FieldFormat, FormatKind};
pub use registry::Specification;
pub use types::{
    Access, Bit, BitField, Characteristic, Enumeration, Field, Service, ServiceCharacteristic,
};
pub use validity::Validity;
