//! GATT value parsing
//!
//! This module provides the parser facade together with the request and
//! response types that carry field values in and out of it.

pub mod holder;
pub mod parser;
pub mod request;
pub mod response;


pub use holder::{FieldHolder, FieldValue};
pub use parser::{GattParser, GattParserConfig};
pub use request::{GattRequest, RequestState};
pub use response::GattResponse;
