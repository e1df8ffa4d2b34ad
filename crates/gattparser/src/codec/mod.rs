//! Characteristic value codecs
//!
//! This module converts raw characteristic values to field holders and back.
//! The layers build on each other: the bit-field engine reads and writes
//! arbitrary bit ranges, the flag resolver turns bit-fields into symbolic
//! flags, and the generic codec walks a whole field list.

pub mod bits;
pub mod flags;
pub mod float;
pub mod generic;


pub use generic::{CharacteristicCodec, GenericCodec};
