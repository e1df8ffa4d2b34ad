//! gattparser - Schema-driven codec for Bluetooth GATT characteristic values
//!
//! This library decodes raw characteristic values read from Bluetooth LE
//! peripherals into named, typed fields, and encodes field values back into
//! raw values ready to be written. The layout of each characteristic comes
//! from its GATT specification, registered with the [`GattParser`] as
//! [`Characteristic`] and [`Service`] entities built by any loader.
//!
//! ```
//! use gattparser::{Characteristic, Field, FieldFormat, GattParser};
//!
//! let parser = GattParser::new();
//! parser
//!     .register_characteristic(
//!         Characteristic::new("2A19", "Battery Level", "org.bluetooth.characteristic.battery_level")
//!             .with_field(Field::new("Level", FieldFormat::uint(8)).with_requirement("Mandatory")),
//!     )
//!     .unwrap();
//!
//! let response = parser.parse("00002a19-0000-1000-8000-00805f9b34fb", &[0x64]).unwrap();
//! assert_eq!(response.get("Level").unwrap().integer(), Some(100));
//! ```

pub mod codec;
pub mod error;
pub mod gatt;
pub mod spec;
pub mod uuid;

// Re-export common types for convenience
pub use codec::{CharacteristicCodec, GenericCodec};
pub use error::{GattParserError, GattResult, Inconsistency};
pub use gatt::{
    FieldHolder, FieldValue, GattParser, GattParserConfig, GattRequest, GattResponse, RequestState,
};
pub use spec::{
    Access, Bit, BitField, Characteristic, Enumeration, Field, FieldFormat, FormatKind, Service,
    ServiceCharacteristic, Specification,
};
pub use uuid::short_uuid;
