//! GATT parser
//!
//! The parser is the entry point of the library. It owns the registered
//! specification and the custom codec table, and turns raw characteristic
//! values into responses and requests into raw values.

use super::holder::FieldHolder;
use super::request::GattRequest;
use super::response::GattResponse;
use crate::codec::{CharacteristicCodec, GenericCodec};
use crate::error::{GattParserError, GattResult, Inconsistency};
use crate::spec::{Characteristic, Field, Service, Specification};
use crate::uuid::short_uuid;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// GATT parser configuration
#[derive(Debug, Clone)]
pub struct GattParserConfig {
    /// Strictness used by [`GattParser::serialize`]
    pub strict: bool,
    /// Fail parsing when bytes remain after the last field
    pub reject_trailing_bytes: bool,
}

impl Default for GattParserConfig {
    fn default() -> Self {
        Self {
            strict: true,
            reject_trailing_bytes: false,
        }
    }
}

/// Decodes and encodes characteristic values by registered specification
///
/// All methods take `&self`; share a parser between threads with an `Arc`.
pub struct GattParser {
    /// Parser configuration
    config: RwLock<GattParserConfig>,
    /// Registered services and characteristics
    specification: RwLock<Specification>,
    /// Custom codecs by short characteristic UUID
    codecs: RwLock<HashMap<String, Arc<dyn CharacteristicCodec>>>,
}

impl GattParser {
    /// Create a parser with no registered characteristics
    pub fn new() -> Self {
        Self::with_config(GattParserConfig::default())
    }

    /// Create a parser with the given configuration
    pub fn with_config(config: GattParserConfig) -> Self {
        Self {
            config: RwLock::new(config),
            specification: RwLock::new(Specification::new()),
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// Set parser configuration
    pub fn set_config(&self, config: GattParserConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Get parser configuration
    pub fn config(&self) -> GattParserConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a characteristic, replacing any earlier one with the same UUID or type
    pub fn register_characteristic(&self, characteristic: Characteristic) -> GattResult<Arc<Characteristic>> {
        self.spec_mut().add_characteristic(characteristic)
    }

    /// Register several characteristics under one lock acquisition
    pub fn register_characteristics<I>(&self, characteristics: I) -> GattResult<()>
    where
        I: IntoIterator<Item = Characteristic>,
    {
        let mut spec = self.spec_mut();
        for characteristic in characteristics {
            spec.add_characteristic(characteristic)?;
        }
        Ok(())
    }

    /// Register a service, replacing any earlier one with the same UUID
    pub fn register_service(&self, service: Service) -> GattResult<Arc<Service>> {
        self.spec_mut().add_service(service)
    }

    /// Register several services under one lock acquisition
    pub fn register_services<I>(&self, services: I) -> GattResult<()>
    where
        I: IntoIterator<Item = Service>,
    {
        let mut spec = self.spec_mut();
        for service in services {
            spec.add_service(service)?;
        }
        Ok(())
    }

    pub fn get_characteristic(&self, uuid: &str) -> Option<Arc<Characteristic>> {
        self.spec().get_characteristic(uuid)
    }

    pub fn get_characteristic_by_type(&self, type_: &str) -> Option<Arc<Characteristic>> {
        self.spec().get_characteristic_by_type(type_)
    }

    pub fn get_service(&self, uuid: &str) -> Option<Arc<Service>> {
        self.spec().get_service(uuid)
    }

    pub fn characteristics(&self) -> Vec<Arc<Characteristic>> {
        self.spec().characteristics()
    }

    pub fn services(&self) -> Vec<Arc<Service>> {
        self.spec().services()
    }

    /// Field list of a characteristic with references expanded
    pub fn get_fields(&self, uuid: &str) -> GattResult<Vec<Arc<Field>>> {
        self.spec().get_fields(uuid)
    }

    /// Schema problems found during registration
    pub fn inconsistencies(&self) -> Vec<Inconsistency> {
        self.spec().inconsistencies()
    }

    /// Use a custom codec for one characteristic in both directions
    pub fn register_codec(&self, uuid: &str, codec: Arc<dyn CharacteristicCodec>) -> GattResult<()> {
        let uuid = short_uuid(uuid)?;
        debug!("Registered custom codec for {}", uuid);
        self.codecs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uuid, codec);
        Ok(())
    }

    /// Go back to the generic codec for a characteristic
    pub fn unregister_codec(&self, uuid: &str) -> Option<Arc<dyn CharacteristicCodec>> {
        let uuid = short_uuid(uuid).ok()?;
        self.codecs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&uuid)
    }

    pub fn is_known_characteristic(&self, uuid: &str) -> bool {
        self.spec().contains_characteristic(uuid)
    }

    pub fn is_known_service(&self, uuid: &str) -> bool {
        self.spec().contains_service(uuid)
    }

    pub fn is_valid_for_read(&self, uuid: &str) -> bool {
        self.get_characteristic(uuid)
            .map_or(false, |characteristic| characteristic.is_valid_for_read())
    }

    pub fn is_valid_for_write(&self, uuid: &str) -> bool {
        self.get_characteristic(uuid)
            .map_or(false, |characteristic| characteristic.is_valid_for_write())
    }

    /// Decode a raw characteristic value.
    ///
    /// Fails with `UnsupportedOperation` when the characteristic is not valid
    /// for read.
    pub fn parse(&self, uuid: &str, raw: &[u8]) -> GattResult<GattResponse> {
        let uuid = short_uuid(uuid)?;

        // Access flags and field list must come from the same registration
        let (characteristic, fields) = {
            let spec = self.spec();
            let characteristic = spec
                .get_characteristic(&uuid)
                .ok_or_else(|| GattParserError::UnknownCharacteristic(uuid.clone()))?;

            if !characteristic.is_valid_for_read() {
                return Err(GattParserError::UnsupportedOperation(format!(
                    "characteristic {} ({}) is not valid for read",
                    characteristic.name(),
                    uuid
                )));
            }

            let fields = spec.get_fields(&uuid)?;
            (characteristic, fields)
        };

        let holders = match self.custom_codec(&uuid) {
            Some(codec) => {
                trace!("Parsing {} with a custom codec", uuid);
                codec.decode(&characteristic, &fields, raw)?
            }
            None => self.generic_codec().decode(&characteristic, &fields, raw)?,
        };

        Ok(GattResponse::new(uuid, holders))
    }

    /// Create an empty request for a characteristic
    pub fn prepare(&self, uuid: &str) -> GattResult<GattRequest> {
        let uuid = short_uuid(uuid)?;
        let fields = self.get_fields(&uuid)?;
        Ok(GattRequest::new(uuid, &fields))
    }

    /// Returns true if every currently required field of the request is set
    pub fn validate(&self, request: &GattRequest) -> bool {
        request.is_valid()
    }

    /// Encode a request with the configured strictness
    pub fn serialize(&self, request: &GattRequest) -> GattResult<Vec<u8>> {
        let strict = self.config().strict;
        self.serialize_with(request, strict)
    }

    /// Encode a request.
    ///
    /// When `strict`, the request must be complete and the characteristic
    /// valid for write. Otherwise the holders are encoded as they are.
    pub fn serialize_with(&self, request: &GattRequest, strict: bool) -> GattResult<Vec<u8>> {
        let uuid = request.characteristic_uuid();

        if strict {
            request.check()?;

            let characteristic = self
                .get_characteristic(uuid)
                .ok_or_else(|| GattParserError::UnknownCharacteristic(uuid.to_string()))?;
            if !characteristic.is_valid_for_write() {
                return Err(GattParserError::UnsupportedOperation(format!(
                    "characteristic {} ({}) is not valid for write",
                    characteristic.name(),
                    uuid
                )));
            }
        }

        self.encode(uuid, request.holders())
    }

    fn encode(&self, uuid: &str, holders: &[FieldHolder]) -> GattResult<Vec<u8>> {
        match self.custom_codec(uuid) {
            Some(codec) => {
                trace!("Serializing {} with a custom codec", uuid);
                codec.encode(holders)
            }
            None => self.generic_codec().encode(holders),
        }
    }

    /// The lock is held only for the lookup
    fn custom_codec(&self, uuid: &str) -> Option<Arc<dyn CharacteristicCodec>> {
        let uuid = short_uuid(uuid).ok()?;
        self.codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&uuid)
            .cloned()
    }

    fn generic_codec(&self) -> GenericCodec {
        GenericCodec::new().reject_trailing_bytes(self.config().reject_trailing_bytes)
    }

    fn spec(&self) -> RwLockReadGuard<'_, Specification> {
        self.specification
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn spec_mut(&self) -> RwLockWriteGuard<'_, Specification> {
        self.specification
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for GattParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GattParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codecs: Vec<String> = self
            .codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        let spec = self.spec();
        f.debug_struct("GattParser")
            .field("config", &self.config())
            .field("characteristics", &spec.characteristics().len())
            .field("services", &spec.services().len())
            .field("codecs", &codecs)
            .finish()
    }
}
