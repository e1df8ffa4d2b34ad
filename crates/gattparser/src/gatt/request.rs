//! Write requests
//!
//! A request holds one field holder per field of a characteristic, in field
//! order. Which holders must be set before the request can be serialized
//! depends on the `Mandatory` label and on the requirement label selected by
//! the live value of the control point field.

use super::holder::{FieldHolder, FieldValue};
use crate::error::{GattParserError, GattResult};
use crate::spec::constants::MANDATORY_FLAG;
use crate::spec::Field;
use log::info;
use std::sync::Arc;

/// Completeness of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// No field is set
    Empty,
    /// Some fields are set, but not every currently required one
    Populated,
    /// Every currently required field is set
    Serializable,
}

/// An in-progress write to one characteristic
#[derive(Debug, Clone)]
pub struct GattRequest {
    characteristic_uuid: String,
    holders: Vec<FieldHolder>,
    /// Index of the control point holder
    control_point: Option<usize>,
}

impl GattRequest {
    /// Create a request with an empty holder for each field
    pub fn new(characteristic_uuid: impl Into<String>, fields: &[Arc<Field>]) -> Self {
        let holders: Vec<FieldHolder> = fields
            .iter()
            .map(|field| FieldHolder::new(Arc::clone(field)))
            .collect();
        let control_point = holders
            .iter()
            .position(|holder| holder.field().is_control_point());

        Self {
            characteristic_uuid: characteristic_uuid.into(),
            holders,
            control_point,
        }
    }

    pub fn characteristic_uuid(&self) -> &str {
        &self.characteristic_uuid
    }

    /// Set a field's value by name
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> GattResult<()> {
        self.holder_mut(name)?.set(value.into())
    }

    /// Unset a field by name
    pub fn clear_field(&mut self, name: &str) -> GattResult<()> {
        self.holder_mut(name)?.clear();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldHolder> {
        self.holders.iter().find(|holder| holder.name() == name)
    }

    /// Holders in field order
    pub fn holders(&self) -> &[FieldHolder] {
        &self.holders
    }

    /// The holder whose value selects a requirement label
    pub fn control_point(&self) -> Option<&FieldHolder> {
        self.holders.get(self.control_point?)
    }

    /// Requirement label selected by the control point's current value
    pub fn selected_requirement(&self) -> Option<&str> {
        self.control_point()?.enumeration_requirement()
    }

    /// Non-reserved holders tagged with `label`
    pub fn required_holders(&self, label: &str) -> Vec<&FieldHolder> {
        self.holders
            .iter()
            .filter(|holder| !holder.field().is_reserved() && holder.field().has_requirement(label))
            .collect()
    }

    pub fn mandatory_holders(&self) -> Vec<&FieldHolder> {
        self.required_holders(MANDATORY_FLAG)
    }

    /// Check that every currently required field is set.
    ///
    /// Fails with `InvalidRequest` naming the first unset field. Fields
    /// tagged with the control point's selected label are checked first,
    /// then the mandatory ones. A selected label that no field carries fails
    /// on the control point itself.
    pub fn check(&self) -> GattResult<()> {
        let mut conditional = Vec::new();
        if let (Some(control_point), Some(label)) = (self.control_point(), self.selected_requirement()) {
            conditional = self.required_holders(label);
            if conditional.is_empty() {
                info!(
                    "GATT request for {} is not valid; could not find any field by requirement: {}",
                    self.characteristic_uuid, label
                );
                return Err(GattParserError::InvalidRequest {
                    field: control_point.name().to_string(),
                });
            }
        }

        let unset = conditional
            .into_iter()
            .chain(self.mandatory_holders())
            .find(|holder| !holder.is_value_set());

        match unset {
            Some(holder) => {
                info!(
                    "GATT request for {} is not valid; field is not set: {}",
                    self.characteristic_uuid,
                    holder.name()
                );
                Err(GattParserError::InvalidRequest {
                    field: holder.name().to_string(),
                })
            }
            None => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }

    pub fn state(&self) -> RequestState {
        if !self.holders.iter().any(FieldHolder::is_value_set) {
            RequestState::Empty
        } else if self.is_valid() {
            RequestState::Serializable
        } else {
            RequestState::Populated
        }
    }

    fn holder_mut(&mut self, name: &str) -> GattResult<&mut FieldHolder> {
        self.holders
            .iter_mut()
            .find(|holder| holder.name() == name)
            .ok_or_else(|| GattParserError::UnknownField(name.to_string()))
    }
}
