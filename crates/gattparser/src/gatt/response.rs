//! Parse results

use super::holder::FieldHolder;
use crate::codec::flags;
use std::collections::BTreeSet;

/// Decoded value of one characteristic
#[derive(Debug, Clone, PartialEq)]
pub struct GattResponse {
    characteristic_uuid: String,
    holders: Vec<FieldHolder>,
}

impl GattResponse {
    pub fn new(characteristic_uuid: impl Into<String>, holders: Vec<FieldHolder>) -> Self {
        Self {
            characteristic_uuid: characteristic_uuid.into(),
            holders,
        }
    }

    pub fn characteristic_uuid(&self) -> &str {
        &self.characteristic_uuid
    }

    pub fn get(&self, name: &str) -> Option<&FieldHolder> {
        self.holders.iter().find(|holder| holder.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Decoded holders in field order
    pub fn holders(&self) -> &[FieldHolder] {
        &self.holders
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Symbolic flags asserted by the decoded bit-field holders
    pub fn flags(&self) -> BTreeSet<String> {
        self.holders
            .iter()
            .filter_map(|holder| {
                let bit_field = holder.field().bit_field()?;
                let raw = u64::try_from(holder.integer()?).ok()?;
                flags::read_flags(bit_field, &raw.to_le_bytes()).ok()
            })
            .flatten()
            .collect()
    }

    pub fn into_holders(self) -> Vec<FieldHolder> {
        self.holders
    }
}

impl IntoIterator for GattResponse {
    type Item = FieldHolder;
    type IntoIter = std::vec::IntoIter<FieldHolder>;

    fn into_iter(self) -> Self::IntoIter {
        self.holders.into_iter()
    }
}

impl<'a> IntoIterator for &'a GattResponse {
    type Item = &'a FieldHolder;
    type IntoIter = std::slice::Iter<'a, FieldHolder>;

    fn into_iter(self) -> Self::IntoIter {
        self.holders.iter()
    }
}
