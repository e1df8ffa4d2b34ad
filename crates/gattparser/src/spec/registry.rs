//! Registered services and characteristics
//!
//! The registry owns every schema entity the parser knows about, keyed by
//! short UUID. Field references are expanded into a flat field list when a
//! characteristic is registered, and characteristics that reference a type
//! are resolved again whenever that type is (re-)registered, so definitions
//! can arrive in any order.

use super::types::{Access, Characteristic, Field, Service};
use super::validity;
use crate::error::{GattParserError, GattResult, Inconsistency};
use crate::uuid::{short_uuid, try_short_uuid};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// One registered characteristic with its resolved layout
#[derive(Debug, Clone)]
struct Entry {
    characteristic: Arc<Characteristic>,
    /// Reference-free field list, empty until resolution succeeds
    fields: Vec<Arc<Field>>,
    /// Every characteristic type reached while expanding references
    refs: BTreeSet<String>,
    /// Access granted by the validity analysis alone
    static_access: Access,
    resolved: bool,
    analysis_issue: Option<Inconsistency>,
    resolution_issue: Option<Inconsistency>,
}

/// The set of known services and characteristics
#[derive(Debug, Default)]
pub struct Specification {
    services: BTreeMap<String, Arc<Service>>,
    characteristics: BTreeMap<String, Entry>,
    /// Characteristic type -> short UUID
    characteristic_types: HashMap<String, String>,
}

impl Specification {
    /// Create an empty specification
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a characteristic, replacing any earlier one with the same UUID or type.
    ///
    /// Schema problems do not fail registration; they are logged and kept as
    /// [`Inconsistency`] records, and the characteristic ends up invalid for
    /// the affected direction.
    pub fn add_characteristic(&mut self, characteristic: Characteristic) -> GattResult<Arc<Characteristic>> {
        let uuid = short_uuid(characteristic.uuid())?;
        let mut characteristic = characteristic;
        characteristic.set_uuid(uuid.clone());

        // Drop whatever this UUID or type pointed at before
        let mut dropped_type = None;
        if let Some(previous) = self.characteristics.remove(&uuid) {
            let previous_type = previous.characteristic.type_();
            self.characteristic_types.remove(previous_type);
            if previous_type != characteristic.type_() {
                dropped_type = Some(previous_type.to_string());
            }
        }
        if let Some(previous_uuid) = self
            .characteristic_types
            .insert(characteristic.type_().to_string(), uuid.clone())
        {
            if previous_uuid != uuid {
                self.characteristics.remove(&previous_uuid);
            }
        }

        let (static_access, analysis_issue) = analyze(&characteristic, &uuid);

        debug!(
            "Registered characteristic {} ({}) as {}",
            characteristic.name(),
            uuid,
            characteristic.type_()
        );

        let type_ = characteristic.type_().to_string();
        self.characteristics.insert(
            uuid.clone(),
            Entry {
                characteristic: Arc::new(characteristic),
                fields: Vec::new(),
                refs: BTreeSet::new(),
                static_access,
                resolved: false,
                analysis_issue,
                resolution_issue: None,
            },
        );

        self.resolve_dependents(&type_);
        if let Some(dropped_type) = dropped_type {
            // Anything still referencing the old type can no longer resolve
            self.resolve_dependents(&dropped_type);
        }
        self.resolve(&uuid);

        self.get_characteristic(&uuid)
            .ok_or_else(|| GattParserError::UnknownCharacteristic(uuid))
    }

    /// Register a service, replacing any earlier one with the same UUID
    pub fn add_service(&mut self, service: Service) -> GattResult<Arc<Service>> {
        let uuid = short_uuid(service.uuid())?;
        let mut service = service;
        service.set_uuid(uuid.clone());

        debug!("Registered service {} ({})", service.name(), uuid);

        let service = Arc::new(service);
        self.services.insert(uuid, Arc::clone(&service));
        Ok(service)
    }

    /// Look up a characteristic by short or full UUID
    pub fn get_characteristic(&self, uuid: &str) -> Option<Arc<Characteristic>> {
        let entry = self.characteristics.get(&try_short_uuid(uuid)?)?;
        Some(Arc::clone(&entry.characteristic))
    }

    /// Look up a characteristic by its type identifier
    pub fn get_characteristic_by_type(&self, type_: &str) -> Option<Arc<Characteristic>> {
        let uuid = self.characteristic_types.get(type_)?;
        self.get_characteristic(uuid)
    }

    /// Look up a service by short or full UUID
    pub fn get_service(&self, uuid: &str) -> Option<Arc<Service>> {
        self.services.get(&try_short_uuid(uuid)?).cloned()
    }

    /// All registered characteristics, ordered by UUID
    pub fn characteristics(&self) -> Vec<Arc<Characteristic>> {
        self.characteristics
            .values()
            .map(|entry| Arc::clone(&entry.characteristic))
            .collect()
    }

    /// All registered services, ordered by UUID
    pub fn services(&self) -> Vec<Arc<Service>> {
        self.services.values().cloned().collect()
    }

    /// The reference-free field list of a characteristic.
    ///
    /// Fails with `UnknownCharacteristic` for an unregistered UUID and with
    /// `SchemaInconsistency` when its references could not be resolved.
    pub fn get_fields(&self, uuid: &str) -> GattResult<Vec<Arc<Field>>> {
        let entry = try_short_uuid(uuid)
            .and_then(|uuid| self.characteristics.get(&uuid))
            .ok_or_else(|| GattParserError::UnknownCharacteristic(uuid.to_string()))?;

        if let Some(issue) = &entry.resolution_issue {
            return Err(issue.clone().into());
        }
        Ok(entry.fields.clone())
    }

    /// Returns true if the UUID names a registered characteristic
    pub fn contains_characteristic(&self, uuid: &str) -> bool {
        try_short_uuid(uuid).map_or(false, |uuid| self.characteristics.contains_key(&uuid))
    }

    /// Returns true if the UUID names a registered service
    pub fn contains_service(&self, uuid: &str) -> bool {
        try_short_uuid(uuid).map_or(false, |uuid| self.services.contains_key(&uuid))
    }

    /// Every schema problem found so far, ordered by characteristic UUID
    pub fn inconsistencies(&self) -> Vec<Inconsistency> {
        self.characteristics
            .values()
            .flat_map(|entry| {
                entry
                    .analysis_issue
                    .iter()
                    .chain(entry.resolution_issue.iter())
                    .cloned()
            })
            .collect()
    }

    /// Resolve again every other entry that failed or depends on `type_`
    fn resolve_dependents(&mut self, type_: &str) {
        let dependents: Vec<String> = self
            .characteristics
            .iter()
            .filter(|(_, entry)| entry.characteristic.type_() != type_)
            .filter(|(_, entry)| !entry.resolved || entry.refs.contains(type_))
            .map(|(uuid, _)| uuid.clone())
            .collect();

        for uuid in dependents {
            self.resolve(&uuid);
        }
    }

    fn resolve(&mut self, uuid: &str) {
        let Some(entry) = self.characteristics.get(uuid) else {
            return;
        };
        let characteristic = Arc::clone(&entry.characteristic);

        let mut stack = vec![characteristic.type_().to_string()];
        let mut refs = BTreeSet::new();
        let outcome = self.expand(&characteristic, &mut stack, &mut refs);

        let Some(entry) = self.characteristics.get_mut(uuid) else {
            return;
        };
        entry.refs = refs;

        let access = match outcome {
            Ok(fields) => {
                entry.fields = fields;
                entry.resolved = true;
                entry.resolution_issue = None;
                entry.static_access
            }
            Err(reason) => {
                let issue = Inconsistency::new(characteristic.name(), reason);
                warn!("Schema inconsistency in {}", issue);
                entry.fields = Vec::new();
                entry.resolved = false;
                entry.resolution_issue = Some(issue);
                Access::empty()
            }
        };

        if entry.characteristic.access() != access {
            let mut updated = Characteristic::clone(&entry.characteristic);
            updated.set_access(access);
            entry.characteristic = Arc::new(updated);
        }
    }

    /// Splice referenced characteristics' fields in place of reference fields.
    ///
    /// `stack` holds the types currently being expanded; meeting one of them
    /// again is a cycle.
    fn expand(
        &self,
        characteristic: &Characteristic,
        stack: &mut Vec<String>,
        refs: &mut BTreeSet<String>,
    ) -> Result<Vec<Arc<Field>>, String> {
        let mut fields = Vec::new();

        for field in characteristic.fields() {
            let Some(type_) = field.get_reference() else {
                fields.push(Arc::new(field.clone()));
                continue;
            };

            refs.insert(type_.to_string());
            if stack.iter().any(|seen| seen == type_) {
                return Err(format!(
                    "reference cycle through {} in field \"{}\"",
                    type_,
                    field.name()
                ));
            }

            let referenced = self
                .characteristic_types
                .get(type_)
                .and_then(|uuid| self.characteristics.get(uuid))
                .map(|entry| Arc::clone(&entry.characteristic))
                .ok_or_else(|| {
                    format!("field \"{}\" references unknown type {}", field.name(), type_)
                })?;

            stack.push(type_.to_string());
            let spliced = self.expand(&referenced, stack, refs);
            stack.pop();

            for spliced_field in spliced? {
                if field.requirements().is_empty() {
                    fields.push(spliced_field);
                } else {
                    // The referencing field's requirements govern the spliced fields
                    let mut overridden = Field::clone(&spliced_field);
                    overridden.set_requirements(field.requirements().to_vec());
                    fields.push(Arc::new(overridden));
                }
            }
        }

        Ok(fields)
    }
}

/// Access granted by the schema alone, with the problem that withheld it
fn analyze(characteristic: &Characteristic, uuid: &str) -> (Access, Option<Inconsistency>) {
    if let Some(reason) = validity::bit_field_mismatch(characteristic) {
        let issue = Inconsistency::new(characteristic.name(), reason);
        warn!("Schema inconsistency in {}", issue);
        return (Access::empty(), Some(issue));
    }

    match validity::analyze(characteristic) {
        None => {
            warn!(
                "Characteristic {} ({}) declares no value; it is valid for neither read nor write",
                characteristic.name(),
                uuid
            );
            (Access::empty(), None)
        }
        Some(validity) => {
            let issue = validity.is_unusable().then(|| {
                let unmet: BTreeSet<_> = validity
                    .unmet_read
                    .union(&validity.unmet_write)
                    .cloned()
                    .collect();
                Inconsistency::new(
                    characteristic.name(),
                    format!("requirements {:?} cannot be met by its flags field", unmet),
                )
            });
            if let Some(issue) = &issue {
                warn!("Schema inconsistency in {}", issue);
            }
            (validity.access(), issue)
        }
    }
}
