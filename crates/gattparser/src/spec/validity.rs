//! Validity analysis
//!
//! Decides at registration time whether a characteristic's value can be
//! decoded (every requirement label it uses can be produced by its flags
//! field) and whether it can be encoded (every label can be selected by its
//! control point's enumerations).

use super::constants::MANDATORY_FLAG;
use super::types::{Access, Characteristic};
use crate::codec::flags;
use std::collections::BTreeSet;

/// Outcome of analysing one characteristic
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validity {
    /// Requirement labels the read flag universe cannot produce
    pub unmet_read: BTreeSet<String>,
    /// Requirement labels the write flag universe cannot select
    pub unmet_write: BTreeSet<String>,
}

impl Validity {
    /// Operations the characteristic is valid for
    pub fn access(&self) -> Access {
        let mut access = Access::empty();
        if self.unmet_read.is_empty() {
            access |= Access::READ;
        }
        if self.unmet_write.is_empty() {
            access |= Access::WRITE;
        }
        access
    }

    /// Neither decoding nor encoding is possible
    pub fn is_unusable(&self) -> bool {
        self.access().is_empty()
    }
}

/// Requirement labels the characteristic's own fields depend on.
///
/// Fields that carry a bit-field or the `Mandatory` label are skipped, as is
/// a trailing field whose only requirement is `Optional`.
pub fn requirements(characteristic: &Characteristic) -> BTreeSet<String> {
    let fields = characteristic.fields();
    let mut requirements = BTreeSet::new();

    for (index, field) in fields.iter().enumerate() {
        if field.bit_field().is_some() || field.has_requirement(MANDATORY_FLAG) {
            continue;
        }
        let last = index + 1 == fields.len();
        if last && field.is_optional_only() {
            continue;
        }
        requirements.extend(field.requirements().iter().cloned());
    }

    requirements
}

/// Every symbolic flag the characteristic's flags field could produce
pub fn read_flags_universe(characteristic: &Characteristic) -> BTreeSet<String> {
    characteristic
        .flags_field()
        .and_then(|field| field.bit_field())
        .map(flags::all_possible_read_flags)
        .unwrap_or_default()
}

/// Every requirement label the characteristic's control point could select
pub fn write_flags_universe(characteristic: &Characteristic) -> BTreeSet<String> {
    characteristic
        .flags_field()
        .map(flags::all_possible_write_flags)
        .unwrap_or_default()
}

/// Describe the first field whose Bits do not exactly fill its declared width
pub fn bit_field_mismatch(characteristic: &Characteristic) -> Option<String> {
    characteristic.fields().iter().find_map(|field| {
        let bit_field = field.bit_field()?;
        let declared = field.format()?.size();
        let total = bit_field.total_width();
        (total != declared).then(|| {
            format!(
                "bits of field \"{}\" span {} bits but the field is {} bits wide",
                field.name(),
                total,
                declared
            )
        })
    })
}

/// Analyse a characteristic, or `None` if it declares no value
pub fn analyze(characteristic: &Characteristic) -> Option<Validity> {
    if !characteristic.has_value() {
        return None;
    }

    let requirements = requirements(characteristic);
    let read = read_flags_universe(characteristic);
    let write = write_flags_universe(characteristic);

    Some(Validity {
        unmet_read: requirements.difference(&read).cloned().collect(),
        unmet_write: requirements.difference(&write).cloned().collect(),
    })
}
