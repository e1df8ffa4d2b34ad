//! Schema entities for GATT services and characteristics
//!
//! These types are the in-memory form of Bluetooth SIG GATT specification
//! documents (and user extensions). An external loader builds them once with
//! the builder methods below; the rest of the library only reads them.

use super::constants::*;
use super::format::FieldFormat;
use bitflags::bitflags;

bitflags! {
    /// Operations a registered characteristic is valid for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Access: u8 {
        const READ = 0x01;
        const WRITE = 0x02;
    }
}

/// One entry of a field's enumeration table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    /// Encoded value
    pub key: i64,
    /// Human-readable meaning
    pub value: String,
    /// Requirement label selected by this value, if any
    pub requires: Option<String>,
}

impl Enumeration {
    /// Create an enumeration entry without a requirement label
    pub fn new(key: i64, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
            requires: None,
        }
    }

    /// Attach a requirement label
    pub fn with_requires(mut self, requires: impl Into<String>) -> Self {
        self.requires = Some(requires.into());
        self
    }
}

/// One fixed-width sub-value of a bit-field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bit {
    /// Declared position. Used only to order bits, never as an offset.
    pub ordinal: u32,
    /// Width in bits
    pub width: u32,
    /// Label used when rendering a symbolic flag
    pub label: String,
}

impl Bit {
    /// Create a new bit entry
    pub fn new(ordinal: u32, width: u32, label: impl Into<String>) -> Self {
        Self {
            ordinal,
            width,
            label: label.into(),
        }
    }
}

/// A field whose value is a packed sequence of [`Bit`]s
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitField {
    bits: Vec<Bit>,
}

impl BitField {
    /// Create a bit-field from its bits, in any order
    pub fn new(bits: Vec<Bit>) -> Self {
        Self { bits }
    }

    /// Add a bit
    pub fn with_bit(mut self, bit: Bit) -> Self {
        self.bits.push(bit);
        self
    }

    /// Bits as declared
    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// Bits sorted by ordinal. Equal ordinals keep their declaration order.
    pub fn ordered_bits(&self) -> Vec<&Bit> {
        let mut bits: Vec<&Bit> = self.bits.iter().collect();
        bits.sort_by_key(|bit| bit.ordinal);
        bits
    }

    /// Sum of all bit widths
    pub fn total_width(&self) -> u32 {
        self.bits.iter().map(|bit| bit.width).sum()
    }
}

/// One named value slot of a characteristic
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    format: Option<FieldFormat>,
    reference: Option<String>,
    bit_field: Option<BitField>,
    enumerations: Option<Vec<Enumeration>>,
    requirements: Vec<String>,
    control_point: bool,
    unit: Option<String>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    decimal_exponent: Option<i32>,
}

impl Field {
    /// Create a field with the given format
    pub fn new(name: impl Into<String>, format: FieldFormat) -> Self {
        Self {
            name: name.into(),
            format: Some(format),
            reference: None,
            bit_field: None,
            enumerations: None,
            requirements: Vec::new(),
            control_point: false,
            unit: None,
            minimum: None,
            maximum: None,
            decimal_exponent: None,
        }
    }

    /// Create a field that stands for the fields of another characteristic type
    pub fn reference(name: impl Into<String>, characteristic_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: None,
            reference: Some(characteristic_type.into()),
            bit_field: None,
            enumerations: None,
            requirements: Vec::new(),
            control_point: false,
            unit: None,
            minimum: None,
            maximum: None,
            decimal_exponent: None,
        }
    }

    /// Create a reserved padding field
    pub fn reserved(size: u32) -> Self {
        Self::new("Reserved", FieldFormat::reserved(size))
    }

    pub fn with_bit_field(mut self, bit_field: BitField) -> Self {
        self.bit_field = Some(bit_field);
        self
    }

    pub fn with_enumeration(mut self, enumeration: Enumeration) -> Self {
        self.enumerations
            .get_or_insert_with(Vec::new)
            .push(enumeration);
        self
    }

    pub fn with_enumerations(mut self, enumerations: Vec<Enumeration>) -> Self {
        self.enumerations = Some(enumerations);
        self
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirements.push(requirement.into());
        self
    }

    /// Mark this field as the characteristic's control point
    pub fn as_control_point(mut self) -> Self {
        self.control_point = true;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Integer values are scaled by `10^exponent`
    pub fn with_decimal_exponent(mut self, exponent: i32) -> Self {
        self.decimal_exponent = Some(exponent);
        self
    }

    /// Replace the requirement labels
    pub(crate) fn set_requirements(&mut self, requirements: Vec<String>) {
        self.requirements = requirements;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> Option<&FieldFormat> {
        self.format.as_ref()
    }

    /// Type identifier of the referenced characteristic, if any
    pub fn get_reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn bit_field(&self) -> Option<&BitField> {
        self.bit_field.as_ref()
    }

    /// Enumeration table, or `None` when the field has none
    pub fn enumerations(&self) -> Option<&[Enumeration]> {
        self.enumerations.as_deref()
    }

    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn minimum(&self) -> Option<f64> {
        self.minimum
    }

    pub fn maximum(&self) -> Option<f64> {
        self.maximum
    }

    pub fn decimal_exponent(&self) -> Option<i32> {
        self.decimal_exponent
    }

    /// Returns true if the field carries the given requirement label
    pub fn has_requirement(&self, requirement: &str) -> bool {
        self.requirements.iter().any(|r| r == requirement)
    }

    pub fn is_mandatory(&self) -> bool {
        self.has_requirement(MANDATORY_FLAG)
    }

    /// Returns true if the only requirement is `Optional`
    pub fn is_optional_only(&self) -> bool {
        self.requirements.len() == 1 && self.requirements[0] == OPTIONAL_FLAG
    }

    pub fn is_reserved(&self) -> bool {
        self.format.map_or(false, |format| format.is_reserved())
    }

    /// A bit-field named `Flags`
    pub fn is_flags_field(&self) -> bool {
        self.bit_field.is_some() && self.name.trim().eq_ignore_ascii_case(FLAGS_FIELD_NAME)
    }

    /// An enumeration-backed field whose value selects a requirement label
    pub fn is_control_point(&self) -> bool {
        if self.control_point {
            return true;
        }
        let name = self.name.trim();
        self.enumerations.is_some()
            && OP_CODE_FIELD_NAMES
                .iter()
                .any(|candidate| name.eq_ignore_ascii_case(candidate))
    }

    /// Find the enumeration entry for a key
    pub fn enumeration(&self, key: i64) -> Option<&Enumeration> {
        self.enumerations()?.iter().find(|e| e.key == key)
    }
}

/// A GATT characteristic specification
#[derive(Debug, Clone, PartialEq)]
pub struct Characteristic {
    uuid: String,
    name: String,
    type_: String,
    value: Option<Vec<Field>>,
    access: Access,
}

impl Characteristic {
    /// Create a characteristic without a value definition
    pub fn new(uuid: impl Into<String>, name: impl Into<String>, type_: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            type_: type_.into(),
            value: None,
            access: Access::empty(),
        }
    }

    /// Append a field to the value definition
    pub fn with_field(mut self, field: Field) -> Self {
        self.value.get_or_insert_with(Vec::new).push(field);
        self
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable type identifier, e.g. `org.bluetooth.characteristic.battery_level`
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// Returns true if the characteristic declares a value
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Declared fields, references not expanded
    pub fn fields(&self) -> &[Field] {
        self.value.as_deref().unwrap_or(&[])
    }

    /// The field whose flags or enumerations satisfy the other fields' requirements
    pub fn flags_field(&self) -> Option<&Field> {
        let fields = self.fields();
        fields
            .iter()
            .find(|field| field.is_flags_field())
            .or_else(|| fields.iter().find(|field| field.is_control_point()))
    }

    /// Operations this characteristic was found valid for at registration
    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is_valid_for_read(&self) -> bool {
        self.access.contains(Access::READ)
    }

    pub fn is_valid_for_write(&self) -> bool {
        self.access.contains(Access::WRITE)
    }

    pub(crate) fn set_uuid(&mut self, uuid: String) {
        self.uuid = uuid;
    }

    pub(crate) fn set_access(&mut self, access: Access) {
        self.access = access;
    }
}

/// A characteristic listed by a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCharacteristic {
    pub name: String,
    pub type_: String,
    pub requirement: String,
}

/// A GATT service specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    uuid: String,
    name: String,
    type_: String,
    characteristics: Vec<ServiceCharacteristic>,
}

impl Service {
    /// Create a service with no characteristics
    pub fn new(uuid: impl Into<String>, name: impl Into<String>, type_: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            type_: type_.into(),
            characteristics: Vec::new(),
        }
    }

    /// List a characteristic under this service
    pub fn with_characteristic(
        mut self,
        name: impl Into<String>,
        type_: impl Into<String>,
        requirement: impl Into<String>,
    ) -> Self {
        self.characteristics.push(ServiceCharacteristic {
            name: name.into(),
            type_: type_.into(),
            requirement: requirement.into(),
        });
        self
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn characteristics(&self) -> &[ServiceCharacteristic] {
        &self.characteristics
    }

    pub(crate) fn set_uuid(&mut self, uuid: String) {
        self.uuid = uuid;
    }
}
