//! Unit tests for the specification registry

use super::*;
use crate::error::GattParserError;

const DATE_TIME_TYPE: &str = "org.bluetooth.characteristic.date_time";
const TEMPERATURE_TYPE_TYPE: &str = "org.bluetooth.characteristic.temperature_type";
const TEMPERATURE_MEASUREMENT_TYPE: &str = "org.bluetooth.characteristic.temperature_measurement";

fn date_time() -> Characteristic {
    Characteristic::new("2A08", "Date Time", DATE_TIME_TYPE)
        .with_field(Field::new("Year", FieldFormat::uint(16)).with_requirement("Mandatory"))
        .with_field(Field::new("Month", FieldFormat::uint(8)).with_requirement("Mandatory"))
        .with_field(Field::new("Day", FieldFormat::uint(8)).with_requirement("Mandatory"))
        .with_field(Field::new("Hours", FieldFormat::uint(8)).with_requirement("Mandatory"))
        .with_field(Field::new("Minutes", FieldFormat::uint(8)).with_requirement("Mandatory"))
        .with_field(Field::new("Seconds", FieldFormat::uint(8)).with_requirement("Mandatory"))
}

fn temperature_type() -> Characteristic {
    Characteristic::new("2A1D", "Temperature Type", TEMPERATURE_TYPE_TYPE).with_field(
        Field::new("Temperature Text Description", FieldFormat::uint(8))
            .with_requirement("Mandatory"),
    )
}

fn temperature_measurement() -> Characteristic {
    Characteristic::new("2A1C", "Temperature Measurement", TEMPERATURE_MEASUREMENT_TYPE)
        .with_field(
            Field::new("Flags", FieldFormat::uint(8))
                .with_requirement("Mandatory")
                .with_bit_field(BitField::new(vec![
                    Bit::new(0, 1, "C"),
                    Bit::new(1, 1, "T"),
                    Bit::new(2, 1, "Y"),
                    Bit::new(3, 5, "RFU"),
                ])),
        )
        .with_field(
            Field::new("Temperature Measurement Value (Celsius)", FieldFormat::parse("FLOAT").unwrap())
                .with_requirement("C0"),
        )
        .with_field(
            Field::new("Temperature Measurement Value (Fahrenheit)", FieldFormat::parse("FLOAT").unwrap())
                .with_requirement("C1"),
        )
        .with_field(Field::reference("Time Stamp", DATE_TIME_TYPE).with_requirement("T1"))
        .with_field(Field::reference("Temperature Type", TEMPERATURE_TYPE_TYPE).with_requirement("Y1"))
}

fn field_names(fields: &[std::sync::Arc<Field>]) -> Vec<&str> {
    fields.iter().map(|field| field.name()).collect()
}

#[test]
fn test_register_canonicalizes_uuid() {
    let mut spec = Specification::new();
    let registered = spec
        .add_characteristic(Characteristic::new(
            "00002a08-0000-1000-8000-00805f9b34fb",
            "Date Time",
            DATE_TIME_TYPE,
        ).with_field(Field::new("Year", FieldFormat::uint(16))))
        .unwrap();

    assert_eq!(registered.uuid(), "2A08");
    assert!(spec.contains_characteristic("2a08"));
    assert!(spec.contains_characteristic("00002A08-0000-1000-8000-00805F9B34FB"));
    assert!(spec.get_characteristic_by_type(DATE_TIME_TYPE).is_some());
    assert!(!spec.contains_characteristic("2A09"));
}

#[test]
fn test_register_rejects_bad_identifier() {
    let mut spec = Specification::new();
    let result = spec.add_characteristic(Characteristic::new("zzzzzzzz-0000", "Bad", "bad"));
    assert!(matches!(result, Err(GattParserError::InvalidIdentifier(_))));
}

#[test]
fn test_references_are_spliced_with_overridden_requirements() {
    let mut spec = Specification::new();
    spec.add_characteristic(date_time()).unwrap();
    spec.add_characteristic(temperature_type()).unwrap();
    spec.add_characteristic(temperature_measurement()).unwrap();

    let fields = spec.get_fields("2A1C").unwrap();
    assert_eq!(
        field_names(&fields),
        vec![
            "Flags",
            "Temperature Measurement Value (Celsius)",
            "Temperature Measurement Value (Fahrenheit)",
            "Year",
            "Month",
            "Day",
            "Hours",
            "Minutes",
            "Seconds",
            "Temperature Text Description",
        ]
    );
    assert!(fields.iter().all(|field| field.get_reference().is_none()));
    assert_eq!(fields[3].requirements(), ["T1"]);
    assert_eq!(fields[9].requirements(), ["Y1"]);

    // The referenced definition itself is untouched
    assert_eq!(spec.get_fields("2A08").unwrap()[0].requirements(), ["Mandatory"]);

    let characteristic = spec.get_characteristic("2A1C").unwrap();
    assert!(characteristic.is_valid_for_read());
    assert!(!characteristic.is_valid_for_write());
    assert!(spec.inconsistencies().is_empty());
}

#[test]
fn test_references_resolve_in_any_order() {
    let mut spec = Specification::new();
    spec.add_characteristic(temperature_measurement()).unwrap();

    assert!(matches!(
        spec.get_fields("2A1C"),
        Err(GattParserError::SchemaInconsistency { .. })
    ));
    assert!(spec.get_characteristic("2A1C").unwrap().access().is_empty());
    assert_eq!(spec.inconsistencies().len(), 1);

    spec.add_characteristic(date_time()).unwrap();
    // Still missing the temperature type
    assert!(spec.get_fields("2A1C").is_err());

    spec.add_characteristic(temperature_type()).unwrap();
    assert_eq!(spec.get_fields("2A1C").unwrap().len(), 10);
    assert_eq!(spec.get_characteristic("2A1C").unwrap().access(), Access::READ);
    assert!(spec.inconsistencies().is_empty());
}

#[test]
fn test_reregistering_a_referenced_type_updates_dependents() {
    let mut spec = Specification::new();
    spec.add_characteristic(date_time()).unwrap();
    spec.add_characteristic(temperature_type()).unwrap();
    spec.add_characteristic(temperature_measurement()).unwrap();

    // An extension shadows the date time definition
    let shorter = Characteristic::new("2A08", "Date Time", DATE_TIME_TYPE)
        .with_field(Field::new("Year", FieldFormat::uint(16)).with_requirement("Mandatory"));
    spec.add_characteristic(shorter).unwrap();

    assert_eq!(spec.get_fields("2A1C").unwrap().len(), 5);
    assert_eq!(spec.characteristics().len(), 3);
}

#[test]
fn test_reference_cycle_is_an_inconsistency() {
    let mut spec = Specification::new();
    spec.add_characteristic(
        Characteristic::new("FFF1", "Ping", "ping")
            .with_field(Field::new("Value", FieldFormat::uint(8)))
            .with_field(Field::reference("Pong", "pong")),
    )
    .unwrap();
    spec.add_characteristic(
        Characteristic::new("FFF2", "Pong", "pong").with_field(Field::reference("Ping", "ping")),
    )
    .unwrap();

    let issues = spec.inconsistencies();
    assert_eq!(issues.len(), 2);
    assert!(issues.iter().all(|issue| issue.reason.contains("cycle")));
    assert!(!spec.get_characteristic("FFF1").unwrap().is_valid_for_read());
    assert!(!spec.get_characteristic("FFF2").unwrap().is_valid_for_write());
}

#[test]
fn test_self_reference_is_a_cycle() {
    let mut spec = Specification::new();
    spec.add_characteristic(
        Characteristic::new("FFF3", "Loop", "loop").with_field(Field::reference("Again", "loop")),
    )
    .unwrap();

    let issues = spec.inconsistencies();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].characteristic, "Loop");
}

#[test]
fn test_unusable_characteristic_is_recorded() {
    let mut spec = Specification::new();
    let characteristic = Characteristic::new("FFF4", "Broken", "broken")
        .with_field(
            Field::new("Flags", FieldFormat::uint(8))
                .with_bit_field(BitField::new(vec![Bit::new(0, 8, "C")])),
        )
        .with_field(Field::new("Value", FieldFormat::uint(8)).with_requirement("X1"));

    let registered = spec.add_characteristic(characteristic).unwrap();
    assert!(registered.access().is_empty());

    let issues = spec.inconsistencies();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].reason.contains("X1"));
}

#[test]
fn test_characteristic_without_value() {
    let mut spec = Specification::new();
    let registered = spec
        .add_characteristic(Characteristic::new("2A00", "Device Name", "device_name"))
        .unwrap();

    assert!(registered.access().is_empty());
    assert!(spec.get_fields("2A00").unwrap().is_empty());
    assert!(spec.inconsistencies().is_empty());
}

#[test]
fn test_replacing_by_type_drops_the_old_uuid() {
    let mut spec = Specification::new();
    spec.add_characteristic(date_time()).unwrap();

    let moved = Characteristic::new("FFF5", "Date Time", DATE_TIME_TYPE)
        .with_field(Field::new("Year", FieldFormat::uint(16)));
    spec.add_characteristic(moved).unwrap();

    assert!(!spec.contains_characteristic("2A08"));
    assert_eq!(spec.get_characteristic_by_type(DATE_TIME_TYPE).unwrap().uuid(), "FFF5");
}

#[test]
fn test_retyping_a_referenced_characteristic_breaks_dependents() {
    let mut spec = Specification::new();
    spec.add_characteristic(
        Characteristic::new("FFF6", "Inner", "inner.v1")
            .with_field(Field::new("X", FieldFormat::uint(8)).with_requirement("Mandatory")),
    )
    .unwrap();
    spec.add_characteristic(
        Characteristic::new("FFF7", "Outer", "outer").with_field(Field::reference("Inner", "inner.v1")),
    )
    .unwrap();
    assert_eq!(field_names(&spec.get_fields("FFF7").unwrap()), vec!["X"]);

    // Same UUID, new type: nothing answers to the old type any more
    spec.add_characteristic(
        Characteristic::new("FFF6", "Inner", "inner.v2")
            .with_field(Field::new("X", FieldFormat::uint(8)).with_requirement("Mandatory")),
    )
    .unwrap();

    assert!(spec.get_characteristic_by_type("inner.v1").is_none());
    match spec.get_fields("FFF7") {
        Err(GattParserError::SchemaInconsistency { characteristic, reason }) => {
            assert_eq!(characteristic, "Outer");
            assert!(reason.contains("inner.v1"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(spec.get_characteristic("FFF7").unwrap().access().is_empty());
    assert_eq!(spec.inconsistencies().len(), 1);

    // Registering the old type again repairs the dependent
    spec.add_characteristic(
        Characteristic::new("FFF8", "Inner Again", "inner.v1")
            .with_field(Field::new("Y", FieldFormat::uint(8)).with_requirement("Mandatory")),
    )
    .unwrap();
    assert_eq!(field_names(&spec.get_fields("FFF7").unwrap()), vec!["Y"]);
    assert!(spec.inconsistencies().is_empty());
}

#[test]
fn test_bits_must_fill_the_flags_field() {
    let mut spec = Specification::new();
    let characteristic = Characteristic::new("FFF1", "Overflowing", "overflowing")
        .with_field(
            Field::new("Flags", FieldFormat::uint(8))
                .with_requirement("Mandatory")
                .with_bit_field(BitField::new(vec![Bit::new(0, 4, "A"), Bit::new(1, 8, "B")])),
        )
        .with_field(Field::new("Value", FieldFormat::uint(8)).with_requirement("B15"));

    let registered = spec.add_characteristic(characteristic).unwrap();
    assert!(registered.access().is_empty());

    let issues = spec.inconsistencies();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].characteristic, "Overflowing");
    assert!(issues[0].reason.contains("12 bits"));

    // Bits that fall short of the field are just as wrong
    let short = Characteristic::new("FFF2", "Short", "short").with_field(
        Field::new("Flags", FieldFormat::uint(16))
            .with_requirement("Mandatory")
            .with_bit_field(BitField::new(vec![Bit::new(0, 8, "A")])),
    );
    assert!(spec.add_characteristic(short).unwrap().access().is_empty());
    assert_eq!(spec.inconsistencies().len(), 2);
}

#[test]
fn test_services() {
    let mut spec = Specification::new();
    let service = Service::new("0000180f-0000-1000-8000-00805f9b34fb", "Battery Service", "org.bluetooth.service.battery_service")
        .with_characteristic("Battery Level", "org.bluetooth.characteristic.battery_level", "Mandatory");

    let registered = spec.add_service(service).unwrap();
    assert_eq!(registered.uuid(), "180F");
    assert!(spec.contains_service("180f"));
    assert_eq!(spec.get_service("180F").unwrap().characteristics().len(), 1);
    assert_eq!(spec.services().len(), 1);
    assert!(!spec.contains_service("1810"));
}
