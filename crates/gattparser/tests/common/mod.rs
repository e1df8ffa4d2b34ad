//! Shared specification fixtures for integration tests

#![allow(dead_code)]

use gattparser::{Bit, BitField, Characteristic, Enumeration, Field, FieldFormat, GattParser, Service};

pub const DATE_TIME_TYPE: &str = "org.bluetooth.characteristic.date_time";
pub const TEMPERATURE_TYPE_TYPE: &str = "org.bluetooth.characteristic.temperature_type";

pub fn battery_level() -> Characteristic {
    Characteristic::new("2A19", "Battery Level", "org.bluetooth.characteristic.battery_level").with_field(
        Field::new("Level", FieldFormat::uint(8))
            .with_requirement("Mandatory")
            .with_unit("org.bluetooth.unit.percentage"),
    )
}

pub fn battery_service() -> Service {
    Service::new("180F", "Battery Service", "org.bluetooth.service.battery_service").with_characteristic(
        "Battery Level",
        "org.bluetooth.characteristic.battery_level",
        "Mandatory",
    )
}

pub fn heart_rate_measurement() -> Characteristic {
    Characteristic::new("2A37", "Heart Rate Measurement", "org.bluetooth.characteristic.heart_rate_measurement")
        .with_field(
            Field::new("Flags", FieldFormat::parse("8bit").unwrap())
                .with_requirement("Mandatory")
                .with_bit_field(BitField::new(vec![
                    Bit::new(0, 1, "C"),
                    Bit::new(1, 2, "S"),
                    Bit::new(3, 1, "E"),
                    Bit::new(4, 1, "R"),
                    Bit::new(5, 3, "RFU"),
                ])),
        )
        .with_field(Field::new("Heart Rate Measurement Value (uint8)", FieldFormat::uint(8)).with_requirement("C0"))
        .with_field(Field::new("Heart Rate Measurement Value (uint16)", FieldFormat::uint(16)).with_requirement("C1"))
        .with_field(Field::new("Energy Expended", FieldFormat::uint(16)).with_requirement("E1"))
        .with_field(Field::new("RR-Interval", FieldFormat::uint(16)).with_requirement("R1"))
}

pub fn sc_control_point() -> Characteristic {
    Characteristic::new("2A55", "SC Control Point", "org.bluetooth.characteristic.sc_control_point")
        .with_field(
            Field::new("Op Code", FieldFormat::uint(8))
                .with_requirement("Mandatory")
                .with_enumerations(vec![
                    Enumeration::new(1, "Set Cumulative Value").with_requires("C1"),
                    Enumeration::new(2, "Update Sensor Location").with_requires("C2"),
                    Enumeration::new(3, "Request Supported Sensor Locations"),
                ]),
        )
        .with_field(Field::new("Cumulative Value", FieldFormat::uint(32)).with_requirement("C1"))
        .with_field(Field::new("Sensor Location", FieldFormat::uint(8)).with_requirement("C2"))
}

pub fn date_time() -> Characteristic {
    Characteristic::new("2A08", "Date Time", DATE_TIME_TYPE)
        .with_field(Field::new("Year", FieldFormat::uint(16)).with_requirement("Mandatory"))
        .with_field(Field::new("Month", FieldFormat::uint(8)).with_requirement("Mandatory"))
        .with_field(Field::new("Day", FieldFormat::uint(8)).with_requirement("Mandatory"))
        .with_field(Field::new("Hours", FieldFormat::uint(8)).with_requirement("Mandatory"))
        .with_field(Field::new("Minutes", FieldFormat::uint(8)).with_requirement("Mandatory"))
        .with_field(Field::new("Seconds", FieldFormat::uint(8)).with_requirement("Mandatory"))
}

pub fn temperature_type() -> Characteristic {
    Characteristic::new("2A1D", "Temperature Type", TEMPERATURE_TYPE_TYPE).with_field(
        Field::new("Temperature Text Description", FieldFormat::uint(8))
            .with_requirement("Mandatory")
            .with_enumerations(vec![
                Enumeration::new(1, "Armpit"),
                Enumeration::new(2, "Body (general)"),
                Enumeration::new(3, "Ear (usually ear lobe)"),
            ]),
    )
}

pub fn temperature_measurement() -> Characteristic {
    let float = FieldFormat::parse("FLOAT").unwrap();
    Characteristic::new("2A1C", "Temperature Measurement", "org.bluetooth.characteristic.temperature_measurement")
        .with_field(
            Field::new("Flags", FieldFormat::parse("8bit").unwrap())
                .with_requirement("Mandatory")
                .with_bit_field(BitField::new(vec![
                    Bit::new(0, 1, "C"),
                    Bit::new(1, 1, "T"),
                    Bit::new(2, 1, "Y"),
                    Bit::new(3, 5, "RFU"),
                ])),
        )
        .with_field(Field::new("Temperature Measurement Value (Celsius)", float).with_requirement("C0"))
        .with_field(Field::new("Temperature Measurement Value (Fahrenheit)", float).with_requirement("C1"))
        .with_field(Field::reference("Time Stamp", DATE_TIME_TYPE).with_requirement("T1"))
        .with_field(Field::reference("Temperature Type", TEMPERATURE_TYPE_TYPE).with_requirement("Y1"))
}

/// A parser loaded with every fixture
pub fn parser() -> GattParser {
    let parser = GattParser::new();
    parser
        .register_characteristics(vec![
            // Referencing characteristic first, so resolution has to catch up
            temperature_measurement(),
            battery_level(),
            heart_rate_measurement(),
            sc_control_point(),
            date_time(),
            temperature_type(),
        ])
        .unwrap();
    parser.register_service(battery_service()).unwrap();
    parser
}
