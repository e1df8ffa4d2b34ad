use gattparser::{Bit, BitField, Characteristic, Field, FieldFormat, GattParser};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let parser = GattParser::new();

    // Heart Rate Measurement, as a specification loader would build it
    println!("Registering Heart Rate Measurement...");
    parser.register_characteristic(
        Characteristic::new("2A37", "Heart Rate Measurement", "org.bluetooth.characteristic.heart_rate_measurement")
            .with_field(
                Field::new("Flags", FieldFormat::parse("8bit")?)
                    .with_requirement("Mandatory")
                    .with_bit_field(BitField::new(vec![
                        Bit::new(0, 1, "C"),
                        Bit::new(1, 2, "S"),
                        Bit::new(3, 1, "E"),
                        Bit::new(4, 1, "R"),
                        Bit::new(5, 3, "RFU"),
                    ])),
            )
            .with_field(
                Field::new("Heart Rate Measurement Value (uint8)", FieldFormat::parse("uint8")?)
                    .with_requirement("C0")
                    .with_unit("org.bluetooth.unit.period.beats_per_minute"),
            )
            .with_field(
                Field::new("Heart Rate Measurement Value (uint16)", FieldFormat::parse("uint16")?)
                    .with_requirement("C1")
                    .with_unit("org.bluetooth.unit.period.beats_per_minute"),
            )
            .with_field(
                Field::new("Energy Expended", FieldFormat::parse("uint16")?)
                    .with_requirement("E1")
                    .with_unit("org.bluetooth.unit.energy.joule"),
            )
            .with_field(
                Field::new("RR-Interval", FieldFormat::parse("uint16")?)
                    .with_requirement("R1")
                    .with_unit("org.bluetooth.unit.time.second"),
            ),
    )?;

    let uuid = "00002a37-0000-1000-8000-00805f9b34fb";
    println!("Valid for read: {}", parser.is_valid_for_read(uuid));
    println!("Valid for write: {}", parser.is_valid_for_write(uuid));

    // Notifications as a heart rate sensor would send them
    let notifications: [&[u8]; 2] = [
        &[0x00, 0x48],
        &[0x19, 0x2C, 0x01, 0x10, 0x00, 0x00, 0x04],
    ];

    for raw in notifications {
        println!("\nNotification: {:02X?}", raw);
        let response = parser.parse(uuid, raw)?;
        for holder in response.holders() {
            println!("  {}", holder);
        }
        println!("  Flags: {:?}", response.flags());
    }

    Ok(())
}
