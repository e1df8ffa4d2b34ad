use gattparser::{Characteristic, Enumeration, Field, FieldFormat, GattParser, GattParserError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let parser = GattParser::new();

    // SC Control Point: the op code decides which parameter must follow
    parser.register_characteristic(
        Characteristic::new("2A55", "SC Control Point", "org.bluetooth.characteristic.sc_control_point")
            .with_field(
                Field::new("Op Code", FieldFormat::parse("uint8")?)
                    .with_requirement("Mandatory")
                    .with_enumerations(vec![
                        Enumeration::new(1, "Set Cumulative Value").with_requires("C1"),
                        Enumeration::new(2, "Update Sensor Location").with_requires("C2"),
                        Enumeration::new(3, "Request Supported Sensor Locations"),
                    ]),
            )
            .with_field(Field::new("Cumulative Value", FieldFormat::parse("uint32")?).with_requirement("C1"))
            .with_field(Field::new("Sensor Location", FieldFormat::parse("uint8")?).with_requirement("C2")),
    )?;

    let mut request = parser.prepare("2A55")?;
    println!("New request: {:?}", request.state());

    request.set_field("Op Code", 1u8)?;
    println!(
        "Op code set, selected requirement: {:?}, state: {:?}",
        request.selected_requirement(),
        request.state()
    );

    // Serializing now fails and names the missing field
    match parser.serialize(&request) {
        Err(GattParserError::InvalidRequest { field }) => println!("Missing field: {}", field),
        other => println!("Unexpected result: {:?}", other),
    }

    request.set_field("Cumulative Value", 1000u32)?;
    println!("State: {:?}", request.state());

    let raw = parser.serialize(&request)?;
    println!("Value to write: {:02X?}", raw);

    Ok(())
}
