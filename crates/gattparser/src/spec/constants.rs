//! Constants for GATT specification documents

/// Requirement label of a field that is always present
pub const MANDATORY_FLAG: &str = "Mandatory";
/// Requirement label of a field that may be omitted
pub const OPTIONAL_FLAG: &str = "Optional";

/// Name of the field carrying a characteristic's read flags
pub const FLAGS_FIELD_NAME: &str = "Flags";
/// Names recognised as a control point's op code field
pub const OP_CODE_FIELD_NAMES: [&str; 2] = ["Op Code", "OpCode"];

/// Widest Bit whose every value is enumerated when computing the read flag universe
pub const MAX_ENUMERATED_BIT_WIDTH: u32 = 16;

/// Widest integer the codec handles
pub const MAX_INTEGER_WIDTH: u32 = 64;
