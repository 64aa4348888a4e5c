//! Database schema definitions and constants.

// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

// Table names
pub const TABLE_RECORDS: &str = "records";

// Column names for records table
pub mod records {
    pub const KEY: &str = "k";
    pub const VALUE: &str = "v";
}
