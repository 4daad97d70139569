//! TAP_SCHEMA translation
//!
//! Turns a validated schema into the rows of the five standard TAP_SCHEMA
//! tables (`schemas`, `tables`, `columns`, `keys`, `key_columns`).

pub mod records;
pub mod translator;

pub use records::{
    ColumnRecord, KeyColumnRecord, KeyRecord, SchemaRecord, TableRecord, TapRecord,
    TapSchemaRecords, TapValue,
};
pub use translator::{SequenceGenerator, TapSchemaTranslator, translate};
