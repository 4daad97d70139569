//! Logical column datatypes and their physical mappings
//!
//! - [`DataType`]: the closed set of logical datatypes a column may declare
//! - [`Dialect`]: the SQL products DDL can be generated for
//! - [`SqlType`]: a physical type name plus its parameters
//! - [`physical_type`]: logical → physical mapping, per dialect or generic

mod dialect;
mod physical;

pub use dialect::Dialect;
pub use physical::{SqlType, normalized_sql_type, parse_override, physical_type, type_variants};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error raised by the type system
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("Unknown datatype '{tag}' on column {column_id}")]
    UnknownDataType { tag: String, column_id: String },
    #[error("Invalid {dialect} datatype '{text}': {message}")]
    InvalidSqlType {
        dialect: Dialect,
        text: String,
        message: String,
    },
}

/// Logical datatype of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Unicode,
    Text,
    Binary,
    Timestamp,
}

impl DataType {
    /// Every logical datatype, in declaration order
    pub const ALL: [DataType; 13] = [
        DataType::Boolean,
        DataType::Byte,
        DataType::Short,
        DataType::Int,
        DataType::Long,
        DataType::Float,
        DataType::Double,
        DataType::Char,
        DataType::String,
        DataType::Unicode,
        DataType::Text,
        DataType::Binary,
        DataType::Timestamp,
    ];

    /// Resolve a datatype tag declared on a column.
    ///
    /// # Arguments
    ///
    /// * `tag` - The datatype tag as written in the document
    /// * `column_id` - Id of the declaring column, reported on failure
    ///
    /// # Example
    ///
    /// ```rust
    /// use schema_catalog_sdk::types::DataType;
    ///
    /// assert_eq!(DataType::resolve("long", "#t.c").unwrap(), DataType::Long);
    /// assert!(DataType::resolve("varchar", "#t.c").is_err());
    /// ```
    pub fn resolve(tag: &str, column_id: &str) -> Result<Self, TypeError> {
        tag.parse().map_err(|_| TypeError::UnknownDataType {
            tag: tag.to_string(),
            column_id: column_id.to_string(),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Byte => "byte",
            DataType::Short => "short",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Char => "char",
            DataType::String => "string",
            DataType::Unicode => "unicode",
            DataType::Text => "text",
            DataType::Binary => "binary",
            DataType::Timestamp => "timestamp",
        }
    }

    /// Whether a column of this type must declare a `length`
    pub fn requires_length(&self) -> bool {
        matches!(
            self,
            DataType::Char
                | DataType::String
                | DataType::Unicode
                | DataType::Text
                | DataType::Binary
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Byte | DataType::Short | DataType::Int | DataType::Long
        )
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }

    /// Types whose default value is written as a character string
    pub fn is_character(&self) -> bool {
        matches!(
            self,
            DataType::Char | DataType::String | DataType::Unicode | DataType::Text
        )
    }

    /// VOTable primitive used for `TAP_SCHEMA.columns.datatype`
    pub fn votable_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Byte | DataType::Binary => "unsignedByte",
            DataType::Short => "short",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Char | DataType::String | DataType::Text | DataType::Timestamp => "char",
            DataType::Unicode => "unicodeChar",
        }
    }
}

impl std::str::FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown datatype: {}", s))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
