//! Generic relational metadata
//!
//! A dialect-neutral description of tables, columns, keys and indexes built
//! from a validated [`crate::models::Schema`]. The SQL exporter renders it
//! as DDL; an execution layer may consume it directly.

pub mod builder;

pub use builder::MetadataBuilder;

use crate::models::{Initially, ReferentialAction};
use crate::types::{Dialect, SqlType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error raised while translating a validated schema.
///
/// Translators assume validator output; any inconsistency is a bug in the
/// caller or the validator, not a user error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// Relational metadata for one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use = "metadata should be rendered or handed to an executor"]
pub struct RelationalMetadata {
    /// Schema (database) name
    pub schema_name: String,
    /// Whether table names are qualified with `schema_name`
    pub qualified: bool,
    /// Dialect the physical types were resolved for, `None` for generic
    pub dialect: Option<Dialect>,
    pub comment: Option<String>,
    pub tables: Vec<TableDescriptor>,
}

impl RelationalMetadata {
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Storage options of a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    /// MySQL storage engine
    pub engine: Option<String>,
    /// MySQL default character set
    pub charset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    /// Schema the table lives in, when qualified
    pub schema: Option<String>,
    pub comment: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Option<KeyDescriptor>,
    /// Foreign key, unique and check constraints in declaration order
    pub constraints: Vec<ConstraintDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub options: TableOptions,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `schema.table` when qualified, else the bare name
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

/// Autoincrement behaviour of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Autoincrement {
    /// Left to the backend
    Auto,
    Enabled,
    Disabled,
}

/// Server-side default of a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnDefault {
    /// A SQL literal, already quoted where needed
    Literal(String),
    CurrentTimestamp,
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Type for the target dialect (or generic)
    pub sql_type: SqlType,
    /// Type per dialect, overrides applied
    pub variants: BTreeMap<Dialect, SqlType>,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
    pub autoincrement: Autoincrement,
    pub comment: Option<String>,
}

/// Primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Table the foreign key points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintDescriptorKind {
    ForeignKey {
        columns: Vec<String>,
        referenced_table: TableRef,
        referenced_columns: Vec<String>,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
    },
    Unique {
        columns: Vec<String>,
    },
    /// Expression passed through verbatim
    Check {
        expression: String,
    },
}

/// A foreign key, unique or check constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub comment: Option<String>,
    pub deferrable: bool,
    pub initially: Option<Initially>,
    pub kind: ConstraintDescriptorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexElement {
    Column(String),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub comment: Option<String>,
    pub elements: Vec<IndexElement>,
}
