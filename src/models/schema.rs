//! Schema model, the root of a validated catalog description

use super::column::Column;
use super::constraint::{ColumnGroup, Constraint, Index};
use super::extensions::ExtensionMap;
use super::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version: a bare string or a structured compatibility record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaVersion {
    Plain(String),
    Structured {
        current: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        compatible: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        read_compatible: Vec<String>,
    },
}

impl SchemaVersion {
    pub fn current(&self) -> &str {
        match self {
            SchemaVersion::Plain(v) => v,
            SchemaVersion::Structured { current, .. } => current,
        }
    }
}

/// Any object of a schema that carries an id
#[derive(Debug, Clone, Copy)]
pub enum SchemaObject<'a> {
    Schema(&'a Schema),
    Table(&'a Table),
    Column(&'a Column),
    ColumnGroup(&'a ColumnGroup),
    Constraint(&'a Constraint),
    Index(&'a Index),
}

/// Validated schema.
///
/// Produced by [`crate::validation::SchemaValidator`]; downstream
/// translators treat it as read-only and assume its invariants hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<SchemaVersion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, String>,
    pub tables: Vec<Table>,
    #[serde(rename = "votable:utype", default, skip_serializing_if = "Option::is_none")]
    pub votable_utype: Option<String>,
    #[serde(rename = "tap:schema_index", default, skip_serializing_if = "Option::is_none")]
    pub tap_schema_index: Option<i64>,
    #[serde(flatten)]
    pub extensions: ExtensionMap,
}

impl Schema {
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table owning the column with the given id
    pub fn table_of_column(&self, column_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.column(column_id).is_some())
    }

    /// Find a column anywhere in the schema
    pub fn find_column(&self, column_id: &str) -> Option<&Column> {
        self.tables.iter().find_map(|t| t.column(column_id))
    }

    /// Look up any object by id
    pub fn object(&self, id: &str) -> Option<SchemaObject<'_>> {
        if self.id == id {
            return Some(SchemaObject::Schema(self));
        }
        for table in &self.tables {
            if table.id == id {
                return Some(SchemaObject::Table(table));
            }
            if let Some(column) = table.column(id) {
                return Some(SchemaObject::Column(column));
            }
            if let Some(group) = table.column_groups.iter().find(|g| g.id == id) {
                return Some(SchemaObject::ColumnGroup(group));
            }
            if let Some(constraint) = table.constraints.iter().find(|c| c.id == id) {
                return Some(SchemaObject::Constraint(constraint));
            }
            if let Some(index) = table.indexes.iter().find(|i| i.id == id) {
                return Some(SchemaObject::Index(index));
            }
        }
        None
    }

    /// Foreign-key constraints of every table, in document order
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&Table, &Constraint)> + '_ {
        self.tables.iter().flat_map(|t| {
            t.constraints
                .iter()
                .filter(|c| c.is_foreign_key())
                .map(move |c| (t, c))
        })
    }

    /// Serialize back into the document shape
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
