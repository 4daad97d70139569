//! TAP_SCHEMA record types
//!
//! One struct per standard table. Field names and order match the columns of
//! the bundled TAP_SCHEMA description.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value bound into an `INSERT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapValue {
    Null,
    Int(i64),
    Text(String),
}

impl From<Option<String>> for TapValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(TapValue::Null, TapValue::Text)
    }
}

impl From<Option<i64>> for TapValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(TapValue::Null, TapValue::Int)
    }
}

impl From<String> for TapValue {
    fn from(value: String) -> Self {
        TapValue::Text(value)
    }
}

impl From<i64> for TapValue {
    fn from(value: i64) -> Self {
        TapValue::Int(value)
    }
}

/// SQL literal form
impl fmt::Display for TapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapValue::Null => f.write_str("NULL"),
            TapValue::Int(i) => write!(f, "{}", i),
            TapValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// A row of one of the TAP_SCHEMA tables
pub trait TapRecord {
    /// Standard table name, without schema or postfix
    const TABLE: &'static str;

    /// Column values in table column order
    fn values(&self) -> Vec<(&'static str, TapValue)>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub schema_name: String,
    pub utype: Option<String>,
    pub description: Option<String>,
    pub schema_index: Option<i64>,
}

impl TapRecord for SchemaRecord {
    const TABLE: &'static str = "schemas";

    fn values(&self) -> Vec<(&'static str, TapValue)> {
        vec![
            ("schema_name", self.schema_name.clone().into()),
            ("utype", self.utype.clone().into()),
            ("description", self.description.clone().into()),
            ("schema_index", self.schema_index.into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub schema_name: String,
    pub table_name: String,
    /// Always `table`
    pub table_type: String,
    pub utype: Option<String>,
    pub description: Option<String>,
    pub table_index: i64,
}

impl TapRecord for TableRecord {
    const TABLE: &'static str = "tables";

    fn values(&self) -> Vec<(&'static str, TapValue)> {
        vec![
            ("schema_name", self.schema_name.clone().into()),
            ("table_name", self.table_name.clone().into()),
            ("table_type", self.table_type.clone().into()),
            ("utype", self.utype.clone().into()),
            ("description", self.description.clone().into()),
            ("table_index", self.table_index.into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub table_name: String,
    pub column_name: String,
    /// VOTable primitive name
    pub datatype: String,
    pub arraysize: Option<String>,
    /// Numeric part of `arraysize`
    pub size: Option<i64>,
    pub xtype: Option<String>,
    pub description: Option<String>,
    pub utype: Option<String>,
    pub unit: Option<String>,
    pub ucd: Option<String>,
    pub indexed: i64,
    pub principal: i64,
    pub std: i64,
    pub column_index: i64,
}

impl TapRecord for ColumnRecord {
    const TABLE: &'static str = "columns";

    fn values(&self) -> Vec<(&'static str, TapValue)> {
        vec![
            ("table_name", self.table_name.clone().into()),
            ("column_name", self.column_name.clone().into()),
            ("datatype", self.datatype.clone().into()),
            ("arraysize", self.arraysize.clone().into()),
            ("size", self.size.into()),
            ("xtype", self.xtype.clone().into()),
            ("description", self.description.clone().into()),
            ("utype", self.utype.clone().into()),
            ("unit", self.unit.clone().into()),
            ("ucd", self.ucd.clone().into()),
            ("indexed", self.indexed.into()),
            ("principal", self.principal.into()),
            ("std", self.std.into()),
            ("column_index", self.column_index.into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Name of the foreign-key constraint
    pub key_id: String,
    pub from_table: String,
    pub target_table: String,
    pub utype: Option<String>,
    pub description: Option<String>,
}

impl TapRecord for KeyRecord {
    const TABLE: &'static str = "keys";

    fn values(&self) -> Vec<(&'static str, TapValue)> {
        vec![
            ("key_id", self.key_id.clone().into()),
            ("from_table", self.from_table.clone().into()),
            ("target_table", self.target_table.clone().into()),
            ("utype", self.utype.clone().into()),
            ("description", self.description.clone().into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumnRecord {
    pub key_id: String,
    pub from_column: String,
    pub target_column: String,
}

impl TapRecord for KeyColumnRecord {
    const TABLE: &'static str = "key_columns";

    fn values(&self) -> Vec<(&'static str, TapValue)> {
        vec![
            ("key_id", self.key_id.clone().into()),
            ("from_column", self.from_column.clone().into()),
            ("target_column", self.target_column.clone().into()),
        ]
    }
}

/// The five TAP_SCHEMA record sequences for one schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "translated records should be exported or inspected"]
pub struct TapSchemaRecords {
    pub schemas: Vec<SchemaRecord>,
    pub tables: Vec<TableRecord>,
    pub columns: Vec<ColumnRecord>,
    pub keys: Vec<KeyRecord>,
    pub key_columns: Vec<KeyColumnRecord>,
}

impl TapSchemaRecords {
    /// Total number of rows across all five tables
    pub fn len(&self) -> usize {
        self.schemas.len()
            + self.tables.len()
            + self.columns.len()
            + self.keys.len()
            + self.key_columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows grouped by table, in load order
    pub fn rows(&self) -> Vec<(&'static str, Vec<(&'static str, TapValue)>)> {
        fn collect<R: TapRecord>(
            out: &mut Vec<(&'static str, Vec<(&'static str, TapValue)>)>,
            records: &[R],
        ) {
            out.extend(records.iter().map(|r| (R::TABLE, r.values())));
        }

        let mut out = Vec::with_capacity(self.len());
        collect(&mut out, &self.schemas);
        collect(&mut out, &self.tables);
        collect(&mut out, &self.columns);
        collect(&mut out, &self.keys);
        collect(&mut out, &self.key_columns);
        out
    }
}
