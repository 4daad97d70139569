//! Table model

use super::column::Column;
use super::constraint::{ColumnGroup, Constraint, Index};
use super::extensions::ExtensionMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A column imported from another schema and kept as a reference.
///
/// Produced when resources are not dereferenced. `column` holds the imported
/// definition with overrides applied, so consumers never need to load the
/// source document again.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReference {
    /// Name of the entry in the schema's `resources`
    pub resource: String,
    /// Table name in the source schema
    pub table: String,
    /// Column name in the importing table
    pub name: String,
    /// Column name in the source table, when it differs from `name`
    pub ref_name: Option<String>,
    /// Overrides as written in the document
    pub overrides: Map<String, Value>,
    /// Resolved column definition
    pub column: Column,
}

impl ColumnReference {
    fn to_document(&self) -> Value {
        let mut entry = Map::new();
        if let Some(ref_name) = &self.ref_name {
            entry.insert("ref_name".to_string(), Value::String(ref_name.clone()));
        }
        if !self.overrides.is_empty() {
            entry.insert("overrides".to_string(), Value::Object(self.overrides.clone()));
        }
        Value::Object(entry)
    }
}

/// Table of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<Column>,
    #[serde(rename = "primaryKey", default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
    #[serde(rename = "columnGroups", default, skip_serializing_if = "Vec::is_empty")]
    pub column_groups: Vec<ColumnGroup>,
    #[serde(
        rename = "columnRefs",
        default,
        skip_deserializing,
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_column_refs"
    )]
    pub column_refs: Vec<ColumnReference>,
    #[serde(rename = "tap:table_index", default, skip_serializing_if = "Option::is_none")]
    pub tap_table_index: Option<i64>,
    #[serde(rename = "votable:utype", default, skip_serializing_if = "Option::is_none")]
    pub votable_utype: Option<String>,
    #[serde(rename = "mysql:engine", default, skip_serializing_if = "Option::is_none")]
    pub mysql_engine: Option<String>,
    #[serde(rename = "mysql:charset", default, skip_serializing_if = "Option::is_none")]
    pub mysql_charset: Option<String>,
    #[serde(flatten)]
    pub extensions: ExtensionMap,
}

impl Table {
    /// Create an empty table
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            constraints: Vec::new(),
            indexes: Vec::new(),
            column_groups: Vec::new(),
            column_refs: Vec::new(),
            tap_table_index: None,
            votable_utype: None,
            mysql_engine: None,
            mysql_charset: None,
            extensions: ExtensionMap::new(),
        }
    }

    /// Declared columns followed by columns kept as references
    pub fn all_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns
            .iter()
            .chain(self.column_refs.iter().map(|r| &r.column))
    }

    /// Find a column (declared or referenced) by id
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.all_columns().find(|c| c.id == id)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.all_columns().find(|c| c.name == name)
    }
}

fn serialize_column_refs<S: Serializer>(
    refs: &[ColumnReference],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    // resource -> table -> local column name, in first-seen order
    let mut tree: Map<String, Value> = Map::new();
    for r in refs {
        let tables = tree
            .entry(r.resource.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(tables) = tables {
            let columns = tables
                .entry(r.table.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(columns) = columns {
                columns.insert(r.name.clone(), r.to_document());
            }
        }
    }
    let mut map = serializer.serialize_map(Some(tree.len()))?;
    for (k, v) in &tree {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;
    use serde_json::json;

    #[test]
    fn test_all_columns_includes_references() {
        let mut table = Table::new("#orders", "orders");
        table
            .columns
            .push(Column::new("#orders.id", "id", DataType::Long));
        table.column_refs.push(ColumnReference {
            resource: "shared".to_string(),
            table: "customers".to_string(),
            name: "customer_name".to_string(),
            ref_name: Some("name".to_string()),
            overrides: Map::new(),
            column: Column::new("#orders.customer_name", "customer_name", DataType::String),
        });

        let names: Vec<_> = table.all_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "customer_name"]);
        assert!(table.column("#orders.customer_name").is_some());
        assert!(table.column_by_name("missing").is_none());
    }

    #[test]
    fn test_column_refs_serialize_as_tree() {
        let mut table = Table::new("#orders", "orders");
        table.column_refs.push(ColumnReference {
            resource: "shared".to_string(),
            table: "customers".to_string(),
            name: "customer_name".to_string(),
            ref_name: Some("name".to_string()),
            overrides: Map::new(),
            column: Column::new("#orders.customer_name", "customer_name", DataType::String),
        });
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(
            value["columnRefs"],
            json!({"shared": {"customers": {"customer_name": {"ref_name": "name"}}}})
        );
    }
}
