//! Column model

use super::extensions::ExtensionMap;
use crate::types::{DataType, Dialect};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Server-side default sentinels accepted in a column's `value`
pub const CURRENT_TIMESTAMP_KEYWORDS: [&str; 3] = ["CURRENT_TIMESTAMP", "NOW()", "LOCALTIMESTAMP"];

/// Default value of a column
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// `CURRENT_TIMESTAMP` and its synonyms
    CurrentTimestamp,
    /// Explicit `NULL`
    Null,
}

impl DefaultValue {
    /// Interpret a document value, recognising the server-default sentinels
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(DefaultValue::Boolean(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(DefaultValue::Integer)
                .or_else(|| n.as_f64().map(DefaultValue::Float)),
            serde_json::Value::String(s) => {
                let upper = s.trim().to_uppercase();
                if CURRENT_TIMESTAMP_KEYWORDS.contains(&upper.as_str()) {
                    Some(DefaultValue::CurrentTimestamp)
                } else if upper == "NULL" {
                    Some(DefaultValue::Null)
                } else {
                    Some(DefaultValue::Text(s.clone()))
                }
            }
            serde_json::Value::Null => Some(DefaultValue::Null),
            _ => None,
        }
    }

    /// Whether this default can be stored in a column of `datatype`
    pub fn fits(&self, datatype: DataType) -> bool {
        match self {
            DefaultValue::Boolean(_) => datatype == DataType::Boolean,
            DefaultValue::Integer(_) => datatype.is_integer() || datatype.is_floating_point(),
            DefaultValue::Float(_) => datatype.is_floating_point(),
            DefaultValue::Text(s) => datatype.is_character() && !s.is_empty(),
            DefaultValue::CurrentTimestamp => datatype == DataType::Timestamp,
            DefaultValue::Null => true,
        }
    }
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DefaultValue::Boolean(b) => serializer.serialize_bool(*b),
            DefaultValue::Integer(i) => serializer.serialize_i64(*i),
            DefaultValue::Float(f) => serializer.serialize_f64(*f),
            DefaultValue::Text(s) => serializer.serialize_str(s),
            DefaultValue::CurrentTimestamp => serializer.serialize_str("CURRENT_TIMESTAMP"),
            DefaultValue::Null => serializer.serialize_str("NULL"),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        DefaultValue::from_value(&value)
            .ok_or_else(|| D::Error::custom("default value must be a scalar"))
    }
}

/// Where an imported column was copied from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLineage {
    /// Resource name in the importing schema's `resources`
    pub resource: String,
    /// URI the resource resolved to
    pub uri: String,
    /// Source table name
    pub table: String,
    /// Source column id
    pub column_id: String,
}

/// Column of a table.
///
/// Field names follow the document keys; namespaced keys that are not typed
/// here land in `extensions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub datatype: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoincrement: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DefaultValue>,
    #[serde(rename = "ivoa:unit", default, skip_serializing_if = "Option::is_none")]
    pub ivoa_unit: Option<String>,
    #[serde(rename = "fits:tunit", default, skip_serializing_if = "Option::is_none")]
    pub fits_tunit: Option<String>,
    #[serde(rename = "ivoa:ucd", default, skip_serializing_if = "Option::is_none")]
    pub ivoa_ucd: Option<String>,
    #[serde(rename = "votable:utype", default, skip_serializing_if = "Option::is_none")]
    pub votable_utype: Option<String>,
    #[serde(rename = "votable:arraysize", default, skip_serializing_if = "Option::is_none")]
    pub votable_arraysize: Option<String>,
    #[serde(rename = "votable:datatype", default, skip_serializing_if = "Option::is_none")]
    pub votable_datatype: Option<String>,
    #[serde(rename = "votable:xtype", default, skip_serializing_if = "Option::is_none")]
    pub votable_xtype: Option<String>,
    #[serde(rename = "tap:principal", default, skip_serializing_if = "Option::is_none")]
    pub tap_principal: Option<i64>,
    #[serde(rename = "tap:std", default, skip_serializing_if = "Option::is_none")]
    pub tap_std: Option<i64>,
    #[serde(rename = "tap:column_index", default, skip_serializing_if = "Option::is_none")]
    pub tap_column_index: Option<i64>,
    #[serde(rename = "mysql:datatype", default, skip_serializing_if = "Option::is_none")]
    pub mysql_datatype: Option<String>,
    #[serde(rename = "postgresql:datatype", default, skip_serializing_if = "Option::is_none")]
    pub postgresql_datatype: Option<String>,
    #[serde(rename = "sqlite:datatype", default, skip_serializing_if = "Option::is_none")]
    pub sqlite_datatype: Option<String>,
    #[serde(rename = "oracle:datatype", default, skip_serializing_if = "Option::is_none")]
    pub oracle_datatype: Option<String>,
    #[serde(flatten)]
    pub extensions: ExtensionMap,
    /// Set on columns materialized from a `columnRefs` import
    #[serde(skip)]
    pub lineage: Option<ColumnLineage>,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    /// Create a nullable column with no annotations
    ///
    /// # Example
    ///
    /// ```rust
    /// use schema_catalog_sdk::models::Column;
    /// use schema_catalog_sdk::types::DataType;
    ///
    /// let column = Column::new("#customers.customer_id", "customer_id", DataType::Int);
    /// assert!(column.nullable);
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>, datatype: DataType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            datatype,
            length: None,
            precision: None,
            nullable: true,
            autoincrement: None,
            value: None,
            ivoa_unit: None,
            fits_tunit: None,
            ivoa_ucd: None,
            votable_utype: None,
            votable_arraysize: None,
            votable_datatype: None,
            votable_xtype: None,
            tap_principal: None,
            tap_std: None,
            tap_column_index: None,
            mysql_datatype: None,
            postgresql_datatype: None,
            sqlite_datatype: None,
            oracle_datatype: None,
            extensions: ExtensionMap::new(),
            lineage: None,
        }
    }

    /// Datatype override declared for `dialect`, if any
    pub fn datatype_override(&self, dialect: Dialect) -> Option<&str> {
        match dialect {
            Dialect::MySql => self.mysql_datatype.as_deref(),
            Dialect::PostgreSql => self.postgresql_datatype.as_deref(),
            Dialect::Sqlite => self.sqlite_datatype.as_deref(),
            Dialect::Oracle => self.oracle_datatype.as_deref(),
        }
    }

    pub(crate) fn set_datatype_override(&mut self, dialect: Dialect, value: Option<String>) {
        match dialect {
            Dialect::MySql => self.mysql_datatype = value,
            Dialect::PostgreSql => self.postgresql_datatype = value,
            Dialect::Sqlite => self.sqlite_datatype = value,
            Dialect::Oracle => self.oracle_datatype = value,
        }
    }

    /// All declared datatype overrides in dialect order
    pub fn datatype_overrides(&self) -> impl Iterator<Item = (Dialect, &str)> + '_ {
        Dialect::ALL
            .into_iter()
            .filter_map(|d| self.datatype_override(d).map(|t| (d, t)))
    }

    /// Unit, preferring the IVOA annotation over the FITS one
    pub fn unit(&self) -> Option<&str> {
        self.ivoa_unit.as_deref().or(self.fits_tunit.as_deref())
    }

    /// Fill in `votable:arraysize` and `votable:xtype` when not declared.
    ///
    /// Fixed-width `char` gets its length, variable strings get `<length>*`
    /// (or `*` when `force_unbounded` is set), `text` and `timestamp` get `*`.
    pub fn apply_votable_defaults(&mut self, force_unbounded: bool) {
        if self.votable_arraysize.is_none() {
            let length = self.length.filter(|l| *l > 1);
            self.votable_arraysize = match (self.datatype, length) {
                (DataType::Char, Some(l)) => Some(l.to_string()),
                (DataType::String | DataType::Unicode | DataType::Binary, Some(_))
                    if force_unbounded =>
                {
                    Some("*".to_string())
                }
                (DataType::String | DataType::Unicode | DataType::Binary, Some(l)) => {
                    Some(format!("{}*", l))
                }
                (DataType::Timestamp | DataType::Text, _) => Some("*".to_string()),
                _ => None,
            };
            if let Some(arraysize) = &self.votable_arraysize {
                debug!(column = %self.id, arraysize = %arraysize, "Defaulted votable:arraysize");
            }
        }
        if self.votable_xtype.is_none() && self.datatype == DataType::Timestamp {
            self.votable_xtype = Some("timestamp".to_string());
        }
    }
}
