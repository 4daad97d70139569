//! Physical SQL types and the logical → physical mapping tables

use super::{DataType, Dialect, TypeError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;
use std::collections::BTreeMap;
use std::fmt;

static RE_SQL_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_ ]*?)\s*(?:\(\s*(\d+(?:\s*,\s*\d+)*)\s*\))?\s*([A-Za-z][A-Za-z ]*?)?\s*$")
        .expect("Invalid regex")
});

/// A physical column type: name, numeric parameters and an optional suffix
/// (`TIMESTAMP(6) WITHOUT TIME ZONE`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl SqlType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            suffix: None,
        }
    }

    pub fn with_params(name: impl Into<String>, params: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            params,
            suffix: None,
        }
    }

    fn sized(name: &str, length: Option<u32>) -> Self {
        Self::with_params(name, length.into_iter().collect())
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
            write!(f, "({})", params.join(","))?;
        }
        if let Some(suffix) = &self.suffix {
            write!(f, " {}", suffix)?;
        }
        Ok(())
    }
}

/// Map a logical datatype onto a physical type.
///
/// Without a dialect the generic mapping is returned, which is also the one
/// SQLite receives. `length` is only consulted for sized types, `precision`
/// only for timestamps.
///
/// # Example
///
/// ```rust
/// use schema_catalog_sdk::types::{physical_type, DataType, Dialect};
///
/// let t = physical_type(DataType::String, Some(30), None, Some(Dialect::Oracle));
/// assert_eq!(t.to_string(), "VARCHAR2(30)");
/// ```
pub fn physical_type(
    datatype: DataType,
    length: Option<u32>,
    precision: Option<u32>,
    dialect: Option<Dialect>,
) -> SqlType {
    use DataType as T;
    use Dialect as D;

    match (datatype, dialect) {
        (T::Boolean, Some(D::Oracle)) => SqlType::with_params("NUMBER", vec![1]),
        (T::Boolean, _) => SqlType::new("BOOLEAN"),

        (T::Byte, Some(D::Oracle)) => SqlType::with_params("NUMBER", vec![3]),
        (T::Byte, Some(D::PostgreSql)) => SqlType::new("SMALLINT"),
        (T::Byte, _) => SqlType::new("TINYINT"),

        (T::Short, Some(D::Oracle)) => SqlType::with_params("NUMBER", vec![5]),
        (T::Short, _) => SqlType::new("SMALLINT"),

        (T::Int, _) => SqlType::new("INTEGER"),

        (T::Long, Some(D::Oracle)) => SqlType::with_params("NUMBER", vec![38, 0]),
        (T::Long, _) => SqlType::new("BIGINT"),

        (T::Float, Some(D::Oracle)) => SqlType::new("BINARY_FLOAT"),
        (T::Float, _) => SqlType::new("FLOAT"),

        (T::Double, Some(D::Oracle)) => SqlType::new("BINARY_DOUBLE"),
        (T::Double, Some(D::PostgreSql)) => SqlType::new("DOUBLE PRECISION"),
        (T::Double, _) => SqlType::new("DOUBLE"),

        (T::Char, _) => SqlType::sized("CHAR", length),

        (T::String, Some(D::Oracle)) => SqlType::sized("VARCHAR2", length),
        (T::String, _) => SqlType::sized("VARCHAR", length),

        (T::Unicode, Some(D::Oracle)) => SqlType::sized("NVARCHAR2", length),
        (T::Unicode, Some(D::PostgreSql)) => SqlType::sized("VARCHAR", length),
        (T::Unicode, _) => SqlType::sized("NVARCHAR", length),

        (T::Text, Some(D::MySql)) => SqlType::new("LONGTEXT"),
        (T::Text, Some(D::Oracle)) => SqlType::new("CLOB"),
        (T::Text, _) => SqlType::new("TEXT"),

        (T::Binary, Some(D::MySql)) => SqlType::new("LONGBLOB"),
        (T::Binary, Some(D::PostgreSql)) => SqlType::new("BYTEA"),
        (T::Binary, _) => SqlType::new("BLOB"),

        (T::Timestamp, Some(D::PostgreSql)) => match precision {
            Some(p) => SqlType {
                name: "TIMESTAMP".to_string(),
                params: vec![p],
                suffix: Some("WITHOUT TIME ZONE".to_string()),
            },
            None => SqlType::new("TIMESTAMP"),
        },
        (T::Timestamp, Some(D::MySql)) => match precision {
            Some(p) => SqlType::with_params("DATETIME", vec![p]),
            None => SqlType::new("TIMESTAMP"),
        },
        (T::Timestamp, _) => SqlType::sized("TIMESTAMP", precision),
    }
}

/// The physical type of a column for every supported dialect
pub fn type_variants(
    datatype: DataType,
    length: Option<u32>,
    precision: Option<u32>,
) -> BTreeMap<Dialect, SqlType> {
    Dialect::ALL
        .iter()
        .map(|d| (*d, physical_type(datatype, length, precision, Some(*d))))
        .collect()
}

/// Parse a per-dialect datatype override such as `DATETIME(6)`.
///
/// The text must be a single data type accepted by the dialect's SQL parser.
pub fn parse_override(dialect: Dialect, text: &str) -> Result<SqlType, TypeError> {
    let parsed = parse_with_sqlparser(dialect, text)?;

    match RE_SQL_TYPE.captures(text) {
        Some(caps) => {
            let name = caps
                .get(1)
                .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_default()
                .to_uppercase();
            let params = caps
                .get(2)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .filter_map(|p| p.trim().parse::<u32>().ok())
                        .collect()
                })
                .unwrap_or_default();
            let suffix = caps.get(3).map(|m| m.as_str().to_uppercase());
            Ok(SqlType {
                name,
                params,
                suffix,
            })
        }
        None => Ok(SqlType::new(parsed)),
    }
}

/// Canonical spelling of a type string for a dialect, as printed back by the
/// SQL parser. Used to compare overrides against the default mapping.
pub fn normalized_sql_type(dialect: Dialect, text: &str) -> Option<String> {
    parse_with_sqlparser(dialect, text).ok()
}

fn parse_with_sqlparser(dialect: Dialect, text: &str) -> Result<String, TypeError> {
    let invalid = |message: String| TypeError::InvalidSqlType {
        dialect,
        text: text.to_string(),
        message,
    };

    let parser_dialect = dialect.parser_dialect();
    let mut parser = Parser::new(parser_dialect.as_ref())
        .try_with_sql(text)
        .map_err(|e| invalid(e.to_string()))?;
    let data_type = parser
        .parse_data_type()
        .map_err(|e| invalid(e.to_string()))?;
    let next = parser.peek_token();
    if next.token != Token::EOF {
        return Err(invalid(format!("unexpected trailing input '{}'", next.token)));
    }
    Ok(data_type.to_string().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_mapping_per_dialect() {
        let variants = type_variants(DataType::String, Some(30), None);
        assert_eq!(variants[&Dialect::MySql].to_string(), "VARCHAR(30)");
        assert_eq!(variants[&Dialect::Oracle].to_string(), "VARCHAR2(30)");
        assert_eq!(variants[&Dialect::PostgreSql].to_string(), "VARCHAR(30)");
        assert_eq!(variants[&Dialect::Sqlite].to_string(), "VARCHAR(30)");
    }

    #[test]
    fn test_generic_mapping_without_dialect() {
        assert_eq!(
            physical_type(DataType::Double, None, None, None).to_string(),
            "DOUBLE"
        );
        assert_eq!(
            physical_type(DataType::Unicode, Some(8), None, None).to_string(),
            "NVARCHAR(8)"
        );
    }

    #[test]
    fn test_timestamp_precision() {
        assert_eq!(
            physical_type(DataType::Timestamp, None, Some(6), Some(Dialect::PostgreSql))
                .to_string(),
            "TIMESTAMP(6) WITHOUT TIME ZONE"
        );
        assert_eq!(
            physical_type(DataType::Timestamp, None, Some(3), Some(Dialect::MySql)).to_string(),
            "DATETIME(3)"
        );
        assert_eq!(
            physical_type(DataType::Timestamp, None, None, Some(Dialect::MySql)).to_string(),
            "TIMESTAMP"
        );
    }

    #[test]
    fn test_oracle_numbers() {
        assert_eq!(
            physical_type(DataType::Long, None, None, Some(Dialect::Oracle)).to_string(),
            "NUMBER(38,0)"
        );
        assert_eq!(
            physical_type(DataType::Boolean, None, None, Some(Dialect::Oracle)).to_string(),
            "NUMBER(1)"
        );
    }

    #[test]
    fn test_parse_override_splits_params() {
        let parsed = parse_override(Dialect::MySql, "varchar(128)").unwrap();
        assert_eq!(parsed.name, "VARCHAR");
        assert_eq!(parsed.params, vec![128]);
        assert_eq!(parsed.to_string(), "VARCHAR(128)");
    }

    #[test]
    fn test_parse_override_rejects_garbage() {
        assert!(parse_override(Dialect::MySql, "VARCHAR(").is_err());
        assert!(parse_override(Dialect::PostgreSql, "").is_err());
        assert!(parse_override(Dialect::PostgreSql, "INT INT").is_err());
    }
}
