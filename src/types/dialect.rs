//! SQL dialects supported for DDL generation

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use std::fmt;

/// Target SQL product.
///
/// The lowercase name doubles as the document namespace for per-dialect
/// overrides (`mysql:datatype`, `postgresql:datatype`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgresql")]
    PostgreSql,
    Sqlite,
    Oracle,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::MySql,
        Dialect::PostgreSql,
        Dialect::Sqlite,
        Dialect::Oracle,
    ];

    /// Namespace prefix used in documents for this dialect
    pub fn prefix(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::PostgreSql => "postgresql",
            Dialect::Sqlite => "sqlite",
            Dialect::Oracle => "oracle",
        }
    }

    /// Document key carrying a datatype override for this dialect
    pub fn datatype_key(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql:datatype",
            Dialect::PostgreSql => "postgresql:datatype",
            Dialect::Sqlite => "sqlite:datatype",
            Dialect::Oracle => "oracle:datatype",
        }
    }

    /// Pick the dialect out of a connection URL such as
    /// `postgresql+psycopg2://host/db` or `sqlite:///catalog.db`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use schema_catalog_sdk::types::Dialect;
    ///
    /// assert_eq!(Dialect::from_url("mysql://localhost/db").unwrap(), Dialect::MySql);
    /// assert_eq!(Dialect::from_url("sqlite://").unwrap(), Dialect::Sqlite);
    /// ```
    pub fn from_url(url: &str) -> Result<Self, String> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| format!("Not a connection URL: {}", url))?;
        let driver = scheme.split('+').next().unwrap_or(scheme);
        driver.parse()
    }

    /// The `sqlparser` dialect used to read override strings
    pub(crate) fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        match self {
            Dialect::MySql => Box::new(MySqlDialect {}),
            Dialect::PostgreSql => Box::new(PostgreSqlDialect {}),
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
            Dialect::Oracle => Box::new(GenericDialect {}),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgresql" | "postgres" => Ok(Dialect::PostgreSql),
            "sqlite" => Ok(Dialect::Sqlite),
            "oracle" => Ok(Dialect::Oracle),
            _ => Err(format!(
                "Unknown dialect: {}. Use 'mysql', 'postgresql', 'sqlite' or 'oracle'.",
                s
            )),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
