//! Constraints, indexes and column groups
//!
//! Column references held here are ids, resolved through the schema rather
//! than owned.

use super::extensions::ExtensionMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// When a deferrable constraint is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Initially {
    Immediate,
    Deferred,
}

impl Initially {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Initially::Immediate => "IMMEDIATE",
            Initially::Deferred => "DEFERRED",
        }
    }
}

impl std::str::FromStr for Initially {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IMMEDIATE" => Ok(Initially::Immediate),
            "DEFERRED" => Ok(Initially::Deferred),
            _ => Err(format!(
                "Invalid 'initially' value: {}. Use 'IMMEDIATE' or 'DEFERRED'.",
                s
            )),
        }
    }
}

impl fmt::Display for Initially {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `ON DELETE` / `ON UPDATE` action of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "NO ACTION")]
    NoAction,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl std::str::FromStr for ReferentialAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "CASCADE" => Ok(ReferentialAction::Cascade),
            "SET NULL" => Ok(ReferentialAction::SetNull),
            "SET DEFAULT" => Ok(ReferentialAction::SetDefault),
            "RESTRICT" => Ok(ReferentialAction::Restrict),
            "NO ACTION" => Ok(ReferentialAction::NoAction),
            _ => Err(format!("Invalid referential action: {}", s)),
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Variant-specific part of a constraint, discriminated by `@type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum ConstraintKind {
    ForeignKey {
        columns: Vec<String>,
        #[serde(rename = "referencedColumns")]
        referenced_columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_delete: Option<ReferentialAction>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_update: Option<ReferentialAction>,
    },
    Unique {
        columns: Vec<String>,
    },
    Check {
        expression: String,
    },
}

impl ConstraintKind {
    /// Tag used in documents
    pub fn type_name(&self) -> &'static str {
        match self {
            ConstraintKind::ForeignKey { .. } => "ForeignKey",
            ConstraintKind::Unique { .. } => "Unique",
            ConstraintKind::Check { .. } => "Check",
        }
    }

    /// Local columns the constraint applies to (empty for checks)
    pub fn columns(&self) -> &[String] {
        match self {
            ConstraintKind::ForeignKey { columns, .. } | ConstraintKind::Unique { columns } => {
                columns
            }
            ConstraintKind::Check { .. } => &[],
        }
    }
}

/// Table constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deferrable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initially: Option<Initially>,
    #[serde(rename = "votable:utype", default, skip_serializing_if = "Option::is_none")]
    pub votable_utype: Option<String>,
    #[serde(flatten)]
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::ForeignKey { .. })
    }
}

/// What an index covers: column ids or opaque SQL expressions, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexTarget {
    #[serde(rename = "columns")]
    Columns(Vec<String>),
    #[serde(rename = "expressions")]
    Expressions(Vec<String>),
}

/// Table index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub target: IndexTarget,
}

impl Index {
    pub fn columns(&self) -> &[String] {
        match &self.target {
            IndexTarget::Columns(columns) => columns,
            IndexTarget::Expressions(_) => &[],
        }
    }
}

/// Named group of columns within one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroup {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<String>,
    #[serde(rename = "ivoa:ucd", default, skip_serializing_if = "Option::is_none")]
    pub ivoa_ucd: Option<String>,
    #[serde(rename = "votable:utype", default, skip_serializing_if = "Option::is_none")]
    pub votable_utype: Option<String>,
    #[serde(flatten)]
    pub extensions: ExtensionMap,
}
