//! Identifier resolution index
//!
//! Every declared id is registered in one pass before any reference is
//! resolved, so references may point forward in the document.

use super::path::FieldPath;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Kind of object an id was declared on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    Schema,
    Table,
    Column,
    /// Column imported through `columnRefs` and kept as a reference
    ColumnReference,
    ColumnGroup,
    Constraint,
    Index,
}

impl ObjectKind {
    /// Whether an object of this kind may stand where `expected` is required
    pub fn satisfies(&self, expected: ObjectKind) -> bool {
        *self == expected
            || (expected == ObjectKind::Column && *self == ObjectKind::ColumnReference)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Schema => "schema",
            ObjectKind::Table => "table",
            ObjectKind::Column => "column",
            ObjectKind::ColumnReference => "column reference",
            ObjectKind::ColumnGroup => "column group",
            ObjectKind::Constraint => "constraint",
            ObjectKind::Index => "index",
        };
        f.write_str(name)
    }
}

/// What the index knows about a declared id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub kind: ObjectKind,
    /// Where the object is declared
    pub path: FieldPath,
    /// Id of the enclosing table, for objects that live inside one
    pub table: Option<String>,
}

impl IndexEntry {
    pub fn new(kind: ObjectKind, path: FieldPath) -> Self {
        Self {
            kind,
            path,
            table: None,
        }
    }

    pub fn in_table(mut self, table_id: &str) -> Self {
        self.table = Some(table_id.to_string());
        self
    }
}

/// Error raised by the index
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("Duplicate id '{id}': declared at {first} and again at {second}")]
    DuplicateId {
        id: String,
        first: FieldPath,
        second: FieldPath,
    },
    #[error("Unresolved reference '{id}' from {referrer}")]
    UnresolvedReference { id: String, referrer: FieldPath },
    #[error("'{id}' is a {found} but a {expected} is expected (referenced from {referrer})")]
    KindMismatch {
        id: String,
        expected: ObjectKind,
        found: ObjectKind,
        referrer: FieldPath,
    },
}

/// Flat id → declaration table for one document
#[derive(Debug, Default)]
pub struct IdIndex {
    entries: HashMap<String, IndexEntry>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration.
    ///
    /// # Returns
    ///
    /// `DuplicateId` naming both locations if the id is already taken; the
    /// first declaration stays registered.
    pub fn register(&mut self, id: &str, entry: IndexEntry) -> Result<(), IndexError> {
        if let Some(existing) = self.entries.get(id) {
            return Err(IndexError::DuplicateId {
                id: id.to_string(),
                first: existing.path.clone(),
                second: entry.path,
            });
        }
        self.entries.insert(id.to_string(), entry);
        Ok(())
    }

    /// Resolve a reference to an object of the expected kind
    ///
    /// # Example
    ///
    /// ```rust
    /// use schema_catalog_sdk::validation::index::{IdIndex, IndexEntry, ObjectKind};
    /// use schema_catalog_sdk::validation::FieldPath;
    ///
    /// let mut index = IdIndex::new();
    /// let at = FieldPath::root().item("tables", 0);
    /// index.register("#t", IndexEntry::new(ObjectKind::Table, at.clone())).unwrap();
    ///
    /// assert!(index.resolve("#t", ObjectKind::Table, &at).is_ok());
    /// assert!(index.resolve("#t", ObjectKind::Column, &at).is_err());
    /// ```
    pub fn resolve(
        &self,
        id: &str,
        expected: ObjectKind,
        referrer: &FieldPath,
    ) -> Result<&IndexEntry, IndexError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| IndexError::UnresolvedReference {
                id: id.to_string(),
                referrer: referrer.clone(),
            })?;
        if !entry.kind.satisfies(expected) {
            return Err(IndexError::KindMismatch {
                id: id.to_string(),
                expected,
                found: entry.kind,
                referrer: referrer.clone(),
            });
        }
        Ok(entry)
    }

    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
