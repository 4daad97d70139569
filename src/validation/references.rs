//! Resolution of weak references through the id index

use super::error::{ErrorKind, IssueLog};
use super::index::{IdIndex, IndexError, ObjectKind};
use super::path::FieldPath;
use crate::models::{ConstraintKind, Schema, Table};
use std::collections::HashSet;

pub(crate) fn report_index_error(log: &mut IssueLog, error: IndexError, path: FieldPath) {
    let kind = match error {
        IndexError::DuplicateId { .. } => ErrorKind::DuplicateId,
        IndexError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
        IndexError::KindMismatch { .. } => ErrorKind::KindMismatch,
    };
    log.report(kind, path, error.to_string());
}

struct Resolver<'a> {
    index: &'a IdIndex,
    poisoned: &'a HashSet<String>,
}

impl Resolver<'_> {
    /// Resolve a column id; returns the owning table id when it resolved
    fn column(&self, id: &str, referrer: FieldPath, log: &mut IssueLog) -> Option<String> {
        if self.poisoned.contains(id) {
            return None;
        }
        match self.index.resolve(id, ObjectKind::Column, &referrer) {
            Ok(entry) => entry.table.clone(),
            Err(e) => {
                report_index_error(log, e, referrer);
                None
            }
        }
    }

    /// Resolve a column id that must belong to `table`
    fn local_column(&self, id: &str, table: &Table, referrer: FieldPath, log: &mut IssueLog) {
        if let Some(owner) = self.column(id, referrer.clone(), log)
            && owner != table.id
        {
            log.report(
                ErrorKind::UnresolvedReference,
                referrer,
                format!(
                    "Column '{}' belongs to table '{}', not to '{}'",
                    id, owner, table.id
                ),
            );
        }
    }

    fn local_columns(&self, ids: &[String], table: &Table, path: &FieldPath, log: &mut IssueLog) {
        for (i, id) in ids.iter().enumerate() {
            self.local_column(id, table, path.index(i), log);
        }
    }
}

/// Resolve primary keys, constraint, index and column-group columns.
///
/// Foreign-key targets may live in any table, but all referenced columns
/// of one constraint must share a table.
pub(crate) fn resolve_references(
    schema: &Schema,
    index: &IdIndex,
    table_paths: &[FieldPath],
    poisoned: &HashSet<String>,
    log: &mut IssueLog,
) {
    let resolver = Resolver { index, poisoned };

    for (table, path) in schema.tables.iter().zip(table_paths) {
        resolver.local_columns(&table.primary_key, table, &path.key("primaryKey"), log);

        for (i, constraint) in table.constraints.iter().enumerate() {
            let constraint_path =
                object_path(index, &constraint.id, || path.item("constraints", i));
            resolver.local_columns(
                constraint.kind.columns(),
                table,
                &constraint_path.key("columns"),
                log,
            );
            if let ConstraintKind::ForeignKey {
                referenced_columns, ..
            } = &constraint.kind
            {
                let referenced_path = constraint_path.key("referencedColumns");
                let owners: Vec<Option<String>> = referenced_columns
                    .iter()
                    .enumerate()
                    .map(|(k, id)| resolver.column(id, referenced_path.index(k), log))
                    .collect();
                let targets: HashSet<&String> = owners.iter().flatten().collect();
                if targets.len() > 1 {
                    log.report(
                        ErrorKind::ConstraintShape,
                        constraint_path.clone(),
                        format!(
                            "Foreign key '{}' references columns of more than one table",
                            constraint.name
                        ),
                    );
                }
            }
        }

        for (i, idx) in table.indexes.iter().enumerate() {
            let index_path = object_path(index, &idx.id, || path.item("indexes", i));
            resolver.local_columns(idx.columns(), table, &index_path.key("columns"), log);
        }

        for (i, group) in table.column_groups.iter().enumerate() {
            let group_path = object_path(index, &group.id, || path.item("columnGroups", i));
            resolver.local_columns(&group.columns, table, &group_path.key("columns"), log);
        }
    }
}

/// Declared location of an object, falling back to its position in the model
pub(crate) fn object_path(
    index: &IdIndex,
    id: &str,
    fallback: impl FnOnce() -> FieldPath,
) -> FieldPath {
    index
        .get(id)
        .map(|entry| entry.path.clone())
        .unwrap_or_else(fallback)
}
