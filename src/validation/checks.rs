//! Cross-object invariants and the opt-in advisory checks

use super::error::{ErrorKind, IssueLog};
use super::index::IdIndex;
use super::options::{MIN_DESCRIPTION_LENGTH, ValidationOptions};
use super::path::FieldPath;
use super::references::object_path;
use crate::models::{Column, ConstraintKind, Schema};
use crate::types::{normalized_sql_type, parse_override, physical_type};
use std::collections::{HashMap, HashSet};

/// Tracks first use of a name so a collision can cite both locations
struct NameRegistry<'a> {
    what: &'a str,
    seen: HashMap<String, FieldPath>,
}

impl<'a> NameRegistry<'a> {
    fn new(what: &'a str) -> Self {
        Self {
            what,
            seen: HashMap::new(),
        }
    }

    fn claim(&mut self, name: &str, path: FieldPath, log: &mut IssueLog) {
        match self.seen.get(name) {
            Some(first) => log.report(
                ErrorKind::NameUniqueness,
                path.clone(),
                format!(
                    "{} name '{}' at {} is already used at {}",
                    self.what, name, path, first
                ),
            ),
            None => {
                self.seen.insert(name.to_string(), path);
            }
        }
    }
}

pub(crate) fn check_invariants(
    schema: &Schema,
    index: &IdIndex,
    table_paths: &[FieldPath],
    log: &mut IssueLog,
) {
    let mut table_names = NameRegistry::new("Table");
    let mut constraint_names = NameRegistry::new("Constraint");
    let mut index_names = NameRegistry::new("Index");

    for (table, path) in schema.tables.iter().zip(table_paths) {
        table_names.claim(&table.name, path.clone(), log);

        let mut column_names = NameRegistry::new("Column");
        for (i, column) in table.all_columns().enumerate() {
            let column_path = object_path(index, &column.id, || path.item("columns", i));
            column_names.claim(&column.name, column_path.clone(), log);
            check_column(column, &column_path, log);
        }

        for id in &table.primary_key {
            if let Some(column) = table.column(id)
                && column.nullable
            {
                log.report(
                    ErrorKind::NullablePrimaryKey,
                    path.key("primaryKey"),
                    format!(
                        "Primary key column '{}' of table '{}' must be declared nullable: false",
                        id, table.name
                    ),
                );
            }
        }

        for (i, constraint) in table.constraints.iter().enumerate() {
            let constraint_path =
                object_path(index, &constraint.id, || path.item("constraints", i));
            constraint_names.claim(&constraint.name, constraint_path.clone(), log);

            if constraint.initially.is_some() && !constraint.deferrable {
                log.report(
                    ErrorKind::ConstraintShape,
                    constraint_path.clone(),
                    format!(
                        "Constraint '{}' sets 'initially' but is not deferrable",
                        constraint.name
                    ),
                );
            }
            match &constraint.kind {
                ConstraintKind::ForeignKey {
                    columns,
                    referenced_columns,
                    ..
                } => {
                    if columns.is_empty() {
                        log.report(
                            ErrorKind::ConstraintShape,
                            constraint_path.clone(),
                            format!("Foreign key '{}' lists no columns", constraint.name),
                        );
                    } else if columns.len() != referenced_columns.len() {
                        log.report(
                            ErrorKind::ConstraintShape,
                            constraint_path.clone(),
                            format!(
                                "Foreign key '{}' has {} column(s) but {} referenced column(s)",
                                constraint.name,
                                columns.len(),
                                referenced_columns.len()
                            ),
                        );
                    }
                }
                ConstraintKind::Unique { columns } if columns.is_empty() => log.report(
                    ErrorKind::ConstraintShape,
                    constraint_path.clone(),
                    format!("Unique constraint '{}' lists no columns", constraint.name),
                ),
                ConstraintKind::Check { expression } if expression.trim().is_empty() => log
                    .report(
                        ErrorKind::ConstraintShape,
                        constraint_path.clone(),
                        format!("Check constraint '{}' has an empty expression", constraint.name),
                    ),
                _ => {}
            }
        }

        for (i, idx) in table.indexes.iter().enumerate() {
            let index_path = object_path(index, &idx.id, || path.item("indexes", i));
            index_names.claim(&idx.name, index_path, log);
        }

        for (i, group) in table.column_groups.iter().enumerate() {
            let mut seen = HashSet::new();
            if let Some(repeated) = group.columns.iter().find(|c| !seen.insert(c.as_str())) {
                let group_path = object_path(index, &group.id, || path.item("columnGroups", i));
                log.report(
                    ErrorKind::ConstraintShape,
                    group_path.key("columns"),
                    format!(
                        "Column group '{}' lists '{}' more than once",
                        group.name, repeated
                    ),
                );
            }
        }
    }
}

fn check_column(column: &Column, path: &FieldPath, log: &mut IssueLog) {
    match (column.datatype.requires_length(), column.length) {
        (true, None) => log.report(
            ErrorKind::InvalidLength,
            path.clone(),
            format!(
                "Column '{}' of datatype '{}' requires a length",
                column.id, column.datatype
            ),
        ),
        (true, Some(0)) => log.report(
            ErrorKind::InvalidLength,
            path.key("length"),
            format!("Column '{}' must have a positive length", column.id),
        ),
        (false, Some(_)) => log.report(
            ErrorKind::InvalidLength,
            path.key("length"),
            format!(
                "Column '{}' of datatype '{}' does not accept a length",
                column.id, column.datatype
            ),
        ),
        _ => {}
    }

    if column.precision.is_some() && column.datatype != crate::types::DataType::Timestamp {
        log.report(
            ErrorKind::InvalidValue,
            path.key("precision"),
            format!(
                "Column '{}': precision is only allowed for timestamp columns",
                column.id
            ),
        );
    }

    if let Some(value) = &column.value {
        if column.autoincrement == Some(true) {
            log.report(
                ErrorKind::InvalidValue,
                path.key("value"),
                format!(
                    "Column '{}' cannot have both a default value and autoincrement",
                    column.id
                ),
            );
        } else if !value.fits(column.datatype) {
            log.report(
                ErrorKind::InvalidValue,
                path.key("value"),
                format!(
                    "Default value of column '{}' does not match datatype '{}'",
                    column.id, column.datatype
                ),
            );
        }
    }

    if column.ivoa_unit.is_some() && column.fits_tunit.is_some() {
        log.report(
            ErrorKind::InvalidValue,
            path.clone(),
            format!(
                "Column '{}' declares both 'ivoa:unit' and 'fits:tunit'",
                column.id
            ),
        );
    }

    for (key, flag) in [("tap:principal", column.tap_principal), ("tap:std", column.tap_std)] {
        if let Some(flag) = flag
            && !matches!(flag, 0 | 1)
        {
            log.report(
                ErrorKind::InvalidValue,
                path.key(key),
                format!("Column '{}': '{}' must be 0 or 1, found {}", column.id, key, flag),
            );
        }
    }

    for (dialect, text) in column.datatype_overrides() {
        if let Err(e) = parse_override(dialect, text) {
            log.report(
                ErrorKind::InvalidType,
                path.key(dialect.datatype_key()),
                e.to_string(),
            );
        }
    }
}

pub(crate) fn run_optional_checks(
    schema: &Schema,
    index: &IdIndex,
    table_paths: &[FieldPath],
    options: &ValidationOptions,
    log: &mut IssueLog,
) {
    if options.check_description {
        check_descriptions(schema, index, table_paths, log);
    }
    if options.check_redundant_datatypes {
        check_redundant_datatypes(schema, index, log);
    }
    if options.check_tap_table_indexes {
        let mut seen: HashMap<i64, &str> = HashMap::new();
        for (table, path) in schema.tables.iter().zip(table_paths) {
            match table.tap_table_index {
                None => log.report(
                    ErrorKind::CheckFailed,
                    path.clone(),
                    format!("Table '{}' is missing 'tap:table_index'", table.name),
                ),
                Some(value) => {
                    if let Some(other) = seen.insert(value, table.name.as_str()) {
                        log.report(
                            ErrorKind::CheckFailed,
                            path.key("tap:table_index"),
                            format!(
                                "Table '{}' reuses tap:table_index {} of table '{}'",
                                table.name, value, other
                            ),
                        );
                    }
                }
            }
        }
    }
    if options.check_tap_principal {
        for (table, path) in schema.tables.iter().zip(table_paths) {
            if !table.all_columns().any(|c| c.tap_principal == Some(1)) {
                log.report(
                    ErrorKind::CheckFailed,
                    path.clone(),
                    format!("Table '{}' has no column flagged tap:principal", table.name),
                );
            }
        }
    }
}

fn check_description(
    what: &str,
    id: &str,
    description: Option<&str>,
    path: FieldPath,
    log: &mut IssueLog,
) {
    let length = description.map(|d| d.trim().chars().count()).unwrap_or(0);
    if length < MIN_DESCRIPTION_LENGTH {
        log.report(
            ErrorKind::CheckFailed,
            path,
            format!(
                "{} '{}' needs a description of at least {} characters",
                what, id, MIN_DESCRIPTION_LENGTH
            ),
        );
    }
}

fn check_descriptions(
    schema: &Schema,
    index: &IdIndex,
    table_paths: &[FieldPath],
    log: &mut IssueLog,
) {
    check_description(
        "Schema",
        &schema.id,
        schema.description.as_deref(),
        FieldPath::root().key("description"),
        log,
    );
    for (table, path) in schema.tables.iter().zip(table_paths) {
        check_description(
            "Table",
            &table.id,
            table.description.as_deref(),
            path.key("description"),
            log,
        );
        for column in table.all_columns() {
            let at = object_path(index, &column.id, || path.clone());
            check_description(
                "Column",
                &column.id,
                column.description.as_deref(),
                at.key("description"),
                log,
            );
        }
        for constraint in &table.constraints {
            let at = object_path(index, &constraint.id, || path.clone());
            check_description(
                "Constraint",
                &constraint.id,
                constraint.description.as_deref(),
                at.key("description"),
                log,
            );
        }
        for idx in &table.indexes {
            let at = object_path(index, &idx.id, || path.clone());
            check_description(
                "Index",
                &idx.id,
                idx.description.as_deref(),
                at.key("description"),
                log,
            );
        }
        for group in &table.column_groups {
            let at = object_path(index, &group.id, || path.clone());
            check_description(
                "Column group",
                &group.id,
                group.description.as_deref(),
                at.key("description"),
                log,
            );
        }
    }
}

fn squash(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn check_redundant_datatypes(schema: &Schema, index: &IdIndex, log: &mut IssueLog) {
    for column in schema.tables.iter().flat_map(|t| t.all_columns()) {
        for (dialect, text) in column.datatype_overrides() {
            let default = physical_type(
                column.datatype,
                column.length,
                column.precision,
                Some(dialect),
            )
            .to_string();
            let redundant = match (
                normalized_sql_type(dialect, text),
                normalized_sql_type(dialect, &default),
            ) {
                (Some(a), Some(b)) => a == b,
                _ => squash(text) == squash(&default),
            };
            if redundant {
                let at = object_path(index, &column.id, FieldPath::root);
                log.report(
                    ErrorKind::CheckFailed,
                    at.key(dialect.datatype_key()),
                    format!(
                        "'{}' override '{}' of column '{}' repeats the default mapping",
                        dialect.datatype_key(),
                        text,
                        column.id
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validation::{ErrorKind, SchemaValidator, ValidationOptions};
    use serde_json::{Value, json};

    fn document(tables: Value) -> Value {
        json!({"name": "s", "@id": "#s", "tables": tables})
    }

    fn issues_with(options: ValidationOptions, tables: Value) -> Vec<(ErrorKind, String)> {
        let error = SchemaValidator::new(options)
            .validate(&document(tables))
            .unwrap_err();
        error
            .issues
            .iter()
            .map(|i| (i.kind, i.path.to_string()))
            .collect()
    }

    fn issues(tables: Value) -> Vec<(ErrorKind, String)> {
        issues_with(ValidationOptions::default(), tables)
    }

    fn has(found: &[(ErrorKind, String)], kind: ErrorKind, path: &str) -> bool {
        found.iter().any(|(k, p)| *k == kind && p == path)
    }

    fn int_column(table: &str, name: &str) -> Value {
        json!({"name": name, "@id": format!("#{}.{}", table, name), "datatype": "int"})
    }

    #[test]
    fn test_duplicate_table_and_column_names() {
        let found = issues(json!([
            {"name": "t", "@id": "#t1", "columns": [int_column("t1", "c"), {
                "name": "c", "@id": "#t1.c2", "datatype": "long"
            }]},
            {"name": "t", "@id": "#t2", "columns": [int_column("t2", "c")]}
        ]));
        assert!(has(&found, ErrorKind::NameUniqueness, "tables[0].columns[1]"));
        assert!(has(&found, ErrorKind::NameUniqueness, "tables[1]"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_duplicate_index_names() {
        let found = issues(json!([
            {"name": "a", "@id": "#a", "columns": [int_column("a", "x")],
             "indexes": [{"name": "idx", "@id": "#idx_a", "columns": ["#a.x"]}]},
            {"name": "b", "@id": "#b", "columns": [int_column("b", "y")],
             "indexes": [{"name": "idx", "@id": "#idx_b", "columns": ["#b.y"]}]}
        ]));
        assert_eq!(
            found,
            vec![(ErrorKind::NameUniqueness, "tables[1].indexes[0]".to_string())]
        );
    }

    #[test]
    fn test_length_rules() {
        let found = issues(json!([{"name": "t", "@id": "#t", "columns": [
            {"name": "a", "@id": "#t.a", "datatype": "int", "length": 4},
            {"name": "b", "@id": "#t.b", "datatype": "string", "length": 0},
            {"name": "c", "@id": "#t.c", "datatype": "char"}
        ]}]));
        assert!(has(&found, ErrorKind::InvalidLength, "tables[0].columns[0].length"));
        assert!(has(&found, ErrorKind::InvalidLength, "tables[0].columns[1].length"));
        assert!(has(&found, ErrorKind::InvalidLength, "tables[0].columns[2]"));
    }

    #[test]
    fn test_precision_only_on_timestamps() {
        let found = issues(json!([{"name": "t", "@id": "#t", "columns": [
            {"name": "a", "@id": "#t.a", "datatype": "double", "precision": 3},
            {"name": "b", "@id": "#t.b", "datatype": "timestamp", "precision": 3}
        ]}]));
        assert_eq!(
            found,
            vec![(ErrorKind::InvalidValue, "tables[0].columns[0].precision".to_string())]
        );
    }

    #[test]
    fn test_default_value_rules() {
        let error = SchemaValidator::default()
            .validate(&document(json!([{"name": "t", "@id": "#t", "columns": [
                {"name": "a", "@id": "#t.a", "datatype": "int",
                 "autoincrement": true, "value": 1},
                {"name": "b", "@id": "#t.b", "datatype": "int", "value": "abc"}
            ]}])))
            .unwrap_err();
        let found: Vec<_> = error.of_kind(ErrorKind::InvalidValue).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path.to_string(), "tables[0].columns[0].value");
        assert!(found[0].message.contains("autoincrement"));
        assert_eq!(found[1].path.to_string(), "tables[0].columns[1].value");
        assert!(found[1].message.contains("does not match datatype 'int'"));
    }

    #[test]
    fn test_units_are_exclusive() {
        let found = issues(json!([{"name": "t", "@id": "#t", "columns": [
            {"name": "a", "@id": "#t.a", "datatype": "double",
             "ivoa:unit": "deg", "fits:tunit": "deg"}
        ]}]));
        assert_eq!(
            found,
            vec![(ErrorKind::InvalidValue, "tables[0].columns[0]".to_string())]
        );
    }

    #[test]
    fn test_tap_flags_are_zero_or_one() {
        let found = issues(json!([{"name": "t", "@id": "#t", "columns": [
            {"name": "a", "@id": "#t.a", "datatype": "int", "tap:principal": 2, "tap:std": 3},
            {"name": "b", "@id": "#t.b", "datatype": "int", "tap:principal": true, "tap:std": 0}
        ]}]));
        assert_eq!(
            found,
            vec![
                (ErrorKind::InvalidValue, "tables[0].columns[0].tap:principal".to_string()),
                (ErrorKind::InvalidValue, "tables[0].columns[0].tap:std".to_string()),
            ]
        );
    }

    #[test]
    fn test_initially_requires_deferrable() {
        let found = issues(json!([{"name": "t", "@id": "#t",
            "columns": [int_column("t", "a")],
            "constraints": [{"name": "uq_a", "@id": "#uq_a", "@type": "Unique",
                             "columns": ["#t.a"], "initially": "DEFERRED"}]
        }]));
        assert_eq!(
            found,
            vec![(ErrorKind::ConstraintShape, "tables[0].constraints[0]".to_string())]
        );
    }

    #[test]
    fn test_repeated_column_group_member() {
        let found = issues(json!([{"name": "t", "@id": "#t",
            "columns": [int_column("t", "a"), int_column("t", "b")],
            "columnGroups": [{"name": "g", "@id": "#g", "columns": ["#t.a", "#t.b", "#t.a"]}]
        }]));
        assert_eq!(
            found,
            vec![(ErrorKind::ConstraintShape, "tables[0].columnGroups[0].columns".to_string())]
        );
    }

    #[test]
    fn test_foreign_key_targets_one_table() {
        let found = issues(json!([
            {"name": "a", "@id": "#a", "columns": [int_column("a", "x")]},
            {"name": "b", "@id": "#b", "columns": [int_column("b", "y")]},
            {"name": "c", "@id": "#c",
             "columns": [int_column("c", "p"), int_column("c", "q")],
             "constraints": [{"name": "fk_c", "@id": "#fk_c", "@type": "ForeignKey",
                              "columns": ["#c.p", "#c.q"],
                              "referencedColumns": ["#a.x", "#b.y"]}]}
        ]));
        assert_eq!(
            found,
            vec![(ErrorKind::ConstraintShape, "tables[2].constraints[0]".to_string())]
        );
    }

    #[test]
    fn test_redundant_datatype_override() {
        let tables = json!([{"name": "t", "@id": "#t", "columns": [
            {"name": "a", "@id": "#t.a", "datatype": "string", "length": 30,
             "mysql:datatype": "varchar(30)"},
            {"name": "b", "@id": "#t.b", "datatype": "string", "length": 30,
             "mysql:datatype": "VARCHAR(64)"}
        ]}]);
        assert!(SchemaValidator::default().validate(&document(tables.clone())).is_ok());

        let options = ValidationOptions {
            check_redundant_datatypes: true,
            ..ValidationOptions::default()
        };
        assert_eq!(
            issues_with(options, tables),
            vec![(ErrorKind::CheckFailed, "tables[0].columns[0].mysql:datatype".to_string())]
        );
    }

    #[test]
    fn test_tap_table_indexes() {
        let options = ValidationOptions {
            check_tap_table_indexes: true,
            ..ValidationOptions::default()
        };
        let found = issues_with(
            options,
            json!([
                {"name": "a", "@id": "#a", "tap:table_index": 1, "columns": [int_column("a", "x")]},
                {"name": "b", "@id": "#b", "tap:table_index": 1, "columns": [int_column("b", "y")]},
                {"name": "c", "@id": "#c", "columns": [int_column("c", "z")]}
            ]),
        );
        assert_eq!(
            found,
            vec![
                (ErrorKind::CheckFailed, "tables[1].tap:table_index".to_string()),
                (ErrorKind::CheckFailed, "tables[2]".to_string()),
            ]
        );
    }
}
