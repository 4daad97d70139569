//! Schema → TAP_SCHEMA records

use super::records::{
    ColumnRecord, KeyColumnRecord, KeyRecord, SchemaRecord, TableRecord, TapSchemaRecords,
};
use crate::metadata::MetadataError;
use crate::models::{Column, ConstraintKind, Schema, Table};
use tracing::{debug, info};

/// Hands out indexes for objects without an explicit one.
///
/// Scoped to a single translation; starts after the largest explicit index
/// so generated values never collide with declared ones.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    next: i64,
}

impl SequenceGenerator {
    pub fn new(start: i64) -> Self {
        Self { next: start }
    }

    /// Start after the largest of `used`, or at 1 when there is none
    pub fn after(used: impl IntoIterator<Item = i64>) -> Self {
        let start = used.into_iter().max().map_or(1, |max| max.saturating_add(1).max(1));
        Self::new(start)
    }

    pub fn next_value(&mut self) -> i64 {
        let value = self.next;
        self.next += 1;
        value
    }
}

/// Translates a validated schema into the five TAP_SCHEMA record sets.
///
/// # Example
///
/// ```rust
/// use schema_catalog_sdk::tap_schema::TapSchemaTranslator;
/// use schema_catalog_sdk::validation::SchemaValidator;
///
/// let schema = SchemaValidator::default()
///     .validate_str(
///         r##"
/// name: sales
/// "@id": "#sales"
/// tables:
///   - name: customers
///     "@id": "#customers"
///     columns:
///       - name: name
///         "@id": "#customers.name"
///         datatype: string
///         length: 30
/// "##,
///     )
///     .unwrap();
///
/// let records = TapSchemaTranslator::new(&schema).translate().unwrap();
/// assert_eq!(records.tables[0].table_name, "sales.customers");
/// assert_eq!(records.columns[0].datatype, "char");
/// assert_eq!(records.columns[0].arraysize.as_deref(), Some("30*"));
/// ```
#[derive(Debug, Clone)]
pub struct TapSchemaTranslator<'a> {
    schema: &'a Schema,
    schema_index: Option<i64>,
    qualify_table_names: bool,
}

impl<'a> TapSchemaTranslator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            schema_index: None,
            qualify_table_names: true,
        }
    }

    /// Value for `schemas.schema_index`; defaults to the schema's
    /// `tap:schema_index` annotation
    pub fn schema_index(mut self, index: i64) -> Self {
        self.schema_index = Some(index);
        self
    }

    /// Write `schema.table` into table names (the default) or bare names
    pub fn qualify_table_names(mut self, qualify: bool) -> Self {
        self.qualify_table_names = qualify;
        self
    }

    fn table_name(&self, table: &Table) -> String {
        if self.qualify_table_names {
            format!("{}.{}", self.schema.name, table.name)
        } else {
            table.name.clone()
        }
    }

    pub fn translate(&self) -> Result<TapSchemaRecords, MetadataError> {
        let mut records = TapSchemaRecords::default();

        records.schemas.push(SchemaRecord {
            schema_name: self.schema.name.clone(),
            utype: self.schema.votable_utype.clone(),
            description: self.schema.description.clone(),
            schema_index: self.schema_index.or(self.schema.tap_schema_index),
        });

        let mut table_indexes =
            SequenceGenerator::after(self.schema.tables.iter().filter_map(|t| t.tap_table_index));

        for table in &self.schema.tables {
            let table_name = self.table_name(table);
            records.tables.push(TableRecord {
                schema_name: self.schema.name.clone(),
                table_name: table_name.clone(),
                table_type: "table".to_string(),
                utype: table.votable_utype.clone(),
                description: table.description.clone(),
                table_index: table
                    .tap_table_index
                    .unwrap_or_else(|| table_indexes.next_value()),
            });

            let mut column_indexes =
                SequenceGenerator::after(table.all_columns().filter_map(|c| c.tap_column_index));
            for column in table.all_columns() {
                records.columns.push(ColumnRecord {
                    table_name: table_name.clone(),
                    column_name: column.name.clone(),
                    datatype: column
                        .votable_datatype
                        .clone()
                        .unwrap_or_else(|| column.datatype.votable_name().to_string()),
                    arraysize: column.votable_arraysize.clone(),
                    size: column.votable_arraysize.as_deref().and_then(arraysize_size),
                    xtype: column.votable_xtype.clone(),
                    description: column.description.clone(),
                    utype: column.votable_utype.clone(),
                    unit: column.unit().map(str::to_string),
                    ucd: column.ivoa_ucd.clone(),
                    indexed: i64::from(is_indexed(column, table)),
                    principal: column.tap_principal.unwrap_or(0),
                    std: column.tap_std.unwrap_or(0),
                    column_index: column
                        .tap_column_index
                        .unwrap_or_else(|| column_indexes.next_value()),
                });
            }
            debug!(table = %table_name, "Translated table to TAP_SCHEMA records");
        }

        self.translate_keys(&mut records)?;

        info!(
            schema = %self.schema.name,
            tables = records.tables.len(),
            columns = records.columns.len(),
            keys = records.keys.len(),
            "Translated schema to TAP_SCHEMA records"
        );
        Ok(records)
    }

    fn translate_keys(&self, records: &mut TapSchemaRecords) -> Result<(), MetadataError> {
        for (table, constraint) in self.schema.foreign_keys() {
            let ConstraintKind::ForeignKey {
                columns,
                referenced_columns,
                ..
            } = &constraint.kind
            else {
                continue;
            };

            let target = referenced_columns
                .first()
                .and_then(|id| self.schema.table_of_column(id))
                .ok_or_else(|| {
                    MetadataError::InvariantViolation(format!(
                        "foreign key '{}' has no resolvable target table",
                        constraint.name
                    ))
                })?;

            records.keys.push(KeyRecord {
                key_id: constraint.name.clone(),
                from_table: self.table_name(table),
                target_table: self.table_name(target),
                utype: constraint.votable_utype.clone(),
                description: constraint.description.clone(),
            });

            for (from, to) in columns.iter().zip(referenced_columns) {
                records.key_columns.push(KeyColumnRecord {
                    key_id: constraint.name.clone(),
                    from_column: column_name(table, from)?,
                    target_column: column_name(target, to)?,
                });
            }
        }
        Ok(())
    }
}

/// Translate with default options
pub fn translate(schema: &Schema) -> Result<TapSchemaRecords, MetadataError> {
    TapSchemaTranslator::new(schema).translate()
}

fn column_name(table: &Table, id: &str) -> Result<String, MetadataError> {
    table.column(id).map(|c| c.name.clone()).ok_or_else(|| {
        MetadataError::InvariantViolation(format!(
            "column '{}' not found in table '{}'",
            id, table.name
        ))
    })
}

/// Numeric part of an arraysize: `10` and `10*` give 10, `*` gives nothing
fn arraysize_size(arraysize: &str) -> Option<i64> {
    arraysize
        .strip_suffix('*')
        .unwrap_or(arraysize)
        .parse()
        .ok()
}

/// Single-column primary key or single-column index on the column
fn is_indexed(column: &Column, table: &Table) -> bool {
    let single = |ids: &[String]| ids.len() == 1 && ids[0] == column.id;
    single(&table.primary_key) || table.indexes.iter().any(|i| single(i.columns()))
}
