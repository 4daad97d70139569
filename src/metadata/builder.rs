//! Schema → relational metadata

use super::{
    Autoincrement, ColumnDefault, ColumnDescriptor, ConstraintDescriptor,
    ConstraintDescriptorKind, IndexDescriptor, IndexElement, KeyDescriptor, MetadataError,
    RelationalMetadata, TableDescriptor, TableOptions, TableRef,
};
use crate::models::{
    Column, Constraint, ConstraintKind, DefaultValue, Index, IndexTarget, Schema, Table,
};
use crate::types::{Dialect, SqlType, parse_override, physical_type};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Builds [`RelationalMetadata`] from a validated schema.
///
/// # Example
///
/// ```rust
/// use schema_catalog_sdk::metadata::MetadataBuilder;
/// use schema_catalog_sdk::types::Dialect;
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
///     primaryKey: ["#customers.customer_id"]
///     columns:
///       - name: customer_id
///         "@id": "#customers.customer_id"
///         datatype: int
///         nullable: false
/// "##,
///     )
///     .unwrap();
///
/// let metadata = MetadataBuilder::new(&schema)
///     .dialect(Dialect::PostgreSql)
///     .build()
///     .unwrap();
/// assert_eq!(metadata.tables[0].qualified_name(), "sales.customers");
/// ```
#[derive(Debug, Clone)]
pub struct MetadataBuilder<'a> {
    schema: &'a Schema,
    dialect: Option<Dialect>,
    apply_schema_to_tables: bool,
    ignore_constraints: bool,
}

impl<'a> MetadataBuilder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            dialect: None,
            apply_schema_to_tables: true,
            ignore_constraints: false,
        }
    }

    /// Resolve physical types for `dialect` instead of the generic mapping
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Qualify table names with the schema name. Ignored for SQLite.
    pub fn apply_schema_to_tables(mut self, apply: bool) -> Self {
        self.apply_schema_to_tables = apply;
        self
    }

    /// Leave foreign key, unique and check constraints out
    pub fn ignore_constraints(mut self, ignore: bool) -> Self {
        self.ignore_constraints = ignore;
        self
    }

    fn qualified(&self) -> bool {
        self.apply_schema_to_tables && self.dialect != Some(Dialect::Sqlite)
    }

    pub fn build(&self) -> Result<RelationalMetadata, MetadataError> {
        let qualified = self.qualified();
        let tables = self
            .schema
            .tables
            .iter()
            .map(|table| self.build_table(table))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            schema = %self.schema.name,
            dialect = ?self.dialect,
            tables = tables.len(),
            "Built relational metadata"
        );

        Ok(RelationalMetadata {
            schema_name: self.schema.name.clone(),
            qualified,
            dialect: self.dialect,
            comment: self.schema.description.clone(),
            tables,
        })
    }

    fn schema_qualifier(&self) -> Option<String> {
        self.qualified().then(|| self.schema.name.clone())
    }

    fn build_table(&self, table: &Table) -> Result<TableDescriptor, MetadataError> {
        let columns = table
            .all_columns()
            .map(|column| self.build_column(column))
            .collect::<Result<Vec<_>, _>>()?;

        let primary_key = if table.primary_key.is_empty() {
            None
        } else {
            Some(KeyDescriptor {
                name: None,
                columns: column_names(table, &table.primary_key)?,
            })
        };

        let constraints = if self.ignore_constraints {
            Vec::new()
        } else {
            table
                .constraints
                .iter()
                .map(|constraint| self.build_constraint(table, constraint))
                .collect::<Result<Vec<_>, _>>()?
        };

        let indexes = table
            .indexes
            .iter()
            .map(|index| build_index(table, index))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            table = %table.name,
            columns = columns.len(),
            constraints = constraints.len(),
            indexes = indexes.len(),
            "Built table descriptor"
        );

        Ok(TableDescriptor {
            name: table.name.clone(),
            schema: self.schema_qualifier(),
            comment: table.description.clone(),
            columns,
            primary_key,
            constraints,
            indexes,
            options: TableOptions {
                engine: table.mysql_engine.clone(),
                charset: table.mysql_charset.clone(),
            },
        })
    }

    fn build_column(&self, column: &Column) -> Result<ColumnDescriptor, MetadataError> {
        let mut variants = BTreeMap::new();
        for dialect in Dialect::ALL {
            variants.insert(dialect, resolve_type(column, Some(dialect))?);
        }
        let sql_type = match self.dialect {
            Some(dialect) => variants
                .get(&dialect)
                .cloned()
                .ok_or_else(|| invariant(format!("no type variant for {}", dialect)))?,
            None => resolve_type(column, None)?,
        };

        let autoincrement = match column.autoincrement {
            None => Autoincrement::Auto,
            Some(true) => Autoincrement::Enabled,
            Some(false) => Autoincrement::Disabled,
        };

        Ok(ColumnDescriptor {
            name: column.name.clone(),
            sql_type,
            variants,
            nullable: column.nullable,
            default: column.value.as_ref().map(|v| self.column_default(v)),
            autoincrement,
            comment: column.description.clone(),
        })
    }

    fn column_default(&self, value: &DefaultValue) -> ColumnDefault {
        match value {
            DefaultValue::Boolean(b) => {
                let literal = match (self.dialect, *b) {
                    (Some(Dialect::Oracle | Dialect::Sqlite), true) => "1",
                    (Some(Dialect::Oracle | Dialect::Sqlite), false) => "0",
                    (_, true) => "TRUE",
                    (_, false) => "FALSE",
                };
                ColumnDefault::Literal(literal.to_string())
            }
            DefaultValue::Integer(i) => ColumnDefault::Literal(i.to_string()),
            DefaultValue::Float(f) => ColumnDefault::Literal(f.to_string()),
            DefaultValue::Text(s) => ColumnDefault::Literal(format!("'{}'", s.replace('\'', "''"))),
            DefaultValue::CurrentTimestamp => ColumnDefault::CurrentTimestamp,
            DefaultValue::Null => ColumnDefault::Null,
        }
    }

    fn build_constraint(
        &self,
        table: &Table,
        constraint: &Constraint,
    ) -> Result<ConstraintDescriptor, MetadataError> {
        let kind = match &constraint.kind {
            ConstraintKind::ForeignKey {
                columns,
                referenced_columns,
                on_delete,
                on_update,
            } => {
                let first = referenced_columns.first().ok_or_else(|| {
                    invariant(format!(
                        "foreign key '{}' has no referenced columns",
                        constraint.name
                    ))
                })?;
                let target = self.schema.table_of_column(first).ok_or_else(|| {
                    invariant(format!(
                        "foreign key '{}' references unknown column '{}'",
                        constraint.name, first
                    ))
                })?;
                ConstraintDescriptorKind::ForeignKey {
                    columns: column_names(table, columns)?,
                    referenced_table: TableRef {
                        schema: self.schema_qualifier(),
                        name: target.name.clone(),
                    },
                    referenced_columns: column_names(target, referenced_columns)?,
                    on_delete: *on_delete,
                    on_update: *on_update,
                }
            }
            ConstraintKind::Unique { columns } => ConstraintDescriptorKind::Unique {
                columns: column_names(table, columns)?,
            },
            ConstraintKind::Check { expression } => ConstraintDescriptorKind::Check {
                expression: expression.clone(),
            },
        };

        Ok(ConstraintDescriptor {
            name: constraint.name.clone(),
            comment: constraint.description.clone(),
            deferrable: constraint.deferrable,
            initially: constraint.initially,
            kind,
        })
    }
}

/// Build relational metadata with default options
pub fn build(
    schema: &Schema,
    dialect: Option<Dialect>,
) -> Result<RelationalMetadata, MetadataError> {
    let mut builder = MetadataBuilder::new(schema);
    if let Some(dialect) = dialect {
        builder = builder.dialect(dialect);
    }
    builder.build()
}

fn invariant(message: String) -> MetadataError {
    MetadataError::InvariantViolation(message)
}

/// Override for the dialect if declared, else the default mapping
fn resolve_type(column: &Column, dialect: Option<Dialect>) -> Result<SqlType, MetadataError> {
    if let Some(dialect) = dialect
        && let Some(text) = column.datatype_override(dialect)
    {
        return parse_override(dialect, text)
            .map_err(|e| invariant(format!("column '{}': {}", column.id, e)));
    }
    Ok(physical_type(column.datatype, column.length, column.precision, dialect))
}

fn column_names(table: &Table, ids: &[String]) -> Result<Vec<String>, MetadataError> {
    ids.iter()
        .map(|id| {
            table
                .column(id)
                .map(|c| c.name.clone())
                .ok_or_else(|| {
                    invariant(format!(
                        "column '{}' not found in table '{}'",
                        id, table.name
                    ))
                })
        })
        .collect()
}

fn build_index(table: &Table, index: &Index) -> Result<IndexDescriptor, MetadataError> {
    let elements = match &index.target {
        IndexTarget::Columns(ids) => column_names(table, ids)?
            .into_iter()
            .map(IndexElement::Column)
            .collect(),
        IndexTarget::Expressions(expressions) => expressions
            .iter()
            .cloned()
            .map(IndexElement::Expression)
            .collect(),
    };
    Ok(IndexDescriptor {
        name: index.name.clone(),
        comment: index.description.clone(),
        elements,
    })
}
