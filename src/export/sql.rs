//! SQL DDL exporter

use super::{ExportResult, render_script};
use crate::metadata::{
    Autoincrement, ColumnDefault, ColumnDescriptor, ConstraintDescriptor,
    ConstraintDescriptorKind, IndexElement, RelationalMetadata, TableDescriptor, TableRef,
};
use crate::types::Dialect;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

static RE_PLAIN_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"));

/// Words that must be quoted when used as identifiers
const RESERVED_WORDS: &[&str] = &[
    "all", "and", "as", "asc", "between", "by", "case", "check", "column", "constraint",
    "create", "default", "delete", "desc", "distinct", "drop", "from", "grant", "group",
    "having", "in", "index", "insert", "into", "is", "key", "like", "limit", "not", "null",
    "on", "or", "order", "primary", "references", "select", "size", "table", "to", "union",
    "unique", "update", "user", "values", "where",
];

/// Quote an identifier for `dialect` when it is reserved or not a plain name
pub fn quote_identifier(name: &str, dialect: Option<Dialect>) -> String {
    let reserved = RESERVED_WORDS.contains(&name.to_lowercase().as_str());
    if !reserved && RE_PLAIN_IDENTIFIER.is_match(name) {
        return name.to_string();
    }
    match dialect {
        Some(Dialect::MySql) => format!("`{}`", name.replace('`', "``")),
        _ => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Renders [`RelationalMetadata`] as DDL statements for its dialect.
///
/// Statements come out in dependency order: schema, tables, constraints,
/// indexes, comments. Foreign keys are added with `ALTER TABLE` after every
/// table exists, except on SQLite where they are declared inline.
///
/// # Example
///
/// ```rust
/// use schema_catalog_sdk::export::SqlExporter;
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
///     columns:
///       - name: name
///         "@id": "#customers.name"
///         datatype: string
///         length: 30
/// "##,
///     )
///     .unwrap();
/// let metadata = MetadataBuilder::new(&schema).dialect(Dialect::MySql).build().unwrap();
///
/// let statements = SqlExporter::new().statements(&metadata);
/// assert_eq!(statements[0], "CREATE DATABASE sales");
/// assert!(statements[1].starts_with("CREATE TABLE sales.customers"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlExporter {
    if_not_exists: bool,
    skip_schema: bool,
}

impl SqlExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `IF NOT EXISTS` to schema, table and index creation
    pub fn if_not_exists(mut self, enabled: bool) -> Self {
        self.if_not_exists = enabled;
        self
    }

    /// Do not emit `CREATE SCHEMA` / `CREATE DATABASE`
    pub fn skip_schema(mut self, skip: bool) -> Self {
        self.skip_schema = skip;
        self
    }

    /// Export as a `;`-terminated script
    pub fn export(&self, metadata: &RelationalMetadata) -> ExportResult {
        ExportResult {
            content: render_script(&self.statements(metadata)),
            format: "sql".to_string(),
        }
    }

    pub fn statements(&self, metadata: &RelationalMetadata) -> Vec<String> {
        let dialect = metadata.dialect;
        let mut statements = Vec::new();

        if metadata.qualified
            && !self.skip_schema
            && let Some(statement) = self.create_schema(metadata)
        {
            statements.push(statement);
        }

        for table in &metadata.tables {
            statements.push(self.create_table(table, dialect));
        }

        if dialect != Some(Dialect::Sqlite) {
            for table in &metadata.tables {
                for constraint in &table.constraints {
                    statements.push(format!(
                        "ALTER TABLE {} ADD {}",
                        table_name(table, dialect),
                        constraint_clause(constraint, dialect)
                    ));
                }
            }
        }

        for table in &metadata.tables {
            for index in &table.indexes {
                let elements: Vec<String> = index
                    .elements
                    .iter()
                    .map(|e| match e {
                        IndexElement::Column(name) => quote_identifier(name, dialect),
                        IndexElement::Expression(expression) => expression.clone(),
                    })
                    .collect();
                statements.push(format!(
                    "CREATE INDEX {}{} ON {} ({})",
                    self.if_not_exists_clause(dialect),
                    quote_identifier(&index.name, dialect),
                    table_name(table, dialect),
                    elements.join(", ")
                ));
            }
        }

        if dialect == Some(Dialect::PostgreSql) {
            statements.extend(comment_statements(metadata));
        }

        info!(
            schema = %metadata.schema_name,
            dialect = ?dialect,
            statements = statements.len(),
            "Rendered DDL"
        );
        statements
    }

    fn if_not_exists_clause(&self, dialect: Option<Dialect>) -> &'static str {
        // Oracle has no IF NOT EXISTS
        if self.if_not_exists && dialect != Some(Dialect::Oracle) {
            "IF NOT EXISTS "
        } else {
            ""
        }
    }

    fn create_schema(&self, metadata: &RelationalMetadata) -> Option<String> {
        let dialect = metadata.dialect;
        let name = quote_identifier(&metadata.schema_name, dialect);
        let if_not_exists = self.if_not_exists_clause(dialect);
        match dialect {
            Some(Dialect::MySql) => Some(format!("CREATE DATABASE {}{}", if_not_exists, name)),
            Some(Dialect::PostgreSql) | None => {
                Some(format!("CREATE SCHEMA {}{}", if_not_exists, name))
            }
            Some(Dialect::Sqlite) => None,
            Some(Dialect::Oracle) => {
                warn!(schema = %metadata.schema_name, "Oracle schemas are users; not creating one");
                None
            }
        }
    }

    fn create_table(&self, table: &TableDescriptor, dialect: Option<Dialect>) -> String {
        // SQLite only allows AUTOINCREMENT on an INTEGER PRIMARY KEY column
        let inline_key = match (&table.primary_key, dialect) {
            (Some(pk), Some(Dialect::Sqlite)) if pk.columns.len() == 1 => table
                .column(&pk.columns[0])
                .filter(|c| c.autoincrement == Autoincrement::Enabled)
                .map(|c| c.name.as_str()),
            _ => None,
        };

        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|c| column_definition(c, dialect, inline_key == Some(c.name.as_str())))
            .collect();

        if let Some(pk) = &table.primary_key
            && inline_key.is_none()
        {
            let columns: Vec<String> = pk
                .columns
                .iter()
                .map(|c| quote_identifier(c, dialect))
                .collect();
            lines.push(format!("PRIMARY KEY ({})", columns.join(", ")));
        }

        if dialect == Some(Dialect::Sqlite) {
            lines.extend(table.constraints.iter().map(|c| constraint_clause(c, dialect)));
        }

        let mut sql = format!(
            "CREATE TABLE {}{} (\n  {}\n)",
            self.if_not_exists_clause(dialect),
            table_name(table, dialect),
            lines.join(",\n  ")
        );

        if dialect == Some(Dialect::MySql) {
            if let Some(engine) = &table.options.engine {
                sql.push_str(&format!(" ENGINE={}", engine));
            }
            if let Some(charset) = &table.options.charset {
                sql.push_str(&format!(" DEFAULT CHARSET={}", charset));
            }
            if let Some(comment) = &table.comment {
                sql.push_str(&format!(" COMMENT={}", quote_literal(comment)));
            }
        }

        debug!(table = %table.name, "Rendered CREATE TABLE");
        sql
    }
}

fn table_name(table: &TableDescriptor, dialect: Option<Dialect>) -> String {
    qualified(table.schema.as_deref(), &table.name, dialect)
}

fn table_ref_name(table: &TableRef, dialect: Option<Dialect>) -> String {
    qualified(table.schema.as_deref(), &table.name, dialect)
}

fn qualified(schema: Option<&str>, name: &str, dialect: Option<Dialect>) -> String {
    match schema {
        Some(schema) => format!(
            "{}.{}",
            quote_identifier(schema, dialect),
            quote_identifier(name, dialect)
        ),
        None => quote_identifier(name, dialect),
    }
}

fn column_definition(
    column: &ColumnDescriptor,
    dialect: Option<Dialect>,
    inline_key: bool,
) -> String {
    let mut sql = format!("{} {}", quote_identifier(&column.name, dialect), column.sql_type);

    if inline_key {
        sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        return sql;
    }

    if !column.nullable {
        sql.push_str(" NOT NULL");
    }

    match &column.default {
        Some(ColumnDefault::Literal(literal)) => sql.push_str(&format!(" DEFAULT {}", literal)),
        Some(ColumnDefault::CurrentTimestamp) => sql.push_str(" DEFAULT CURRENT_TIMESTAMP"),
        Some(ColumnDefault::Null) => sql.push_str(" DEFAULT NULL"),
        None => {}
    }

    if column.autoincrement == Autoincrement::Enabled {
        match dialect {
            Some(Dialect::MySql) => sql.push_str(" AUTO_INCREMENT"),
            Some(Dialect::Sqlite) => {
                warn!(
                    column = %column.name,
                    "SQLite autoincrement requires a single-column primary key; ignored"
                )
            }
            _ => sql.push_str(" GENERATED BY DEFAULT AS IDENTITY"),
        }
    }

    if dialect == Some(Dialect::MySql)
        && let Some(comment) = &column.comment
    {
        sql.push_str(&format!(" COMMENT {}", quote_literal(comment)));
    }
    sql
}

fn constraint_clause(constraint: &ConstraintDescriptor, dialect: Option<Dialect>) -> String {
    let quote_all = |names: &[String]| -> String {
        names
            .iter()
            .map(|n| quote_identifier(n, dialect))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut sql = format!("CONSTRAINT {} ", quote_identifier(&constraint.name, dialect));
    match &constraint.kind {
        ConstraintDescriptorKind::ForeignKey {
            columns,
            referenced_table,
            referenced_columns,
            on_delete,
            on_update,
        } => {
            sql.push_str(&format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_all(columns),
                table_ref_name(referenced_table, dialect),
                quote_all(referenced_columns)
            ));
            if let Some(action) = on_delete {
                sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
            }
            if let Some(action) = on_update {
                sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
            }
        }
        ConstraintDescriptorKind::Unique { columns } => {
            sql.push_str(&format!("UNIQUE ({})", quote_all(columns)));
        }
        ConstraintDescriptorKind::Check { expression } => {
            sql.push_str(&format!("CHECK ({})", expression));
        }
    }

    if constraint.deferrable {
        if supports_deferrable(&constraint.kind, dialect) {
            sql.push_str(" DEFERRABLE");
            if let Some(initially) = constraint.initially {
                sql.push_str(&format!(" INITIALLY {}", initially.as_sql()));
            }
        } else {
            warn!(
                constraint = %constraint.name,
                dialect = %dialect.map(|d| d.to_string()).unwrap_or_default(),
                "Deferrable not supported for this constraint; ignored"
            );
        }
    }
    sql
}

/// SQLite defers foreign keys only; MySQL defers nothing; checks are never deferrable
fn supports_deferrable(kind: &ConstraintDescriptorKind, dialect: Option<Dialect>) -> bool {
    match (kind, dialect) {
        (_, Some(Dialect::MySql)) => false,
        (ConstraintDescriptorKind::ForeignKey { .. }, _) => true,
        (ConstraintDescriptorKind::Unique { .. }, Some(Dialect::Sqlite)) => false,
        (ConstraintDescriptorKind::Unique { .. }, _) => true,
        (ConstraintDescriptorKind::Check { .. }, _) => false,
    }
}

fn comment_statements(metadata: &RelationalMetadata) -> Vec<String> {
    let dialect = metadata.dialect;
    let mut statements = Vec::new();
    if metadata.qualified
        && let Some(comment) = &metadata.comment
    {
        statements.push(format!(
            "COMMENT ON SCHEMA {} IS {}",
            quote_identifier(&metadata.schema_name, dialect),
            quote_literal(comment)
        ));
    }
    for table in &metadata.tables {
        let name = table_name(table, dialect);
        if let Some(comment) = &table.comment {
            statements.push(format!("COMMENT ON TABLE {} IS {}", name, quote_literal(comment)));
        }
        for column in &table.columns {
            if let Some(comment) = &column.comment {
                statements.push(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    name,
                    quote_identifier(&column.name, dialect),
                    quote_literal(comment)
                ));
            }
        }
    }
    statements
}
