//! TAP_SCHEMA DDL and data export

use super::sql::{SqlExporter, quote_identifier};
use super::{ExportError, ExportResult, render_script};
use crate::metadata::MetadataBuilder;
use crate::models::Schema;
use crate::resources::{BUNDLED_SCHEME, BundledLoader, DocumentLoader};
use crate::tap_schema::TapSchemaRecords;
use crate::types::Dialect;
use crate::validation::SchemaValidator;
use tracing::info;

/// Schema name used when none is configured
pub const DEFAULT_TAP_SCHEMA_NAME: &str = "TAP_SCHEMA";

const STANDARD_DOCUMENT: &str = "tap_schema_std.yaml";

/// Emits the TAP_SCHEMA tables and their contents as SQL.
///
/// The table layout comes from the bundled standard description, renamed
/// to the configured schema name and suffixed with the table postfix.
#[derive(Debug, Clone)]
pub struct TapSchemaExporter {
    dialect: Option<Dialect>,
    schema_name: String,
    table_postfix: String,
}

impl Default for TapSchemaExporter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TapSchemaExporter {
    pub fn new(dialect: Option<Dialect>) -> Self {
        Self {
            dialect,
            schema_name: DEFAULT_TAP_SCHEMA_NAME.to_string(),
            table_postfix: String::new(),
        }
    }

    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = name.into();
        self
    }

    /// Suffix appended to every TAP_SCHEMA table name, e.g. `11`
    pub fn table_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.table_postfix = postfix.into();
        self
    }

    /// The standard TAP_SCHEMA description with name and postfix applied
    pub fn standard_schema(&self) -> Result<Schema, ExportError> {
        let uri = format!("{}{}", BUNDLED_SCHEME, STANDARD_DOCUMENT);
        let document = BundledLoader
            .load(&uri)
            .map_err(|e| ExportError::ExportError(e.to_string()))?;
        let mut schema = SchemaValidator::default().validate(&document)?;

        schema.name = self.schema_name.clone();
        for table in &mut schema.tables {
            table.name = format!("{}{}", table.name, self.table_postfix);
        }
        Ok(schema)
    }

    /// `CREATE` statements for the five TAP_SCHEMA tables
    pub fn ddl(&self) -> Result<Vec<String>, ExportError> {
        let schema = self.standard_schema()?;
        let mut builder = MetadataBuilder::new(&schema);
        if let Some(dialect) = self.dialect {
            builder = builder.dialect(dialect);
        }
        let metadata = builder.build()?;
        Ok(SqlExporter::new().if_not_exists(true).statements(&metadata))
    }

    fn table_name(&self, table: &str) -> String {
        let table = quote_identifier(&format!("{}{}", table, self.table_postfix), self.dialect);
        if self.dialect == Some(Dialect::Sqlite) {
            table
        } else {
            format!("{}.{}", quote_identifier(&self.schema_name, self.dialect), table)
        }
    }

    /// One `INSERT` per record, in load order
    pub fn inserts(&self, records: &TapSchemaRecords) -> Vec<String> {
        let statements: Vec<String> = records
            .rows()
            .into_iter()
            .map(|(table, values)| {
                let columns: Vec<String> = values
                    .iter()
                    .map(|(column, _)| quote_identifier(column, self.dialect))
                    .collect();
                let literals: Vec<String> = values.iter().map(|(_, v)| v.to_string()).collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    self.table_name(table),
                    columns.join(", "),
                    literals.join(", ")
                )
            })
            .collect();
        info!(
            tap_schema = %self.schema_name,
            inserts = statements.len(),
            "Generated TAP_SCHEMA inserts"
        );
        statements
    }

    /// DDL script for the TAP_SCHEMA tables
    pub fn export_ddl(&self) -> Result<ExportResult, ExportError> {
        Ok(ExportResult {
            content: render_script(&self.ddl()?),
            format: "tap_schema_ddl".to_string(),
        })
    }

    /// `INSERT` script for translated records
    pub fn export_inserts(&self, records: &TapSchemaRecords) -> ExportResult {
        ExportResult {
            content: render_script(&self.inserts(records)),
            format: "tap_schema_data".to_string(),
        }
    }
}
