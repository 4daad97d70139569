//! Export functionality
//!
//! Provides exporters for:
//! - SQL DDL from relational metadata
//! - TAP_SCHEMA DDL and `INSERT` statements
//!
//! plus the [`StatementExecutor`] boundary toward whatever runs the SQL.

pub mod executor;
pub mod sql;
pub mod tap_schema;

use crate::metadata::MetadataError;
use crate::validation::SchemaValidationError;

/// Result of an export operation.
///
/// Contains the exported content and format identifier.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[must_use = "export results contain the exported content and should be used"]
pub struct ExportResult {
    /// Exported content
    pub content: String,
    /// Format identifier
    pub format: String,
}

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] SchemaValidationError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Export error: {0}")]
    ExportError(String),
}

/// Join statements into a script, one `;`-terminated statement per line
pub fn render_script(statements: &[String]) -> String {
    statements.iter().map(|s| format!("{};\n", s)).collect()
}

pub use executor::{StatementExecutor, WriterExecutor};
pub use sql::SqlExporter;
pub use tap_schema::{DEFAULT_TAP_SCHEMA_NAME, TapSchemaExporter};
