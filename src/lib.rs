//! Schema Catalog SDK - validation and translation of relational catalog descriptions
//!
//! Provides:
//! - Validation of YAML/JSON schema documents into a typed [`Schema`] graph
//! - Resolution of column imports from external resource documents
//! - Dialect-aware relational metadata and SQL DDL generation
//! - TAP_SCHEMA record translation and `INSERT` generation
//! - Structural diff and `@id`-based merge of schema documents

pub mod config;
pub mod diff;
pub mod export;
pub mod merge;
pub mod metadata;
pub mod models;
pub mod resources;
pub mod tap_schema;
pub mod types;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use config::{CatalogConfig, ConfigError};
pub use diff::{ChangeKind, Difference, SchemaDiff, diff};
pub use export::{
    ExportError, ExportResult, SqlExporter, StatementExecutor, TapSchemaExporter, WriterExecutor,
};
pub use merge::{MergeError, merge_documents};
pub use metadata::{MetadataBuilder, MetadataError, RelationalMetadata};
pub use models::{Column, Schema, Table};
pub use resources::{DefaultLoader, DocumentLoader, ResourceCache, ResourceError};
pub use tap_schema::{TapSchemaRecords, TapSchemaTranslator};
pub use types::Dialect;
pub use validation::{SchemaValidationError, SchemaValidator, ValidationOptions, validate};
