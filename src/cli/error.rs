//! CLI-specific error types

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::merge::MergeError;
use crate::metadata::MetadataError;
use crate::resources::ResourceError;
use crate::validation::SchemaValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read file {0}: {1}")]
    FileReadError(PathBuf, String),

    #[error("Failed to write file {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("{0}")]
    ValidationError(#[from] SchemaValidationError),

    #[error("{0} of {1} files failed validation")]
    ValidationFailed(usize, usize),

    #[error("Failed to load document: {0}")]
    ResourceError(#[from] ResourceError),

    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),

    #[error("{0}")]
    MetadataError(#[from] MetadataError),

    #[error("Merge error: {0}")]
    MergeError(#[from] MergeError),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No database executor is available for {0}; use --dry-run or --output")]
    NoExecutor(String),

    #[error("Schemas differ in {0} places")]
    DifferencesFound(usize),
}
