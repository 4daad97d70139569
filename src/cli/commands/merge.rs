//! Merge command implementation

use super::{load_document, write_output};
use crate::cli::error::CliError;
use crate::merge::merge_documents;
use std::path::PathBuf;

/// Arguments for the merge command
#[derive(Debug, Clone, Default)]
pub struct MergeArgs {
    pub files: Vec<String>,
    pub output: Option<PathBuf>,
}

/// Handle the merge command; the merged document is written as YAML
pub fn handle_merge(args: &MergeArgs) -> Result<(), CliError> {
    let documents = args
        .files
        .iter()
        .map(|f| load_document(f))
        .collect::<Result<Vec<_>, _>>()?;
    let merged = merge_documents(&documents)?;
    let yaml =
        serde_yaml::to_string(&merged).map_err(|e| CliError::SerializationError(e.to_string()))?;
    write_output(args.output.as_deref(), &yaml)
}
