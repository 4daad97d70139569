//! CLI command implementations

pub mod create;
pub mod diff;
pub mod dump;
pub mod merge;
pub mod tap_schema;
pub mod validate;

use crate::cli::error::CliError;
use crate::config::CatalogConfig;
use crate::export::{StatementExecutor, WriterExecutor, render_script};
use crate::models::Schema;
use crate::resources::{DefaultLoader, parse_document};
use crate::types::Dialect;
use crate::validation::{SchemaValidator, ValidationOptions};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Load configuration from an explicit file or the working directory
pub fn load_config(path: Option<&Path>) -> Result<CatalogConfig, CliError> {
    let config = match path {
        Some(path) => CatalogConfig::load_file(path)?,
        None => CatalogConfig::load(Path::new("."))?,
    };
    Ok(config)
}

/// Load input content from file or stdin
pub fn load_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::InvalidArgument(format!("Failed to read stdin: {}", e)))?;
        Ok(content)
    } else {
        let path = PathBuf::from(input);
        std::fs::read_to_string(&path).map_err(|e| CliError::FileReadError(path, e.to_string()))
    }
}

/// Load and parse a document without validating it
pub fn load_document(input: &str) -> Result<Value, CliError> {
    let content = load_input(input)?;
    Ok(parse_document(&content, input)?)
}

fn loader_for(base_dir: &Path) -> DefaultLoader {
    let loader = DefaultLoader::with_base_dir(base_dir);
    #[cfg(feature = "http")]
    let loader = match crate::resources::HttpLoader::new(std::time::Duration::from_secs(30)) {
        Ok(http) => loader.with_http(http),
        Err(e) => {
            tracing::warn!("HTTP resources unavailable: {}", e);
            loader
        }
    };
    loader
}

/// Validate a file (or stdin), resolving resources relative to the file
pub fn validate_input(input: &str, options: ValidationOptions) -> Result<Schema, CliError> {
    if input == "-" {
        let validator =
            SchemaValidator::new(options).with_loader(Arc::new(loader_for(Path::new("."))));
        return Ok(validator.validate_str(&load_input(input)?)?);
    }

    let path = Path::new(input);
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::InvalidArgument(format!("Not a file: {}", input)))?;

    let validator = SchemaValidator::new(options).with_loader(Arc::new(loader_for(base_dir)));
    Ok(validator.validate_uri(file_name)?)
}

/// Dialect from an engine URL, falling back to the configured default
pub fn resolve_dialect(
    engine_url: Option<&str>,
    config: &CatalogConfig,
) -> Result<Option<Dialect>, CliError> {
    match engine_url {
        Some(url) => Dialect::from_url(url)
            .map(Some)
            .map_err(CliError::InvalidArgument),
        None => Ok(config.output.dialect),
    }
}

/// Write content to a file, or stdout when no path is given
pub fn write_output(output: Option<&Path>, content: &str) -> Result<(), CliError> {
    match output {
        Some(path) => std::fs::write(path, content)
            .map_err(|e| CliError::FileWriteError(path.to_path_buf(), e.to_string())),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

/// Hand statements to an executor: a file, stdout on dry runs, or nothing
/// when live execution was requested
pub fn run_statements(
    statements: &[String],
    dry_run: bool,
    output: Option<&Path>,
    target: &str,
) -> Result<(), CliError> {
    if let Some(path) = output {
        let file = std::fs::File::create(path)
            .map_err(|e| CliError::FileWriteError(path.to_path_buf(), e.to_string()))?;
        let mut executor = WriterExecutor::new(std::io::BufWriter::new(file));
        executor.execute(statements)?;
        info!(path = %path.display(), statements = statements.len(), "Wrote SQL");
        return Ok(());
    }
    if dry_run {
        print!("{}", render_script(statements));
        return Ok(());
    }
    Err(CliError::NoExecutor(target.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_validate_input_resolves_relative_resources() {
        let dir = tempdir().unwrap();
        let mut shared = std::fs::File::create(dir.path().join("shared.yaml")).unwrap();
        write!(
            shared,
            r##"
name: shared
"@id": "#shared"
tables:
  - name: common
    "@id": "#common"
    columns:
      - name: id
        "@id": "#common.id"
        datatype: long
"##
        )
        .unwrap();
        let mut main = std::fs::File::create(dir.path().join("main.yaml")).unwrap();
        write!(
            main,
            r##"
name: main
"@id": "#main"
resources:
  shared: shared.yaml
tables:
  - name: things
    "@id": "#things"
    columns: []
    columnRefs:
      shared:
        common:
          id: {{}}
"##
        )
        .unwrap();

        let input = dir.path().join("main.yaml");
        let schema =
            validate_input(input.to_str().unwrap(), ValidationOptions::default()).unwrap();
        assert_eq!(schema.tables[0].columns[0].name, "id");
    }

    #[test]
    fn test_resolve_dialect() {
        let config = CatalogConfig::default();
        assert_eq!(
            resolve_dialect(Some("postgresql+psycopg2://localhost/db"), &config).unwrap(),
            Some(Dialect::PostgreSql)
        );
        assert_eq!(resolve_dialect(None, &config).unwrap(), None);
        assert!(resolve_dialect(Some("db2://x"), &config).is_err());
    }

    #[test]
    fn test_run_statements() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.sql");
        run_statements(&["CREATE SCHEMA s".to_string()], false, Some(&path), "create").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "CREATE SCHEMA s;\n");

        let err = run_statements(&[], false, None, "create").unwrap_err();
        assert!(matches!(err, CliError::NoExecutor(_)));
    }
}
