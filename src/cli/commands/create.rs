//! Create command implementation

use super::{resolve_dialect, run_statements, validate_input};
use crate::cli::error::CliError;
use crate::config::CatalogConfig;
use crate::export::SqlExporter;
use crate::metadata::MetadataBuilder;
use std::path::PathBuf;

/// Arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    pub file: String,
    /// Connection URL; only its scheme is used to pick the dialect
    pub engine_url: Option<String>,
    /// Replace the schema name from the document
    pub schema_name: Option<String>,
    pub ignore_constraints: bool,
    /// Emit `CREATE SCHEMA` / `CREATE DATABASE` first
    pub initialize: bool,
    pub dry_run: bool,
    pub output: Option<PathBuf>,
}

/// Generate the DDL for a document
pub fn create_statements(
    args: &CreateArgs,
    config: &CatalogConfig,
) -> Result<Vec<String>, CliError> {
    let mut schema = validate_input(&args.file, config.validation_options())?;
    if let Some(name) = &args.schema_name {
        schema.name = name.clone();
    }

    let mut builder = MetadataBuilder::new(&schema)
        .apply_schema_to_tables(config.output.apply_schema_to_tables)
        .ignore_constraints(args.ignore_constraints);
    if let Some(dialect) = resolve_dialect(args.engine_url.as_deref(), config)? {
        builder = builder.dialect(dialect);
    }
    let metadata = builder.build()?;

    Ok(SqlExporter::new()
        .skip_schema(!args.initialize)
        .statements(&metadata))
}

/// Handle the create command
pub fn handle_create(args: &CreateArgs, config: &CatalogConfig) -> Result<(), CliError> {
    let statements = create_statements(args, config)?;
    let target = args.engine_url.as_deref().unwrap_or("create");
    run_statements(&statements, args.dry_run, args.output.as_deref(), target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_schema(dir: &std::path::Path) -> String {
        let path = dir.join("sales.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r##"
name: sales
"@id": "#sales"
tables:
  - name: customers
    "@id": "#customers"
    columns:
      - name: name
        "@id": "#customers.name"
        datatype: string
        length: 30
"##
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_create_statements() {
        let dir = tempdir().unwrap();
        let args = CreateArgs {
            file: write_schema(dir.path()),
            engine_url: Some("mysql://localhost".to_string()),
            schema_name: Some("shop".to_string()),
            initialize: true,
            ..Default::default()
        };
        let statements = create_statements(&args, &CatalogConfig::default()).unwrap();
        assert_eq!(statements[0], "CREATE DATABASE shop");
        assert!(statements[1].starts_with("CREATE TABLE shop.customers"));
    }

    #[test]
    fn test_create_writes_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.sql");
        let args = CreateArgs {
            file: write_schema(dir.path()),
            engine_url: Some("sqlite://".to_string()),
            output: Some(output.clone()),
            ..Default::default()
        };
        handle_create(&args, &CatalogConfig::default()).unwrap();
        let script = std::fs::read_to_string(&output).unwrap();
        assert!(script.starts_with("CREATE TABLE customers ("));
    }

    #[test]
    fn test_live_execution_unavailable() {
        let dir = tempdir().unwrap();
        let args = CreateArgs {
            file: write_schema(dir.path()),
            ..Default::default()
        };
        let err = handle_create(&args, &CatalogConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::NoExecutor(_)));
    }
}
