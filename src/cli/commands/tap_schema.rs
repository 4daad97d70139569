//! TAP_SCHEMA command implementations

use super::{resolve_dialect, run_statements, validate_input};
use crate::cli::error::CliError;
use crate::config::CatalogConfig;
use crate::export::TapSchemaExporter;
use crate::tap_schema::TapSchemaTranslator;
use std::path::PathBuf;

/// Options shared by the TAP_SCHEMA commands
#[derive(Debug, Clone, Default)]
pub struct TapSchemaArgs {
    pub engine_url: Option<String>,
    /// Overrides the configured TAP_SCHEMA name
    pub tap_schema_name: Option<String>,
    /// Overrides the configured table postfix
    pub tap_tables_postfix: Option<String>,
    pub dry_run: bool,
    pub output: Option<PathBuf>,
}

/// Arguments for the load-tap-schema command
#[derive(Debug, Clone, Default)]
pub struct LoadTapSchemaArgs {
    pub file: String,
    /// Replace the schema name from the document
    pub schema_name: Option<String>,
    pub tap_schema_index: Option<i64>,
    pub tap: TapSchemaArgs,
}

fn exporter(args: &TapSchemaArgs, config: &CatalogConfig) -> Result<TapSchemaExporter, CliError> {
    let dialect = resolve_dialect(args.engine_url.as_deref(), config)?;
    Ok(TapSchemaExporter::new(dialect)
        .schema_name(
            args.tap_schema_name
                .clone()
                .unwrap_or_else(|| config.tap_schema.schema_name.clone()),
        )
        .table_postfix(
            args.tap_tables_postfix
                .clone()
                .unwrap_or_else(|| config.tap_schema.table_postfix.clone()),
        ))
}

/// Handle the init-tap-schema command
pub fn handle_init_tap_schema(
    args: &TapSchemaArgs,
    config: &CatalogConfig,
) -> Result<(), CliError> {
    let statements = exporter(args, config)?.ddl()?;
    run_statements(&statements, args.dry_run, args.output.as_deref(), "init-tap-schema")
}

/// Generate TAP_SCHEMA inserts for a document
pub fn load_statements(
    args: &LoadTapSchemaArgs,
    config: &CatalogConfig,
) -> Result<Vec<String>, CliError> {
    let mut schema = validate_input(&args.file, config.validation_options())?;
    if let Some(name) = &args.schema_name {
        schema.name = name.clone();
    }

    let mut translator = TapSchemaTranslator::new(&schema);
    if let Some(index) = args.tap_schema_index.or(config.tap_schema.schema_index) {
        translator = translator.schema_index(index);
    }
    let records = translator.translate()?;
    Ok(exporter(&args.tap, config)?.inserts(&records))
}

/// Handle the load-tap-schema command
pub fn handle_load_tap_schema(
    args: &LoadTapSchemaArgs,
    config: &CatalogConfig,
) -> Result<(), CliError> {
    let statements = load_statements(args, config)?;
    run_statements(
        &statements,
        args.tap.dry_run,
        args.tap.output.as_deref(),
        "load-tap-schema",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_statements_use_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sales.yaml");
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

        let mut config = CatalogConfig::default();
        config.tap_schema.schema_name = "tap".to_string();
        config.tap_schema.schema_index = Some(4);
        let args = LoadTapSchemaArgs {
            file: path.to_string_lossy().into_owned(),
            tap: TapSchemaArgs {
                engine_url: Some("postgresql://localhost/db".to_string()),
                tap_tables_postfix: Some("11".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let statements = load_statements(&args, &config).unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("INSERT INTO tap.schemas11 "));
        assert!(statements[0].ends_with("VALUES ('sales', NULL, NULL, 4)"));
    }

    #[test]
    fn test_init_writes_ddl() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("tap.sql");
        let args = TapSchemaArgs {
            engine_url: Some("sqlite://".to_string()),
            output: Some(output.clone()),
            ..Default::default()
        };
        handle_init_tap_schema(&args, &CatalogConfig::default()).unwrap();
        let script = std::fs::read_to_string(&output).unwrap();
        assert!(script.contains("CREATE TABLE IF NOT EXISTS key_columns ("));
    }
}
