//! CLI binary entry point for schema-catalog

#[cfg(feature = "cli")]
use anyhow::Context;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use schema_catalog_sdk::cli::commands::create::{CreateArgs, handle_create};
#[cfg(feature = "cli")]
use schema_catalog_sdk::cli::commands::diff::{DiffArgs, handle_diff};
#[cfg(feature = "cli")]
use schema_catalog_sdk::cli::commands::dump::{DumpArgs, handle_dump};
#[cfg(feature = "cli")]
use schema_catalog_sdk::cli::commands::load_config;
#[cfg(feature = "cli")]
use schema_catalog_sdk::cli::commands::merge::{MergeArgs, handle_merge};
#[cfg(feature = "cli")]
use schema_catalog_sdk::cli::commands::tap_schema::{
    LoadTapSchemaArgs, TapSchemaArgs, handle_init_tap_schema, handle_load_tap_schema,
};
#[cfg(feature = "cli")]
use schema_catalog_sdk::cli::commands::validate::{ValidateArgs, handle_validate};
#[cfg(feature = "cli")]
use schema_catalog_sdk::config::{CatalogConfig, sample_config};
#[cfg(feature = "cli")]
use schema_catalog_sdk::validation::ValidationOptions;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "schema-catalog")]
#[command(about = "Validate catalog schema documents and translate them to SQL and TAP_SCHEMA")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    /// Configuration file (defaults to .schema-catalog.toml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

/// Validation toggles; each flag only ever turns a setting on
#[cfg(feature = "cli")]
#[derive(Args, Clone, Default)]
struct CheckFlags {
    /// Require a description of at least three characters on every object
    #[arg(long)]
    check_description: bool,
    /// Reject datatype overrides that match the default mapping
    #[arg(long)]
    check_redundant_datatypes: bool,
    /// Require a unique tap:table_index on every table
    #[arg(long)]
    check_tap_table_indexes: bool,
    /// Require at least one principal column per table
    #[arg(long)]
    check_tap_principal: bool,
    /// Derive ids for objects without one
    #[arg(long)]
    id_generation: bool,
    /// Keep columnRefs imports as references instead of columns
    #[arg(long)]
    no_dereference_resources: bool,
}

#[cfg(feature = "cli")]
impl CheckFlags {
    fn apply(&self, mut options: ValidationOptions) -> ValidationOptions {
        options.check_description |= self.check_description;
        options.check_redundant_datatypes |= self.check_redundant_datatypes;
        options.check_tap_table_indexes |= self.check_tap_table_indexes;
        options.check_tap_principal |= self.check_tap_principal;
        options.id_generation |= self.id_generation;
        if self.no_dereference_resources {
            options.dereference_resources = false;
        }
        options
    }
}

/// Options shared by the commands that emit SQL
#[cfg(feature = "cli")]
#[derive(Args, Clone)]
struct SqlTarget {
    /// Database URL; its scheme selects the dialect (e.g. postgresql://host/db)
    #[arg(long)]
    engine_url: Option<String>,
    /// Print the statements instead of executing them
    #[arg(long)]
    dry_run: bool,
    /// Write the statements to a file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Validate one or more schema documents
    Validate {
        /// Files to validate ('-' for stdin)
        #[arg(required = true)]
        files: Vec<String>,
        #[command(flatten)]
        checks: CheckFlags,
    },
    /// Generate DDL for a schema document
    Create {
        /// Schema document ('-' for stdin)
        file: String,
        /// Replace the schema name
        #[arg(long)]
        schema_name: Option<String>,
        /// Omit constraints from the DDL
        #[arg(long)]
        ignore_constraints: bool,
        /// Emit CREATE SCHEMA / CREATE DATABASE before the tables
        #[arg(long)]
        initialize: bool,
        #[command(flatten)]
        target: SqlTarget,
        #[command(flatten)]
        checks: CheckFlags,
    },
    /// Generate DDL for the TAP_SCHEMA tables
    InitTapSchema {
        /// TAP_SCHEMA schema name
        #[arg(long)]
        tap_schema_name: Option<String>,
        /// Suffix for the TAP_SCHEMA table names
        #[arg(long)]
        tap_tables_postfix: Option<String>,
        #[command(flatten)]
        target: SqlTarget,
    },
    /// Generate TAP_SCHEMA inserts describing a schema document
    LoadTapSchema {
        /// Schema document ('-' for stdin)
        file: String,
        /// Replace the schema name
        #[arg(long)]
        schema_name: Option<String>,
        /// Value for schemas.schema_index
        #[arg(long)]
        tap_schema_index: Option<i64>,
        /// TAP_SCHEMA schema name
        #[arg(long)]
        tap_schema_name: Option<String>,
        /// Suffix for the TAP_SCHEMA table names
        #[arg(long)]
        tap_tables_postfix: Option<String>,
        #[command(flatten)]
        target: SqlTarget,
        #[command(flatten)]
        checks: CheckFlags,
    },
    /// Merge schema documents by @id, later files taking precedence
    Merge {
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare two schema documents
    Diff {
        old: String,
        new: String,
        /// Exit with an error when differences are found
        #[arg(long)]
        error_on_change: bool,
        #[command(flatten)]
        checks: CheckFlags,
    },
    /// Print the validated document
    Dump {
        file: String,
        /// JSON instead of YAML
        #[arg(long)]
        json: bool,
        /// Remove @id keys
        #[arg(long)]
        strip_ids: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        checks: CheckFlags,
    },
    /// Print a sample configuration file
    Config,
}

#[cfg(feature = "cli")]
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn tap_args(
    tap_schema_name: Option<String>,
    tap_tables_postfix: Option<String>,
    target: SqlTarget,
) -> TapSchemaArgs {
    TapSchemaArgs {
        engine_url: target.engine_url,
        tap_schema_name,
        tap_tables_postfix,
        dry_run: target.dry_run,
        output: target.output,
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> anyhow::Result<()> {
    let config: CatalogConfig =
        load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let result = match cli.command {
        Commands::Validate { files, checks } => handle_validate(&ValidateArgs {
            files,
            options: checks.apply(config.validation_options()),
        }),
        Commands::Create {
            file,
            schema_name,
            ignore_constraints,
            initialize,
            target,
            checks,
        } => {
            let mut config = config;
            config.validation = checks.apply(config.validation_options());
            let args = CreateArgs {
                file,
                engine_url: target.engine_url,
                schema_name,
                ignore_constraints,
                initialize,
                dry_run: target.dry_run,
                output: target.output,
            };
            handle_create(&args, &config)
        }
        Commands::InitTapSchema {
            tap_schema_name,
            tap_tables_postfix,
            target,
        } => handle_init_tap_schema(
            &tap_args(tap_schema_name, tap_tables_postfix, target),
            &config,
        ),
        Commands::LoadTapSchema {
            file,
            schema_name,
            tap_schema_index,
            tap_schema_name,
            tap_tables_postfix,
            target,
            checks,
        } => {
            let mut config = config;
            config.validation = checks.apply(config.validation_options());
            let args = LoadTapSchemaArgs {
                file,
                schema_name,
                tap_schema_index,
                tap: tap_args(tap_schema_name, tap_tables_postfix, target),
            };
            handle_load_tap_schema(&args, &config)
        }
        Commands::Merge { files, output } => handle_merge(&MergeArgs { files, output }),
        Commands::Diff {
            old,
            new,
            error_on_change,
            checks,
        } => handle_diff(&DiffArgs {
            old,
            new,
            error_on_change,
            options: checks.apply(config.validation_options()),
        }),
        Commands::Dump {
            file,
            json,
            strip_ids,
            output,
            checks,
        } => handle_dump(&DumpArgs {
            file,
            json,
            strip_ids,
            output,
            options: checks.apply(config.validation_options()),
        }),
        Commands::Config => {
            print!("{}", sample_config());
            Ok(())
        }
    };
    Ok(result?)
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
