//! Configuration file support
//!
//! Handles parsing of `.schema-catalog.toml` configuration files and
//! environment variable overrides.

use crate::types::Dialect;
use crate::validation::ValidationOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".schema-catalog.toml";

/// Environment variable for the default output dialect
pub const ENV_DIALECT: &str = "SCHEMA_CATALOG_DIALECT";

/// Environment variable for the TAP_SCHEMA schema name
pub const ENV_TAP_SCHEMA_NAME: &str = "SCHEMA_CATALOG_TAP_SCHEMA_NAME";

/// Environment variable toggling automatic id generation
pub const ENV_ID_GENERATION: &str = "SCHEMA_CATALOG_ID_GENERATION";

/// Environment variable toggling resource dereferencing
pub const ENV_DEREFERENCE_RESOURCES: &str = "SCHEMA_CATALOG_DEREFERENCE_RESOURCES";

/// Error loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Config error: {0}")]
    ParseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Output configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Dialect used when none is given on the command line
    #[serde(default)]
    pub dialect: Option<Dialect>,

    /// Qualify table names with the schema name
    #[serde(default = "default_true")]
    pub apply_schema_to_tables: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dialect: None,
            apply_schema_to_tables: true,
        }
    }
}

/// TAP_SCHEMA configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapSchemaSection {
    /// Schema holding the TAP_SCHEMA tables
    #[serde(default = "default_tap_schema_name")]
    pub schema_name: String,

    /// Suffix appended to every TAP_SCHEMA table name
    #[serde(default)]
    pub table_postfix: String,

    /// `schemas.schema_index` for loaded schemas
    #[serde(default)]
    pub schema_index: Option<i64>,
}

fn default_tap_schema_name() -> String {
    crate::export::DEFAULT_TAP_SCHEMA_NAME.to_string()
}

impl Default for TapSchemaSection {
    fn default() -> Self {
        Self {
            schema_name: default_tap_schema_name(),
            table_postfix: String::new(),
            schema_index: None,
        }
    }
}

/// Main configuration structure
///
/// Represents the `.schema-catalog.toml` configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Validation toggles
    #[serde(default)]
    pub validation: ValidationOptions,

    /// Output configuration
    #[serde(default)]
    pub output: OutputSection,

    /// TAP_SCHEMA configuration
    #[serde(default)]
    pub tap_schema: TapSchemaSection,
}

impl CatalogConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a directory
    ///
    /// Looks for `.schema-catalog.toml` in the directory.
    /// Falls back to defaults if not found.
    pub fn load(dir: &Path) -> ConfigResult<Self> {
        let config_path = dir.join(CONFIG_FILENAME);
        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))?;
        let mut config = Self::parse(&content)?;
        debug!(path = %path.display(), "Loaded configuration");

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a directory
    pub fn save(&self, dir: &Path) -> ConfigResult<()> {
        let content = self.to_toml()?;
        std::fs::write(dir.join(CONFIG_FILENAME), content)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config: {}", e)))
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dialect) = lookup(ENV_DIALECT)
            && let Ok(dialect) = dialect.parse()
        {
            self.output.dialect = Some(dialect);
        }

        if let Some(name) = lookup(ENV_TAP_SCHEMA_NAME) {
            self.tap_schema.schema_name = name;
        }

        if let Some(flag) = lookup(ENV_ID_GENERATION).as_deref().and_then(parse_flag) {
            self.validation.id_generation = flag;
        }

        if let Some(flag) = lookup(ENV_DEREFERENCE_RESOURCES).as_deref().and_then(parse_flag) {
            self.validation.dereference_resources = flag;
        }
    }

    /// Validation options from the `[validation]` section
    pub fn validation_options(&self) -> ValidationOptions {
        self.validation.clone()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Schema catalog configuration

[validation]
check_description = false
check_redundant_datatypes = false
check_tap_table_indexes = false
check_tap_principal = false
id_generation = false
dereference_resources = true
force_unbounded_arraysize = false

[output]
# Default dialect: "mysql", "postgresql", "sqlite" or "oracle"
# dialect = "postgresql"
apply_schema_to_tables = true

[tap_schema]
schema_name = "TAP_SCHEMA"
table_postfix = ""
# schema_index = 0
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::new();
        assert_eq!(config.output.dialect, None);
        assert!(config.output.apply_schema_to_tables);
        assert_eq!(config.tap_schema.schema_name, "TAP_SCHEMA");
        assert!(config.validation.dereference_resources);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[validation]
check_description = true
dereference_resources = false

[output]
dialect = "mysql"

[tap_schema]
schema_name = "tap"
table_postfix = "11"
schema_index = 2
"#;
        let config = CatalogConfig::parse(toml).unwrap();
        assert!(config.validation.check_description);
        assert!(!config.validation.dereference_resources);
        assert!(!config.validation.id_generation);
        assert_eq!(config.output.dialect, Some(Dialect::MySql));
        assert!(config.output.apply_schema_to_tables);
        assert_eq!(config.tap_schema.schema_name, "tap");
        assert_eq!(config.tap_schema.table_postfix, "11");
        assert_eq!(config.tap_schema.schema_index, Some(2));
    }

    #[test]
    fn test_sample_config_parses() {
        let config = CatalogConfig::parse(sample_config()).unwrap();
        assert_eq!(config.tap_schema.schema_name, "TAP_SCHEMA");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            CatalogConfig::parse("[output]\ndialect = \"db2\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = CatalogConfig::new();
        config.apply_overrides(|name| match name {
            ENV_DIALECT => Some("postgres".to_string()),
            ENV_TAP_SCHEMA_NAME => Some("tap11".to_string()),
            ENV_ID_GENERATION => Some("yes".to_string()),
            ENV_DEREFERENCE_RESOURCES => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config.output.dialect, Some(Dialect::PostgreSql));
        assert_eq!(config.tap_schema.schema_name, "tap11");
        assert!(config.validation.id_generation);
        assert!(config.validation.dereference_resources);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let mut config = CatalogConfig::new();
        config.output.dialect = Some(Dialect::Sqlite);
        config.tap_schema.table_postfix = "_v1".to_string();
        config.save(dir.path()).unwrap();

        let loaded = CatalogConfig::load_file(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(loaded.tap_schema.table_postfix, "_v1");
        assert!(CatalogConfig::load(&dir.path().join("missing")).is_ok());
    }
}
