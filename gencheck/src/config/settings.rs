//! Configuration settings for gencheck

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults;
use crate::error::{HarnessError, Result};

/// Main configuration struct for a harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Environment variable naming the toolchain root
    #[serde(default = "default_toolchain_root_var")]
    pub toolchain_root_var: String,

    /// Environment variable naming the database host
    #[serde(default = "default_database_host_var")]
    pub database_host_var: String,

    /// Command that builds and installs the generator
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,

    /// Generator executable (relative paths resolve against the toolchain root)
    #[serde(default = "default_generator_binary")]
    pub generator_binary: PathBuf,

    /// Flag that passes the configuration artifact path to the generator
    #[serde(default = "default_generator_config_flag")]
    pub generator_config_flag: String,

    /// File name suffix of the configuration artifact
    #[serde(default = "default_artifact_suffix")]
    pub artifact_suffix: String,

    /// Database client executable
    #[serde(default = "default_database_client")]
    pub database_client: String,

    /// Administrative database targeted by CREATE/DROP DATABASE
    #[serde(default = "default_admin_database")]
    pub admin_database: String,

    /// Prefix of scratch database names
    #[serde(default = "default_database_prefix")]
    pub database_prefix: String,

    /// Path to the SQL schema script
    #[serde(default = "default_schema_file")]
    pub schema_file: PathBuf,

    /// Database schema handed to the generator
    #[serde(default = "default_schema_name")]
    pub schema_name: String,

    /// Package name handed to the generator
    #[serde(default = "default_package_name")]
    pub package_name: String,

    /// Output directory for generated code (relative paths resolve against the toolchain root)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Test command run against the generated code
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,

    /// Working directory of the test command
    #[serde(default = "default_test_dir")]
    pub test_dir: PathBuf,

    /// Variable carrying the connection string to the test command
    #[serde(default = "default_connection_env_var")]
    pub connection_env_var: String,

    /// Remove files with this extension from the output directory before generating
    #[serde(default)]
    pub clean_output_extension: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG env var
    #[serde(default)]
    pub log_level: Option<String>,
}

// Default value functions for serde
fn default_toolchain_root_var() -> String {
    defaults::TOOLCHAIN_ROOT_VAR.to_string()
}
fn default_database_host_var() -> String {
    defaults::DATABASE_HOST_VAR.to_string()
}
fn default_install_command() -> Vec<String> {
    defaults::INSTALL_COMMAND.iter().map(|s| s.to_string()).collect()
}
fn default_generator_binary() -> PathBuf {
    PathBuf::from(defaults::GENERATOR_BINARY)
}
fn default_generator_config_flag() -> String {
    defaults::GENERATOR_CONFIG_FLAG.to_string()
}
fn default_artifact_suffix() -> String {
    defaults::ARTIFACT_SUFFIX.to_string()
}
fn default_database_client() -> String {
    defaults::DATABASE_CLIENT.to_string()
}
fn default_admin_database() -> String {
    defaults::ADMIN_DATABASE.to_string()
}
fn default_database_prefix() -> String {
    defaults::DATABASE_PREFIX.to_string()
}
fn default_schema_file() -> PathBuf {
    PathBuf::from(defaults::SCHEMA_FILE)
}
fn default_schema_name() -> String {
    defaults::SCHEMA_NAME.to_string()
}
fn default_package_name() -> String {
    defaults::PACKAGE_NAME.to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(defaults::OUTPUT_DIR)
}
fn default_test_command() -> Vec<String> {
    defaults::TEST_COMMAND.iter().map(|s| s.to_string()).collect()
}
fn default_test_dir() -> PathBuf {
    PathBuf::from(defaults::TEST_DIR)
}
fn default_connection_env_var() -> String {
    defaults::CONNECTION_ENV_VAR.to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            toolchain_root_var: default_toolchain_root_var(),
            database_host_var: default_database_host_var(),
            install_command: default_install_command(),
            generator_binary: default_generator_binary(),
            generator_config_flag: default_generator_config_flag(),
            artifact_suffix: default_artifact_suffix(),
            database_client: default_database_client(),
            admin_database: default_admin_database(),
            database_prefix: default_database_prefix(),
            schema_file: default_schema_file(),
            schema_name: default_schema_name(),
            package_name: default_package_name(),
            output_dir: default_output_dir(),
            test_command: default_test_command(),
            test_dir: default_test_dir(),
            connection_env_var: default_connection_env_var(),
            clean_output_extension: None,
            log_level: None,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HarnessConfig = toml::from_str(&content).map_err(|e| {
            HarnessError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config)
    }

    /// Load configuration using config-rs (file + environment variables)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        } else {
            builder = builder.add_source(File::with_name(defaults::CONFIG_FILE).required(false));
        }

        // Override with environment variables (GENCHECK_*)
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .list_separator(" ")
                .with_list_parse_key("install_command")
                .with_list_parse_key("test_command"),
        );

        let config: HarnessConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.install_command.is_empty() {
            return Err(HarnessError::ValidationError(
                "install_command must not be empty".into(),
            ));
        }
        if self.test_command.is_empty() {
            return Err(HarnessError::ValidationError(
                "test_command must not be empty".into(),
            ));
        }

        for (field, value) in [
            ("toolchain_root_var", &self.toolchain_root_var),
            ("database_host_var", &self.database_host_var),
            ("generator_config_flag", &self.generator_config_flag),
            ("database_client", &self.database_client),
            ("admin_database", &self.admin_database),
            ("schema_name", &self.schema_name),
            ("package_name", &self.package_name),
            ("connection_env_var", &self.connection_env_var),
        ] {
            if value.trim().is_empty() {
                return Err(HarnessError::ValidationError(format!(
                    "{} is required",
                    field
                )));
            }
        }

        if self.generator_binary.as_os_str().is_empty() {
            return Err(HarnessError::ValidationError(
                "generator_binary is required".into(),
            ));
        }

        // The prefix becomes the head of an unquoted SQL identifier
        let prefix = &self.database_prefix;
        let valid_prefix = prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
            && prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_prefix {
            return Err(HarnessError::ValidationError(format!(
                "database_prefix {:?} is not a valid identifier prefix",
                prefix
            )));
        }

        Ok(())
    }
}
