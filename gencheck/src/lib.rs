//! gencheck: End-to-end harness for SQL-schema-to-code generators
//!
//! A run installs the generator, creates a scratch PostgreSQL database, loads
//! a fixed schema into it, points the generator at the live database, runs the
//! generated code's test suite, and drops the database again whatever happened
//! in between.
//!
//! - Failures before the database exists (missing environment, install,
//!   `CREATE DATABASE`) end the run immediately.
//! - A failing schema load, generation or test run skips the remaining steps
//!   but never the `DROP DATABASE`.
//! - A failing drop is reported on its own and does not overwrite the verdict.
//!
//! # CLI Usage
//!
//! ```bash
//! GOPATH=$HOME/go PGHOST=localhost gencheck --schema schema.sql run
//! ```
//!
//! # Programmatic Usage
//!
//! ```rust,ignore
//! let report = gencheck::HarnessBuilder::new("schema.sql")
//!     .output_dir("src/github.com/acme/widgets/dal")
//!     .test_command(&["go", "test", "-v", "./..."])
//!     .run()?;
//! std::process::exit(report.exit_code());
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod generator;
pub mod outcome;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod test_suite;

#[cfg(test)]
mod testing;

use std::path::Path;

use tracing::info;

pub use config::{EnvironmentResolver, HarnessConfig, RunConfiguration};
pub use error::{FailureCause, HarnessError, Result};
pub use outcome::{Step, StepFailure, StepOutcome};
pub use pipeline::{Orchestrator, RunReport, RunState};
pub use process::{Invocation, ProcessRunner, StdinSource, SystemRunner};

/// Main entry point: resolve the environment and run against real processes
pub fn run(config: &HarnessConfig) -> Result<RunReport> {
    config.validate()?;
    let run_config = EnvironmentResolver::from_process().run_configuration(config)?;
    info!(
        "Toolchain root {}, database host {}",
        run_config.toolchain_root().display(),
        run_config.database_host()
    );
    run_with(&SystemRunner, config, &run_config)
}

/// Run with an explicit runner and pre-resolved environment
pub fn run_with<R: ProcessRunner>(
    runner: &R,
    config: &HarnessConfig,
    run_config: &RunConfiguration,
) -> Result<RunReport> {
    config.validate()?;
    Orchestrator::new(runner, config, run_config).run()
}

/// Builder pattern for configuring a run in code
pub struct HarnessBuilder {
    config: HarnessConfig,
}

impl HarnessBuilder {
    /// Create a new builder with the given schema script
    pub fn new(schema_file: impl AsRef<Path>) -> Self {
        Self {
            config: HarnessConfig {
                schema_file: schema_file.as_ref().to_path_buf(),
                ..Default::default()
            },
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Set the generated code output directory
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the generator executable
    pub fn generator_binary(mut self, path: impl AsRef<Path>) -> Self {
        self.config.generator_binary = path.as_ref().to_path_buf();
        self
    }

    /// Set the command that builds the generator
    pub fn install_command(mut self, command: &[&str]) -> Self {
        self.config.install_command = command.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the command that runs the generated code's tests
    pub fn test_command(mut self, command: &[&str]) -> Self {
        self.config.test_command = command.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the working directory of the test command
    pub fn test_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.test_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the database client executable
    pub fn database_client(mut self, client: impl Into<String>) -> Self {
        self.config.database_client = client.into();
        self
    }

    /// Set the scratch database name prefix
    pub fn database_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.database_prefix = prefix.into();
        self
    }

    /// Set the schema and package handed to the generator
    pub fn target(mut self, schema_name: &str, package_name: &str) -> Self {
        self.config.schema_name = schema_name.to_string();
        self.config.package_name = package_name.to_string();
        self
    }

    /// Remove stale `*.<ext>` files from the output directory before generating
    pub fn clean_output(mut self, ext: &str) -> Self {
        self.config.clean_output_extension = Some(ext.to_string());
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn build(self) -> HarnessConfig {
        self.config
    }

    /// Run against real processes and the process environment
    pub fn run(self) -> Result<RunReport> {
        run(&self.config)
    }

    /// Run with an explicit runner and environment
    pub fn run_with<R: ProcessRunner>(
        self,
        runner: &R,
        run_config: &RunConfiguration,
    ) -> Result<RunReport> {
        run_with(runner, &self.config, run_config)
    }
}

impl From<HarnessBuilder> for HarnessConfig {
    fn from(builder: HarnessBuilder) -> Self {
        builder.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;
    use std::path::PathBuf;

    #[test]
    fn test_builder_overrides() {
        let config = HarnessBuilder::new("fixtures/schema.sql")
            .output_dir("/tmp/dal")
            .test_command(&["cargo", "test"])
            .database_prefix("scratch")
            .target("inventory", "models")
            .clean_output("go")
            .build();

        assert_eq!(config.schema_file, PathBuf::from("fixtures/schema.sql"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/dal"));
        assert_eq!(config.test_command, vec!["cargo", "test"]);
        assert_eq!(config.database_prefix, "scratch");
        assert_eq!(config.schema_name, "inventory");
        assert_eq!(config.package_name, "models");
        assert_eq!(config.clean_output_extension.as_deref(), Some("go"));
    }

    #[test]
    fn test_invalid_config_spawns_nothing() {
        let runner = RecordingRunner::new();
        let run_config = RunConfiguration::new("/go", "localhost");
        let result = HarnessBuilder::new("schema.sql")
            .database_prefix("Not-Valid")
            .run_with(&runner, &run_config);

        assert!(matches!(result, Err(HarnessError::ValidationError(_))));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_missing_environment_spawns_nothing() {
        let runner = RecordingRunner::new();
        let config = HarnessConfig::default();

        let result = EnvironmentResolver::with_lookup(|_: &str| None)
            .run_configuration(&config)
            .and_then(|run_config| run_with(&runner, &config, &run_config));

        assert!(
            matches!(result, Err(HarnessError::ConfigurationMissing(ref n)) if n == "GOPATH")
        );
        assert!(runner.calls().is_empty());
    }
}
