//! Error types for gencheck

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::outcome::Step;

/// Result type alias for gencheck operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur while running the harness
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("{0} not set")]
    ConfigurationMissing(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open stdin source {}: {source}", .path.display())]
    StdinUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("install {0}")]
    ToolInstallFailed(FailureCause),

    #[error("provision of database {database} {cause}")]
    ProvisionFailed {
        database: String,
        cause: FailureCause,
    },

    #[error("teardown of database {database} {cause}")]
    TeardownFailed {
        database: String,
        cause: FailureCause,
    },
}

impl HarnessError {
    /// The pipeline step a fatal step error belongs to
    pub fn step(&self) -> Option<Step> {
        match self {
            HarnessError::ToolInstallFailed(_) => Some(Step::Install),
            HarnessError::ProvisionFailed { .. } => Some(Step::Provision),
            HarnessError::TeardownFailed { .. } => Some(Step::Teardown),
            _ => None,
        }
    }
}

/// Why a command-backed step did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The command ran and exited non-zero
    ExitCode(i32),
    /// The command could not be started
    NotRun(String),
}

impl FailureCause {
    /// `None` when the command ran and exited 0
    pub fn from_run(result: Result<i32>) -> Option<Self> {
        match result {
            Ok(0) => None,
            Ok(code) => Some(FailureCause::ExitCode(code)),
            Err(err) => Some(FailureCause::NotRun(err.to_string())),
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::ExitCode(code) => write!(f, "failed with exit code {}", code),
            FailureCause::NotRun(reason) => write!(f, "could not run: {}", reason),
        }
    }
}

impl From<config::ConfigError> for HarnessError {
    fn from(err: config::ConfigError) -> Self {
        HarnessError::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for HarnessError {
    fn from(err: toml::ser::Error) -> Self {
        HarnessError::ConfigError(err.to_string())
    }
}
