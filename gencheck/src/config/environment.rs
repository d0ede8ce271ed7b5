//! Resolution of the required process environment

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::HarnessConfig;
use crate::error::{HarnessError, Result};

/// Values read from the process environment once, at startup.
///
/// Every component receives this by reference instead of calling
/// `std::env::var` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    toolchain_root: PathBuf,
    database_host: String,
}

impl RunConfiguration {
    pub fn new(toolchain_root: impl Into<PathBuf>, database_host: impl Into<String>) -> Self {
        Self {
            toolchain_root: toolchain_root.into(),
            database_host: database_host.into(),
        }
    }

    pub fn toolchain_root(&self) -> &Path {
        &self.toolchain_root
    }

    pub fn database_host(&self) -> &str {
        &self.database_host
    }

    /// Resolve a configured path against the toolchain root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.toolchain_root.join(path)
        }
    }
}

/// Reads required variables, failing on the first one that is absent
pub struct EnvironmentResolver<F = fn(&str) -> Option<String>> {
    lookup: F,
}

impl EnvironmentResolver {
    /// Resolver backed by the real process environment
    pub fn from_process() -> Self {
        Self {
            lookup: |name| std::env::var(name).ok(),
        }
    }
}

impl<F> EnvironmentResolver<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Resolver backed by an arbitrary lookup function
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    /// Resolve `names` in order. An empty value counts as absent.
    pub fn resolve(&self, names: &[&str]) -> Result<BTreeMap<String, String>> {
        let mut resolved = BTreeMap::new();
        for name in names {
            match (self.lookup)(name) {
                Some(value) if !value.is_empty() => {
                    debug!("{}={}", name, value);
                    resolved.insert((*name).to_string(), value);
                }
                _ => return Err(HarnessError::ConfigurationMissing((*name).to_string())),
            }
        }
        Ok(resolved)
    }

    /// Resolve the toolchain root and database host named by `config`
    pub fn run_configuration(&self, config: &HarnessConfig) -> Result<RunConfiguration> {
        let root_var = config.toolchain_root_var.as_str();
        let host_var = config.database_host_var.as_str();
        let mut values = self.resolve(&[root_var, host_var])?;

        let toolchain_root = values
            .remove(root_var)
            .ok_or_else(|| HarnessError::ConfigurationMissing(root_var.to_string()))?;
        let database_host = values
            .remove(host_var)
            .ok_or_else(|| HarnessError::ConfigurationMissing(host_var.to_string()))?;

        Ok(RunConfiguration::new(toolchain_root, database_host))
    }
}
