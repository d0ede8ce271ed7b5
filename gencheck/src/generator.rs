//! Invoking the generator under test
//!
//! The generator reads a small TOML document describing where to connect and
//! where to write. That document lives in a [`ConfigArtifact`], a named
//! temporary file that is deleted when the artifact is dropped, so it never
//! outlives the invocation that needs it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::{HarnessConfig, RunConfiguration};
use crate::database::ScratchDatabase;
use crate::error::Result;
use crate::outcome::{Step, StepFailure, StepOutcome};
use crate::process::{Invocation, ProcessRunner};

/// The four fields the generator reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorSettings {
    /// Connection string: space-separated `key=value` clauses
    pub db: String,
    pub schema: String,
    pub package: String,
    #[serde(rename = "output-dir")]
    pub output_dir: String,
}

impl GeneratorSettings {
    pub fn new(db: &ScratchDatabase, schema: &str, package: &str, output_dir: &Path) -> Self {
        Self {
            db: db.connection_string(),
            schema: schema.to_string(),
            package: package.to_string(),
            output_dir: output_dir.display().to_string(),
        }
    }

    /// One `key = "value"` line per field
    pub fn render(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

/// Temporary file holding rendered [`GeneratorSettings`]; removed on drop
#[derive(Debug)]
pub struct ConfigArtifact {
    file: NamedTempFile,
}

impl ConfigArtifact {
    pub fn create(settings: &GeneratorSettings, suffix: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("gencheck-")
            .suffix(suffix)
            .tempfile()?;
        file.write_all(settings.render()?.as_bytes())?;
        file.flush()?;
        file.as_file().sync_all()?;
        debug!("Wrote generator config to {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Make sure `dir` exists and is writable, optionally removing stale files
/// with extension `clean_extension`.
pub fn prepare_output_dir(dir: &Path, clean_extension: Option<&str>) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    if fs::metadata(dir)?.permissions().readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("output directory {} is not writable", dir.display()),
        ));
    }

    if let Some(ext) = clean_extension {
        let ext = ext.trim_start_matches('.');
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == ext) {
                debug!("Removing stale {}", path.display());
                fs::remove_file(&path)?;
            }
        }
    }
    Ok(())
}

pub struct GeneratorInvocation<'a, R> {
    runner: &'a R,
    config: &'a HarnessConfig,
    run: &'a RunConfiguration,
}

impl<'a, R: ProcessRunner> GeneratorInvocation<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig, run: &'a RunConfiguration) -> Self {
        Self {
            runner,
            config,
            run,
        }
    }

    pub fn generator_path(&self) -> PathBuf {
        self.run.resolve_path(&self.config.generator_binary)
    }

    /// `<generator> -conf <artifact>`
    pub fn invocation(&self, artifact_path: &Path) -> Invocation {
        Invocation::new(self.generator_path())
            .arg(&self.config.generator_config_flag)
            .arg(artifact_path.display().to_string())
    }

    /// Run the generator against `db`, writing into `output_dir`
    pub fn invoke(
        &self,
        db: &ScratchDatabase,
        schema_name: &str,
        package_name: &str,
        output_dir: &Path,
    ) -> StepOutcome {
        if let Err(err) =
            prepare_output_dir(output_dir, self.config.clean_output_extension.as_deref())
        {
            return StepOutcome::aborted(Step::Generate, err);
        }

        let settings = GeneratorSettings::new(db, schema_name, package_name, output_dir);
        let artifact = match ConfigArtifact::create(&settings, &self.config.artifact_suffix) {
            Ok(artifact) => artifact,
            Err(err) => return StepOutcome::aborted(Step::Generate, err),
        };

        info!("Generating {} into {}", package_name, output_dir.display());
        let outcome = match self.runner.run(&self.invocation(artifact.path())) {
            Ok(code) => {
                info!("generator exited with code {}", code);
                if code == 0 {
                    StepOutcome::Success
                } else {
                    StepOutcome::Failure(StepFailure::GenerationFailed(code))
                }
            }
            Err(err) => StepOutcome::aborted(Step::Generate, err),
        };

        drop(artifact);
        outcome
    }
}
