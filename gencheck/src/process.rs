//! External process execution
//!
//! Every side effect the harness has on the outside world goes through a
//! [`ProcessRunner`]. [`SystemRunner`] spawns real OS processes; tests
//! substitute a recording runner.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{HarnessError, Result};

/// Where a child's stdin comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StdinSource {
    /// Null device; the harness's own stdin is never inherited
    #[default]
    Null,
    /// Contents of a file, connected to the child directly
    File(PathBuf),
    /// In-memory bytes written through a pipe
    Bytes(Vec<u8>),
}

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub stdin: StdinSource,
    /// Applied on top of the inherited environment
    pub env: BTreeMap<String, String>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: StdinSource::Null,
            env: BTreeMap::new(),
            current_dir: None,
        }
    }

    /// Build from a command line whose first element is the program
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| {
            HarnessError::ValidationError("command line must not be empty".into())
        })?;
        Ok(Self::new(program).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, stdin: StdinSource) -> Self {
        self.stdin = stdin;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        match &self.stdin {
            StdinSource::Null => {}
            StdinSource::File(path) => write!(f, " < {}", path.display())?,
            StdinSource::Bytes(bytes) => write!(f, " <<< ({} bytes)", bytes.len())?,
        }
        if let Some(dir) = &self.current_dir {
            write!(f, " (in {})", dir.display())?;
        }
        Ok(())
    }
}

/// Runs an external command to completion and reports its exit code.
///
/// Implementations must spawn exactly one process per call, block until it
/// exits, and return non-zero exit codes verbatim. `Err` is reserved for
/// failures to start the process at all.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32>;
}

/// [`ProcessRunner`] backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

/// Exit code reported for a child killed by a signal
pub const SIGNALED_EXIT_CODE: i32 = -1;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32> {
        debug!("Running: {}", invocation);

        let spawn_err = |source| HarnessError::SpawnFailed {
            program: invocation.program.display().to_string(),
            source,
        };

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).envs(&invocation.env);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let stdin = match &invocation.stdin {
            StdinSource::Null => Stdio::null(),
            StdinSource::File(path) => {
                let file = File::open(path).map_err(|source| HarnessError::StdinUnavailable {
                    path: path.clone(),
                    source,
                })?;
                Stdio::from(file)
            }
            StdinSource::Bytes(_) => Stdio::piped(),
        };
        command.stdin(stdin);

        let mut child = command.spawn().map_err(spawn_err)?;

        if let StdinSource::Bytes(bytes) = &invocation.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // Broken pipe here is fine; the exit code decides the outcome
                if let Err(err) = pipe.write_all(bytes) {
                    debug!("stdin write to {} stopped: {}", invocation.program.display(), err);
                }
            }
        }

        let status = child.wait()?;
        let code = status.code().unwrap_or(SIGNALED_EXIT_CODE);
        debug!("{} exited with code {}", invocation.program.display(), code);
        Ok(code)
    }
}
