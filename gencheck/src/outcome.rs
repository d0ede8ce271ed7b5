//! Per-step results

use std::fmt;

use thiserror::Error;

/// A pipeline step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Install,
    Provision,
    LoadSchema,
    Generate,
    Test,
    Teardown,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Install => "install",
            Step::Provision => "provision",
            Step::LoadSchema => "load-schema",
            Step::Generate => "generate",
            Step::Test => "test",
            Step::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a non-fatal step failed; every message starts with the step name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    #[error("load-schema failed with exit code {0}")]
    SchemaLoadFailed(i32),

    #[error("generate failed with exit code {0}")]
    GenerationFailed(i32),

    #[error("test failed with exit code {0}")]
    TestsFailed(i32),

    #[error("teardown failed with exit code {0}")]
    TeardownFailed(i32),

    /// The step could not get as far as running its command
    #[error("{step} could not run: {message}")]
    Aborted { step: Step, message: String },
}

/// Result of one pipeline step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failure(StepFailure),
    /// Not run because an earlier step failed
    Skipped,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success)
    }

    pub fn aborted(step: Step, err: impl fmt::Display) -> Self {
        StepOutcome::Failure(StepFailure::Aborted {
            step,
            message: err.to_string(),
        })
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Success => f.write_str("ok"),
            StepOutcome::Failure(failure) => write!(f, "FAILED ({})", failure),
            StepOutcome::Skipped => f.write_str("skipped"),
        }
    }
}
