//! Running the generated code's test suite

use tracing::info;

use crate::config::HarnessConfig;
use crate::database::ScratchDatabase;
use crate::error::Result;
use crate::outcome::{Step, StepFailure, StepOutcome};
use crate::process::{Invocation, ProcessRunner};

pub struct TestExecution<'a, R> {
    runner: &'a R,
    config: &'a HarnessConfig,
}

impl<'a, R: ProcessRunner> TestExecution<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig) -> Self {
        Self { runner, config }
    }

    /// Test command with the connection string exported under `connection_env_var`
    pub fn invocation(&self, db: &ScratchDatabase) -> Result<Invocation> {
        Ok(Invocation::from_command_line(&self.config.test_command)?
            .env(&self.config.connection_env_var, db.connection_string())
            .current_dir(&self.config.test_dir))
    }

    pub fn run(&self, db: &ScratchDatabase) -> StepOutcome {
        let invocation = match self.invocation(db) {
            Ok(invocation) => invocation,
            Err(err) => return StepOutcome::aborted(Step::Test, err),
        };

        info!("Running generated code tests against {}", db);
        match self.runner.run(&invocation) {
            Ok(0) => StepOutcome::Success,
            Ok(code) => StepOutcome::Failure(StepFailure::TestsFailed(code)),
            Err(err) => StepOutcome::aborted(Step::Test, err),
        }
    }
}
