//! Run orchestration
//!
//! A run moves through
//! `Init → ToolInstalled → DbProvisioned → SchemaReady → Generated → Tested → TornDown → Done`.
//! Install and provisioning failures end the run immediately: there is no
//! database to clean up yet. Once the scratch database exists, the
//! database-bound steps run in order until one fails, the rest are skipped,
//! and the database is dropped no matter how far the run got.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::config::{HarnessConfig, RunConfiguration};
use crate::database::{generate_name, DatabaseProvisioner, ScratchDatabase};
use crate::error::{FailureCause, HarnessError, Result};
use crate::generator::GeneratorInvocation;
use crate::outcome::{Step, StepFailure, StepOutcome};
use crate::process::{Invocation, ProcessRunner, StdinSource};
use crate::schema::SchemaLoader;
use crate::test_suite::TestExecution;

/// Position of a run in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Init,
    ToolInstalled,
    DbProvisioned,
    SchemaReady,
    Generated,
    Tested,
    TornDown,
    Done,
}

impl RunState {
    /// The database-bound step leaving this state, and the state it reaches on success
    fn next_database_step(self) -> Option<(DatabaseStep, RunState)> {
        match self {
            RunState::DbProvisioned => Some((DatabaseStep::LoadSchema, RunState::SchemaReady)),
            RunState::SchemaReady => Some((DatabaseStep::Generate, RunState::Generated)),
            RunState::Generated => Some((DatabaseStep::Test, RunState::Tested)),
            _ => None,
        }
    }
}

/// Steps that need the scratch database and never end the run early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatabaseStep {
    LoadSchema,
    Generate,
    Test,
}

impl DatabaseStep {
    fn step(self) -> Step {
        match self {
            DatabaseStep::LoadSchema => Step::LoadSchema,
            DatabaseStep::Generate => Step::Generate,
            DatabaseStep::Test => Step::Test,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything a completed run found out
#[derive(Debug)]
pub struct RunReport {
    /// Name of the scratch database the run used
    pub database: String,
    /// Outcome of each step after provisioning, teardown last
    pub steps: Vec<(Step, StepOutcome)>,
    /// Furthest state reached before teardown
    pub reached: RunState,
    /// Verdict of the load/generate/test steps when teardown was entered
    pub passed: bool,
}

impl RunReport {
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    pub fn teardown_succeeded(&self) -> bool {
        self.outcome(Step::Teardown)
            .is_some_and(StepOutcome::is_success)
    }

    /// True only if every step, teardown included, succeeded
    pub fn succeeded(&self) -> bool {
        self.passed && self.teardown_succeeded()
    }

    pub fn exit_code(&self) -> i32 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }
}

/// Sequences a single harness run
pub struct Orchestrator<'a, R> {
    runner: &'a R,
    config: &'a HarnessConfig,
    run: &'a RunConfiguration,
}

impl<'a, R: ProcessRunner> Orchestrator<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig, run: &'a RunConfiguration) -> Self {
        Self {
            runner,
            config,
            run,
        }
    }

    fn provisioner(&self) -> DatabaseProvisioner<'a, R> {
        DatabaseProvisioner::new(self.runner, self.config, self.run)
    }

    fn schema_source(&self) -> StdinSource {
        StdinSource::File(self.config.schema_file.clone())
    }

    fn output_dir(&self) -> PathBuf {
        self.run.resolve_path(&self.config.output_dir)
    }

    fn transition(&self, from: RunState, to: RunState) -> RunState {
        debug!("{} -> {}", from, to);
        to
    }

    /// Build and install the generator
    pub fn install(&self) -> Result<()> {
        let invocation = Invocation::from_command_line(&self.config.install_command)?;
        info!("Installing generator: {}", invocation);
        match FailureCause::from_run(self.runner.run(&invocation)) {
            None => Ok(()),
            Some(cause) => {
                let err = HarnessError::ToolInstallFailed(cause);
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Execute the whole run.
    ///
    /// `Err` means the run stopped before a scratch database existed.
    /// Everything after that is reported through [`RunReport`].
    pub fn run(&self) -> Result<RunReport> {
        let state = RunState::Init;

        self.install()?;
        let state = self.transition(state, RunState::ToolInstalled);

        let provisioner = self.provisioner();
        let mut db = provisioner.create()?;
        let state = self.transition(state, RunState::DbProvisioned);

        let (reached, mut steps) = self.exercise(state, &mut db);
        let passed = steps.iter().all(|(_, outcome)| outcome.is_success());
        if passed {
            info!("All steps passed against {}", db);
        }

        let teardown = match provisioner.destroy(&mut db) {
            Ok(()) => StepOutcome::Success,
            Err(HarnessError::TeardownFailed {
                cause: FailureCause::ExitCode(code),
                ..
            }) => StepOutcome::Failure(StepFailure::TeardownFailed(code)),
            Err(HarnessError::TeardownFailed {
                cause: FailureCause::NotRun(reason),
                ..
            }) => StepOutcome::aborted(Step::Teardown, reason),
            Err(err) => StepOutcome::aborted(Step::Teardown, err),
        };
        steps.push((Step::Teardown, teardown));
        let state = self.transition(reached, RunState::TornDown);
        self.transition(state, RunState::Done);

        Ok(RunReport {
            database: db.name().to_string(),
            steps,
            reached,
            passed,
        })
    }

    /// Run database-bound steps until one fails; later ones are recorded as skipped
    fn exercise(
        &self,
        start: RunState,
        db: &mut ScratchDatabase,
    ) -> (RunState, Vec<(Step, StepOutcome)>) {
        let mut reached = start;
        let mut cursor = start;
        let mut failed = false;
        let mut steps = Vec::new();

        while let Some((step, next)) = cursor.next_database_step() {
            cursor = next;
            if failed {
                info!("Skipping {}", step.step());
                steps.push((step.step(), StepOutcome::Skipped));
                continue;
            }

            let outcome = self.perform(step, db);
            match &outcome {
                StepOutcome::Failure(failure) => {
                    error!("{}", failure);
                    failed = true;
                }
                _ => reached = self.transition(reached, next),
            }
            steps.push((step.step(), outcome));
        }

        (reached, steps)
    }

    fn perform(&self, step: DatabaseStep, db: &mut ScratchDatabase) -> StepOutcome {
        match step {
            DatabaseStep::LoadSchema => SchemaLoader::new(self.runner, self.config, self.run)
                .load(db, self.schema_source()),
            DatabaseStep::Generate => GeneratorInvocation::new(self.runner, self.config, self.run)
                .invoke(
                    db,
                    &self.config.schema_name,
                    &self.config.package_name,
                    &self.output_dir(),
                ),
            DatabaseStep::Test => TestExecution::new(self.runner, self.config).run(db),
        }
    }

    /// Commands a run would issue, in order, without running any of them
    pub fn plan(&self) -> Result<Vec<(Step, Invocation)>> {
        let provisioner = self.provisioner();
        let db = ScratchDatabase::planned(generate_name(&self.config.database_prefix));
        let artifact =
            std::env::temp_dir().join(format!("gencheck-XXXXXX{}", self.config.artifact_suffix));

        Ok(vec![
            (
                Step::Install,
                Invocation::from_command_line(&self.config.install_command)?,
            ),
            (Step::Provision, provisioner.create_invocation(db.name())),
            (
                Step::LoadSchema,
                SchemaLoader::new(self.runner, self.config, self.run)
                    .invocation(db.name(), self.schema_source()),
            ),
            (
                Step::Generate,
                GeneratorInvocation::new(self.runner, self.config, self.run)
                    .invocation(&artifact),
            ),
            (
                Step::Test,
                TestExecution::new(self.runner, self.config).invocation(&db)?,
            ),
            (Step::Teardown, provisioner.drop_invocation(db.name())),
        ])
    }
}
