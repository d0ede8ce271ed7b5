//! Loading the static schema script into a scratch database

use tracing::info;

use crate::config::{HarnessConfig, RunConfiguration};
use crate::database::{client_invocation, ScratchDatabase};
use crate::outcome::{Step, StepFailure, StepOutcome};
use crate::process::{Invocation, ProcessRunner, StdinSource};

pub struct SchemaLoader<'a, R> {
    runner: &'a R,
    config: &'a HarnessConfig,
    run: &'a RunConfiguration,
}

impl<'a, R: ProcessRunner> SchemaLoader<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig, run: &'a RunConfiguration) -> Self {
        Self {
            runner,
            config,
            run,
        }
    }

    /// `psql <db> < schema`
    pub fn invocation(&self, db_name: &str, schema_source: StdinSource) -> Invocation {
        client_invocation(self.config, self.run)
            .arg(db_name)
            .stdin(schema_source)
    }

    /// Stream `schema_source` into `db` through the database client
    pub fn load(&self, db: &mut ScratchDatabase, schema_source: StdinSource) -> StepOutcome {
        info!("Loading schema into {}", db);
        let invocation = self.invocation(db.name(), schema_source);
        match self.runner.run(&invocation) {
            Ok(0) => {
                db.mark_schema_loaded();
                StepOutcome::Success
            }
            Ok(code) => StepOutcome::Failure(StepFailure::SchemaLoadFailed(code)),
            Err(err) => StepOutcome::aborted(Step::LoadSchema, err),
        }
    }
}
