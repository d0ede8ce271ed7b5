//! Scratch database lifecycle

use std::fmt;

use rand::Rng;
use tracing::{error, info};

use crate::config::{HarnessConfig, RunConfiguration};
use crate::error::{FailureCause, HarnessError, Result};
use crate::process::{Invocation, ProcessRunner};

/// Upper bound (inclusive) of the random scratch database suffix
pub const MAX_SUFFIX: u16 = 65535;

/// Lifecycle state of a [`ScratchDatabase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
    Provisioned,
    SchemaLoaded,
    Destroyed,
}

/// A disposable database created for exactly one run
#[derive(Debug, PartialEq, Eq)]
pub struct ScratchDatabase {
    name: String,
    state: DatabaseState,
}

impl ScratchDatabase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> DatabaseState {
        self.state
    }

    /// libpq-style connection string for this database
    pub fn connection_string(&self) -> String {
        format!("dbname={} sslmode=disable", self.name)
    }

    /// A database that has not been created, used when printing a plan
    pub(crate) fn planned(name: String) -> Self {
        Self {
            name,
            state: DatabaseState::Provisioned,
        }
    }

    pub(crate) fn mark_schema_loaded(&mut self) {
        self.state = DatabaseState::SchemaLoaded;
    }
}

impl fmt::Display for ScratchDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Generate `<prefix>_<n>` with `n` drawn uniformly from `1..=MAX_SUFFIX`
pub fn generate_name(prefix: &str) -> String {
    let suffix = rand::thread_rng().gen_range(1..=MAX_SUFFIX);
    format!("{}_{}", prefix, suffix)
}

/// Database client invocation with the resolved host applied
pub(crate) fn client_invocation(config: &HarnessConfig, run: &RunConfiguration) -> Invocation {
    Invocation::new(&config.database_client).env(&config.database_host_var, run.database_host())
}

/// Creates and drops scratch databases through the administrative database
pub struct DatabaseProvisioner<'a, R> {
    runner: &'a R,
    config: &'a HarnessConfig,
    run: &'a RunConfiguration,
}

impl<'a, R: ProcessRunner> DatabaseProvisioner<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig, run: &'a RunConfiguration) -> Self {
        Self {
            runner,
            config,
            run,
        }
    }

    /// `psql -c "<sql>" <admin database>`
    pub fn admin_invocation(&self, sql: String) -> Invocation {
        client_invocation(self.config, self.run)
            .arg("-c")
            .arg(sql)
            .arg(&self.config.admin_database)
    }

    pub fn create_invocation(&self, name: &str) -> Invocation {
        self.admin_invocation(format!("CREATE DATABASE {};", name))
    }

    pub fn drop_invocation(&self, name: &str) -> Invocation {
        self.admin_invocation(format!("DROP DATABASE {};", name))
    }

    /// Create a freshly named scratch database
    pub fn create(&self) -> Result<ScratchDatabase> {
        let name = generate_name(&self.config.database_prefix);
        self.create_named(name)
    }

    /// Create a scratch database under a caller-chosen name
    pub fn create_named(&self, name: String) -> Result<ScratchDatabase> {
        info!("Creating scratch database {}", name);
        let result = self.runner.run(&self.create_invocation(&name));
        if let Some(cause) = FailureCause::from_run(result) {
            let err = HarnessError::ProvisionFailed {
                database: name,
                cause,
            };
            error!("{}", err);
            return Err(err);
        }

        Ok(ScratchDatabase {
            name,
            state: DatabaseState::Provisioned,
        })
    }

    /// Drop the scratch database
    pub fn destroy(&self, db: &mut ScratchDatabase) -> Result<()> {
        info!("Dropping scratch database {}", db.name);
        let result = self.runner.run(&self.drop_invocation(&db.name));
        if let Some(cause) = FailureCause::from_run(result) {
            let err = HarnessError::TeardownFailed {
                database: db.name.clone(),
                cause,
            };
            error!("{}", err);
            return Err(err);
        }

        db.state = DatabaseState::Destroyed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Step;
    use crate::testing::RecordingRunner;

    fn fixture() -> (HarnessConfig, RunConfiguration) {
        (
            HarnessConfig::default(),
            RunConfiguration::new("/home/dev/go", "db.local"),
        )
    }

    #[test]
    fn test_generate_name() {
        for _ in 0..200 {
            let name = generate_name("sillyquill");
            let suffix: u32 = name
                .strip_prefix("sillyquill_")
                .expect("prefix")
                .parse()
                .expect("numeric suffix");
            assert!((1..=u32::from(MAX_SUFFIX)).contains(&suffix));
        }
    }

    #[test]
    fn test_create_issues_create_database() {
        let (config, run) = fixture();
        let runner = RecordingRunner::new();
        let provisioner = DatabaseProvisioner::new(&runner, &config, &run);

        let db = provisioner.create().unwrap();
        assert!(db.name().starts_with("sillyquill_"));
        assert_eq!(db.state(), DatabaseState::Provisioned);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program.to_str(), Some("psql"));
        assert_eq!(
            calls[0].args,
            vec![
                "-c".to_string(),
                format!("CREATE DATABASE {};", db.name()),
                "postgres".to_string()
            ]
        );
        assert_eq!(calls[0].env.get("PGHOST").map(String::as_str), Some("db.local"));
    }

    #[test]
    fn test_create_failure_is_provision_failed() {
        let (config, run) = fixture();
        let runner = RecordingRunner::new().fail_when("CREATE DATABASE", 2);
        let provisioner = DatabaseProvisioner::new(&runner, &config, &run);

        let err = provisioner.create_named("sillyquill_7".into()).unwrap_err();
        match err {
            HarnessError::ProvisionFailed { database, cause } => {
                assert_eq!(database, "sillyquill_7");
                assert_eq!(cause, FailureCause::ExitCode(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_destroy_issues_drop_database() {
        let (config, run) = fixture();
        let runner = RecordingRunner::new();
        let provisioner = DatabaseProvisioner::new(&runner, &config, &run);

        let mut db = provisioner.create_named("sillyquill_99".into()).unwrap();
        provisioner.destroy(&mut db).unwrap();
        assert_eq!(db.state(), DatabaseState::Destroyed);

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].args[1], "DROP DATABASE sillyquill_99;");
        assert_eq!(calls[1].args[2], "postgres");
    }

    #[test]
    fn test_destroy_failure_is_teardown_failed() {
        let (config, run) = fixture();
        let runner = RecordingRunner::new().fail_when("DROP DATABASE", 1);
        let provisioner = DatabaseProvisioner::new(&runner, &config, &run);

        let mut db = provisioner.create_named("sillyquill_5".into()).unwrap();
        let err = provisioner.destroy(&mut db).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::TeardownFailed {
                cause: FailureCause::ExitCode(1),
                ..
            }
        ));
        assert_eq!(db.state(), DatabaseState::Provisioned);
        assert_eq!(
            err.to_string(),
            "teardown of database sillyquill_5 failed with exit code 1"
        );
    }

    #[test]
    fn test_unstartable_client_is_provision_failed() {
        let (config, run) = fixture();
        let runner = RecordingRunner::new().cannot_spawn_when("CREATE DATABASE");
        let provisioner = DatabaseProvisioner::new(&runner, &config, &run);

        let err = provisioner.create_named("sillyquill_8".into()).unwrap_err();
        assert_eq!(err.step(), Some(Step::Provision));
        match &err {
            HarnessError::ProvisionFailed {
                cause: FailureCause::NotRun(reason),
                ..
            } => assert!(reason.contains("psql")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err
            .to_string()
            .starts_with("provision of database sillyquill_8 could not run"));
    }

    #[test]
    fn test_unstartable_client_is_teardown_failed() {
        let (config, run) = fixture();
        let runner = RecordingRunner::new().cannot_spawn_when("DROP DATABASE");
        let provisioner = DatabaseProvisioner::new(&runner, &config, &run);

        let mut db = provisioner.create_named("sillyquill_9".into()).unwrap();
        let err = provisioner.destroy(&mut db).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::TeardownFailed {
                cause: FailureCause::NotRun(_),
                ..
            }
        ));
        assert_eq!(err.step(), Some(Step::Teardown));
        assert_eq!(db.state(), DatabaseState::Provisioned);
    }

    #[test]
    fn test_connection_string() {
        let (config, run) = fixture();
        let runner = RecordingRunner::new();
        let provisioner = DatabaseProvisioner::new(&runner, &config, &run);
        let db = provisioner.create_named("sillyquill_12".into()).unwrap();
        assert_eq!(db.connection_string(), "dbname=sillyquill_12 sslmode=disable");
    }
}
