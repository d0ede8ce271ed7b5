//! CLI entry point for gencheck

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gencheck::{EnvironmentResolver, HarnessConfig, HarnessError, Orchestrator, SystemRunner};

#[derive(Parser)]
#[command(name = "gencheck")]
#[command(about = "Run a SQL-schema-to-code generator end to end against a scratch database")]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to SQL schema script (overrides config)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Generated code output directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install, provision, load, generate, test and tear down (default)
    Run,
    /// Print the commands a run would issue without running them
    Plan,
    /// Print the effective configuration
    Inspect,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            // Step failures were already logged when they happened
            let logged = err
                .downcast_ref::<HarnessError>()
                .and_then(HarnessError::step)
                .is_some();
            if !logged {
                eprintln!("gencheck: {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first (before logging, so we can use config.log_level)
    let mut config = HarnessConfig::load(cli.config.as_deref())?;

    // Initialize logging
    // Priority: RUST_LOG env var > config.log_level > default (debug for dev, info for release)
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let log_level = config.log_level.as_deref().unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    // Apply CLI overrides
    if let Some(schema) = cli.schema {
        config.schema_file = schema;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }

    config.validate()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Inspect => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Plan => {
            let run_config = EnvironmentResolver::from_process().run_configuration(&config)?;
            let plan = Orchestrator::new(&SystemRunner, &config, &run_config).plan()?;
            println!("Plan - would run:");
            for (step, invocation) in &plan {
                println!("  {:<12} {}", step.as_str(), invocation);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run => {
            let report = gencheck::run(&config)?;
            if report.succeeded() {
                info!("Run against {} passed", report.database);
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(report.exit_code() as u8))
            }
        }
    }
}
