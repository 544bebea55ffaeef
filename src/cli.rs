//! # Command Line Interface
//!
//! Runs the worker (default), a single sweep cycle, or a configuration check.

use crate::config::{AppConfig, ObservabilityConfig};
use crate::observability::{init_observability, log_config_info};
use crate::startup::{build_secrets_accessor, build_sweeper, shutdown_signal};
use crate::{retention::SweepScheduler, APP_NAME, VERSION};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "consult-sweeper")]
#[command(about = "Consultation audio retention sweeper and secrets accessor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// List expired audio without deleting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the periodic sweeper until ctrl-c (default)
    Run,

    /// Run a single sweep cycle and exit
    SweepOnce,

    /// Validate configuration and exit
    CheckConfig,
}

/// Parse arguments and run the selected command.
pub async fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Must happen before any configuration is read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    init_observability(&ObservabilityConfig::from_env()).await?;

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "❌ Invalid configuration, exiting");
            return Ok(ExitCode::FAILURE);
        }
    };
    if cli.dry_run {
        config.retention.dry_run = true;
    }

    info!(app_name = APP_NAME, version = VERSION, "🚀 Starting consult-sweeper");
    log_config_info(&config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_worker(config).await,
        Commands::SweepOnce => sweep_once(&config).await,
        Commands::CheckConfig => {
            build_secrets_accessor(&config.secrets)?;
            build_sweeper(&config)?;
            println!("✅ Configuration is valid");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn sweep_once(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let sweeper = build_sweeper(config)?;
    let result = sweeper.run_once().await;

    println!(
        "Sweep {} finished: {} ({} deleted, {} ms)",
        result.sweep_id,
        result.status,
        result.deleted_count,
        result.duration.as_millis()
    );

    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run_worker(config: AppConfig) -> anyhow::Result<ExitCode> {
    let secrets = match build_secrets_accessor(&config.secrets) {
        Ok(secrets) => secrets,
        Err(e) => {
            error!(error = %e, "❌ Failed to configure secrets accessor");
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Some(accessor) = &secrets {
        if let Err(e) = accessor.initialize().await {
            error!(error = %e, "❌ Failed to load required secrets");
            return Ok(ExitCode::FAILURE);
        }
    }

    let scheduler = if config.retention.enabled {
        let sweeper = build_sweeper(&config)?;
        Some(SweepScheduler::start(
            sweeper,
            config.retention.interval(),
            config.retention.run_on_startup,
        ))
    } else {
        warn!("Audio retention sweeper disabled by configuration");
        None
    };

    shutdown_signal().await;

    if let Some(handle) = scheduler {
        handle.stop().await;
    }
    if let Some(accessor) = &secrets {
        accessor.cleanup().await;
    }

    info!("👋 consult-sweeper shutdown completed");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["consult-sweeper"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::try_parse_from(["consult-sweeper", "sweep-once", "--dry-run"]);
        // Global flags must precede the subcommand
        assert!(cli.is_err());

        let cli = Cli::try_parse_from(["consult-sweeper", "--dry-run", "sweep-once"]).unwrap();
        assert_eq!(cli.command, Some(Commands::SweepOnce));
        assert!(cli.dry_run);

        let cli = Cli::try_parse_from(["consult-sweeper", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["consult-sweeper", "serve"]).is_err());
    }
}
