pub mod cli;
pub mod commands;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod records;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::core_state::CoreState;

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let app_config = match AppConfig::load(&cli.config_path()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(app_config.log_filter(), cli.debug);
    tracing::debug!("medrec v{} ({})", config::APP_VERSION, app_config.database.target());

    if !matches!(cli.command, Command::ConfigPath) {
        ensure_data_dir(&app_config.database);
    }

    let state = CoreState::new(app_config.database);
    let outcome = cli::execute(&cli, &state);
    state.shutdown();

    match outcome {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so `--json` output stays machine-readable.
fn init_tracing(filter: &str, debug: bool) {
    let fallback = if debug { "debug" } else { filter };
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
    if let Err(e) = result {
        eprintln!("Tracing already initialized: {e}");
    }
}

// Bare database names resolve into the app data dir, which may not exist yet.
fn ensure_data_dir(db: &config::DatabaseConfig) {
    if db.is_memory() {
        return;
    }
    let data_dir = config::app_data_dir();
    if db.database_path().starts_with(&data_dir) {
        if let Err(e) = std::fs::create_dir_all(&data_dir) {
            tracing::warn!(path = %data_dir.display(), error = %e, "Cannot create data directory");
        }
    }
}
