mod cli;
mod commands;
mod logging;
mod output;

use std::process;

use anyhow::Result;
use clap::Parser;
use civic_core::AppConfig;
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::commands::CommandExecutor;
use crate::output::OutputManager;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let colored = !cli.no_color;

    if let Err(e) = run(cli).await {
        error!("Application error: {e:#}");
        if colored {
            eprintln!("{} {e:#}", "Error:".red().bold());
        } else {
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if !cli.command.needs_config() {
        commands::print_version();
        return Ok(());
    }

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_console_logging(cli.verbose, cli.quiet);
            return Err(anyhow::Error::new(e).context("loading config"));
        }
    };

    let log_dir = config.log_dir();
    let _guard = logging::init_logging(&log_dir, cli.verbose, cli.quiet)?;
    if let Err(e) = logging::cleanup_old_logs(&log_dir, config.log_retention_days).await {
        warn!(path = %log_dir.display(), error = %e, "Log cleanup failed");
    }

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing current step");
            ctrl_c_token.cancel();
        }
    });

    let executor = CommandExecutor::new(config, OutputManager::new(!cli.no_color), token);
    executor.execute(cli.command).await
}
