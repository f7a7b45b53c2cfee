//! Odds Ingestion Service
//!
//! Periodically scrapes sportsbook odds into a local SQLite database and
//! serves them over a read-only HTTP API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use odds_service::{
    graceful_shutdown, initialize_logging, initialize_logging_with_config, load_configuration,
    setup_signal_handlers, start_api_server, ServiceState,
};

#[derive(Parser, Debug)]
#[command(name = "odds-service", version, about = "Scheduled sportsbook odds ingestion")]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "ODDS_CONFIG")]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = match load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            initialize_logging()?;
            error!("{:#}", e);
            return Err(e);
        }
    };

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    let _log_guard =
        initialize_logging_with_config(&config.logging.level, &config.logging.format, config.logging.file.as_deref())?;

    info!("Starting Odds Service v{}", env!("CARGO_PKG_VERSION"));

    // Create service state
    let service_state = Arc::new(ServiceState::new(config).await?);
    info!("Service state initialized");

    // Setup signal handlers for graceful shutdown
    let shutdown_signal = setup_signal_handlers()?;
    info!("Signal handlers configured");

    let api = if service_state.config.api.enabled {
        Some(start_api_server(service_state.clone()).context("Failed to start HTTP API")?)
    } else {
        info!("HTTP API disabled");
        None
    };

    info!("Starting scheduler...");
    let scheduler = service_state.start_scheduler().await?;

    info!("Odds Service is running. Press Ctrl+C to shutdown gracefully.");
    let _ = shutdown_signal.await;

    info!("Shutdown signal received. Initiating graceful shutdown...");
    let report = graceful_shutdown(service_state, scheduler, api).await?;
    if !report.is_clean() {
        error!("{} scheduler tasks did not stop in time", report.abandoned.len());
    }

    info!("Odds Service shutdown complete");
    Ok(())
}
