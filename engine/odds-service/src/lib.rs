//! Odds Ingestion Service Library
//!
//! Wires the odds store, provider registry and scheduler into a long-running
//! process: configuration loading, logging, the read-only HTTP API and
//! signal-driven graceful shutdown.

use anyhow::{Context, Result};
use std::path::Path;

pub mod api;
pub mod config;
pub mod logging;
pub mod service;
pub mod signals;

pub use api::{create_routes, start_api_server};
pub use config::ServiceConfig;
pub use logging::{initialize_logging, initialize_logging_with_config};
pub use service::ServiceState;
pub use signals::{graceful_shutdown, setup_signal_handlers, ApiServer};

/// Load configuration from files and environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    config::load_config(path).context("Failed to load service configuration")
}
