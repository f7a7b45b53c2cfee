//! Service configuration management

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use odds_providers::ProvidersConfig;
use odds_scheduler::ScheduleConfig;
use odds_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix of environment overrides, e.g. `ODDS_API__PORT=9000`
pub const ENV_PREFIX: &str = "ODDS";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Odds database
    pub database: StoreConfig,

    /// Fetch intervals per sport and provider
    pub schedule: ScheduleConfig,

    /// Provider settings
    pub providers: ProvidersConfig,

    /// Read-only HTTP API
    pub api: ApiSettings,

    /// Service-level configuration
    pub service: ServiceSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Serve the HTTP API
    pub enabled: bool,

    /// Bind address
    pub host: String,

    pub port: u16,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// How long scheduler tasks get to finish their current tick on shutdown
    pub shutdown_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,

    /// Daily-rolling log file, in addition to stdout
    pub file: Option<PathBuf>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self { enabled: true, host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ApiSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid API bind address: {}:{}", self.host, self.port))
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { shutdown_timeout_secs: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string(), file: None }
    }
}

impl ServiceConfig {
    /// Render as TOML, the format of `config.toml`
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Load configuration from defaults, an optional file and environment variables.
///
/// With no explicit `path`, `config.toml` in the working directory is used if
/// present. YAML and JSON files are recognised by extension. A configured
/// schedule replaces the default one instead of merging with it.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let base = ServiceConfig { schedule: ScheduleConfig::empty(), ..Default::default() };
    let defaults = Config::try_from(&base).context("Failed to build default configuration")?;

    let file = match path {
        Some(path) => {
            tracing::debug!("Loading configuration from file: {:?}", path);
            File::from(path).required(true)
        }
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config: ServiceConfig = Config::builder()
        .add_source(defaults)
        .add_source(file)
        .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__").try_parsing(true))
        .build()
        .context("Failed to read configuration sources")?
        .try_deserialize()
        .context("Failed to parse configuration")?;

    let schedule = if config.schedule.intervals.is_empty() {
        ScheduleConfig::default()
    } else {
        config.schedule.canonicalized().context("Invalid schedule configuration")?
    };
    let config = ServiceConfig { schedule, ..config };

    validate_config(&config)?;

    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    config.database.validate().map_err(|e| anyhow::anyhow!("Invalid database configuration: {}", e))?;
    config.providers.validate().map_err(|e| anyhow::anyhow!("Invalid provider configuration: {}", e))?;

    // Validate log level
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    // Validate log format
    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    if config.api.enabled {
        config.api.socket_addr()?;
    }

    if config.service.shutdown_timeout_secs == 0 {
        return Err(anyhow::anyhow!("service.shutdown_timeout_secs must be greater than 0"));
    }

    Ok(())
}
