//! Configuration for the odds store

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default database location, relative to the working directory
pub const DEFAULT_DATABASE_URL: &str = "sqlite://betting_markets.db";

/// Configuration for the store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite connection URL (`sqlite://path/to/file.db` or `sqlite::memory:`)
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,

    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { url: DEFAULT_DATABASE_URL.to_string(), max_connections: 5, busy_timeout_ms: 5_000 }
    }
}

impl StoreConfig {
    /// Create a new configuration for the given database URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    /// Whether the URL points at an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.url.starts_with("sqlite:") {
            return Err(format!("Unsupported database URL: {}", self.url));
        }

        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_in_memory());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_non_sqlite_urls() {
        let config = StoreConfig::new("postgresql://localhost/odds");
        assert!(config.validate().is_err());

        let config = StoreConfig { max_connections: 0, ..StoreConfig::in_memory() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(StoreConfig::in_memory().is_in_memory());
        assert!(StoreConfig::new("sqlite:file:odds?mode=memory&cache=shared").is_in_memory());
    }
}
