//! Provider configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for every known provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub draftkings: DraftKingsConfig,
}

impl ProvidersConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.draftkings.validate()
    }
}

/// DraftKings sportsbook API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftKingsConfig {
    /// Register the provider at startup
    pub enabled: bool,

    /// Base URL of the sportsbook content API
    pub base_url: String,

    /// Regional site segment of the league endpoint
    pub site: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// DraftKings league id to canonical sport name
    pub leagues: BTreeMap<String, String>,
}

impl Default for DraftKingsConfig {
    fn default() -> Self {
        let mut leagues = BTreeMap::new();
        leagues.insert("88808".to_string(), "NFL".to_string());
        leagues.insert("42648".to_string(), "NBA".to_string());

        Self {
            enabled: true,
            base_url: "https://sportsbook-nash.draftkings.com".to_string(),
            site: "dkusoh".to_string(),
            timeout_secs: 10,
            leagues,
        }
    }
}

impl DraftKingsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// League endpoint for a DraftKings league id
    pub fn league_url(&self, league_id: &str) -> String {
        format!(
            "{}/api/sportscontent/{}/v1/leagues/{}",
            self.base_url.trim_end_matches('/'),
            self.site,
            league_id
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        if self.base_url.is_empty() {
            return Err("draftkings.base_url cannot be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("draftkings.timeout_secs must be greater than 0".to_string());
        }

        if self.leagues.is_empty() {
            return Err("draftkings.leagues cannot be empty".to_string());
        }

        Ok(())
    }
}
