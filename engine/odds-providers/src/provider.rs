//! The provider capability

use crate::models::FetchResult;
use std::collections::HashMap;

/// A source of odds for one or more sports.
///
/// Providers are independent of each other: a failure in one never affects
/// another, and the orchestrator treats an error as an empty result.
#[async_trait::async_trait]
pub trait OddsProvider: Send + Sync {
    /// Unique provider name, used as the registry key and stored on every odds row
    fn name(&self) -> &str;

    /// Provider sport id to canonical sport name
    fn sports_mapping(&self) -> HashMap<String, String>;

    /// Whether any provider sport maps to `sport`
    fn supports(&self, sport: &str) -> bool {
        self.sports_mapping().values().any(|canonical| canonical == sport)
    }

    /// Fetch and normalize the current odds for one canonical sport
    async fn fetch_odds(&self, sport: &str) -> FetchResult;
}
