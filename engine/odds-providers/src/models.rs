//! Normalized odds schema shared by every provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One priced outcome of a market, in decimal odds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Market name (e.g., "Moneyline", "Spread", "Total")
    pub market: String,
    /// Outcome within the market (e.g., "Home", "Over (44.5)")
    pub selection: String,
    /// Decimal odds
    pub odds: f64,
}

impl MarketQuote {
    pub fn new(market: impl Into<String>, selection: impl Into<String>, odds: f64) -> Self {
        Self { market: market.into(), selection: selection.into(), odds }
    }
}

/// A game as reported by one provider, already mapped to the canonical sport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedGame {
    /// Canonical sport name (e.g., "NFL")
    pub sport: String,
    /// Provider-scoped identifier, stable across fetches
    pub external_id: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: Option<DateTime<Utc>>,
    pub quotes: Vec<MarketQuote>,
}

impl NormalizedGame {
    pub fn new(
        sport: impl Into<String>,
        external_id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
    ) -> Self {
        Self {
            sport: sport.into(),
            external_id: external_id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            start_time: None,
            quotes: Vec::new(),
        }
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_quote(mut self, market: impl Into<String>, selection: impl Into<String>, odds: f64) -> Self {
        self.quotes.push(MarketQuote::new(market, selection, odds));
        self
    }
}

/// Outcome of one provider fetch. Never persisted.
pub type FetchResult = Result<Vec<NormalizedGame>, crate::error::ProviderError>;
