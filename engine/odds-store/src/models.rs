//! Row types for games and odds

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal identity of a game row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted sporting event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub sport: String,
    pub external_id: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Game as written by an upsert, keyed by `(sport, external_id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGame {
    pub sport: String,
    pub external_id: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: Option<DateTime<Utc>>,
}

impl NewGame {
    pub fn new(
        sport: impl Into<String>,
        external_id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        start_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            sport: sport.into(),
            external_id: external_id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            start_time,
        }
    }

    /// Reject games that cannot be keyed
    pub fn validate(&self) -> Result<()> {
        if self.sport.trim().is_empty() {
            return Err(StoreError::invalid_record("game sport is empty"));
        }
        if self.external_id.trim().is_empty() {
            return Err(StoreError::invalid_record(format!(
                "game external id is empty for sport {}",
                self.sport
            )));
        }
        Ok(())
    }
}

/// A single quoted price captured at `fetched_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRecord {
    pub id: i64,
    pub game_id: GameId,
    pub provider: String,
    pub market: String,
    pub selection: String,
    pub odds: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Odds row as appended by a fetch cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOdds {
    pub game_id: GameId,
    pub provider: String,
    pub market: String,
    pub selection: String,
    pub odds: f64,
    pub fetched_at: DateTime<Utc>,
}

impl NewOdds {
    pub fn new(
        game_id: GameId,
        provider: impl Into<String>,
        market: impl Into<String>,
        selection: impl Into<String>,
        odds: f64,
    ) -> Self {
        Self {
            game_id,
            provider: provider.into(),
            market: market.into(),
            selection: selection.into(),
            odds,
            fetched_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(StoreError::invalid_record("odds provider is empty"));
        }
        if self.market.trim().is_empty() {
            return Err(StoreError::invalid_record("odds market is empty"));
        }
        if !self.odds.is_finite() {
            return Err(StoreError::invalid_record(format!(
                "odds value {} for {} / {} is not finite",
                self.odds, self.market, self.selection
            )));
        }
        Ok(())
    }
}

/// Row counts, used by the health surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub games: u64,
    pub odds: u64,
}
