//! Store trait and the in-memory implementation

use crate::error::{Result, StoreError};
use crate::models::{Game, GameId, NewGame, NewOdds, OddsRecord, StoreStats};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Abstract trait for game/odds storage backends.
///
/// Implementations must be safe to call from many concurrent fetch runs;
/// serialisation of writes is the backend's job, not the caller's.
#[async_trait::async_trait]
pub trait OddsStore: Send + Sync {
    /// Create the schema if it does not exist yet
    async fn initialize(&self) -> Result<()>;

    /// Insert or overwrite a game keyed by `(sport, external_id)`, returning its identity
    async fn upsert_game(&self, game: &NewGame) -> Result<GameId>;

    /// Append one odds row. Fails with `GameNotFound` if the game row is missing.
    async fn insert_odds(&self, odds: &NewOdds) -> Result<i64>;

    /// All games, optionally restricted to one sport, ordered by start time
    async fn list_games(&self, sport: Option<&str>) -> Result<Vec<Game>>;

    async fn get_game(&self, id: GameId) -> Result<Option<Game>>;

    /// Every odds row recorded for a game, oldest first
    async fn odds_for_game(&self, id: GameId) -> Result<Vec<OddsRecord>>;

    /// Row counts per table
    async fn stats(&self) -> Result<StoreStats>;
}

#[derive(Default)]
struct MemoryTables {
    games: Vec<Game>,
    keys: HashMap<(String, String), GameId>,
    odds: Vec<OddsRecord>,
}

/// In-memory store (for testing)
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<MemoryTables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl OddsStore for InMemoryStore {
    async fn initialize(&self) -> Result<()> {
        tracing::info!("In-memory odds store initialized");
        Ok(())
    }

    async fn upsert_game(&self, game: &NewGame) -> Result<GameId> {
        game.validate()?;

        let mut tables = self.tables.lock().await;
        let key = (game.sport.clone(), game.external_id.clone());
        let now = Utc::now();

        if let Some(&id) = tables.keys.get(&key) {
            if let Some(existing) = tables.games.iter_mut().find(|g| g.id == id) {
                existing.home_team = game.home_team.clone();
                existing.away_team = game.away_team.clone();
                existing.start_time = game.start_time;
                existing.updated_at = now;
            }
            return Ok(id);
        }

        let id = GameId(tables.games.len() as i64 + 1);
        tables.games.push(Game {
            id,
            sport: game.sport.clone(),
            external_id: game.external_id.clone(),
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            start_time: game.start_time,
            updated_at: now,
        });
        tables.keys.insert(key, id);

        Ok(id)
    }

    async fn insert_odds(&self, odds: &NewOdds) -> Result<i64> {
        odds.validate()?;

        let mut tables = self.tables.lock().await;
        if !tables.games.iter().any(|g| g.id == odds.game_id) {
            return Err(StoreError::GameNotFound(odds.game_id.0));
        }

        let id = tables.odds.len() as i64 + 1;
        tables.odds.push(OddsRecord {
            id,
            game_id: odds.game_id,
            provider: odds.provider.clone(),
            market: odds.market.clone(),
            selection: odds.selection.clone(),
            odds: odds.odds,
            fetched_at: odds.fetched_at,
        });

        Ok(id)
    }

    async fn list_games(&self, sport: Option<&str>) -> Result<Vec<Game>> {
        let tables = self.tables.lock().await;
        let mut games: Vec<Game> = tables
            .games
            .iter()
            .filter(|g| sport.map_or(true, |s| g.sport == s))
            .cloned()
            .collect();
        // Unscheduled games last, matching the SQLite ordering
        games.sort_by(|a, b| {
            a.start_time
                .is_none()
                .cmp(&b.start_time.is_none())
                .then(a.start_time.cmp(&b.start_time))
                .then(a.id.cmp(&b.id))
        });
        Ok(games)
    }

    async fn get_game(&self, id: GameId) -> Result<Option<Game>> {
        let tables = self.tables.lock().await;
        Ok(tables.games.iter().find(|g| g.id == id).cloned())
    }

    async fn odds_for_game(&self, id: GameId) -> Result<Vec<OddsRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.odds.iter().filter(|o| o.game_id == id).cloned().collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let tables = self.tables.lock().await;
        Ok(StoreStats { games: tables.games.len() as u64, odds: tables.odds.len() as u64 })
    }
}
