//! SQLite-backed store implementation

use crate::backend::OddsStore;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::models::{Game, GameId, NewGame, NewOdds, OddsRecord, StoreStats};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

/// Schema statements, applied in order on initialization
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sport TEXT NOT NULL,
        external_id TEXT NOT NULL,
        home_team TEXT NOT NULL,
        away_team TEXT NOT NULL,
        start_time TEXT,
        updated_at TEXT NOT NULL,
        UNIQUE(sport, external_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS odds (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        game_id INTEGER NOT NULL,
        provider TEXT NOT NULL,
        market TEXT NOT NULL,
        selection TEXT NOT NULL,
        odds REAL NOT NULL,
        fetched_at TEXT NOT NULL,
        FOREIGN KEY(game_id) REFERENCES games(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_odds_game ON odds(game_id)",
    "CREATE INDEX IF NOT EXISTS idx_games_sport_start ON games(sport, start_time)",
];

/// Store backed by a single local SQLite database file
pub struct SqliteStore {
    config: StoreConfig,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database described by `config`
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        config.validate().map_err(StoreError::config)?;

        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout());

        // Every in-memory connection is a separate database, so the pool is pinned
        // to a single long-lived connection.
        let pool_options = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;

        tracing::info!("Connected to odds database at {}", config.url);

        Ok(Self { config, pool })
    }

    /// Private in-memory database, schema already applied
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect(StoreConfig::in_memory()).await?;
        store.initialize().await?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn game_from_row(row: &SqliteRow) -> Result<Game> {
    Ok(Game {
        id: GameId(row.try_get("id")?),
        sport: row.try_get("sport")?,
        external_id: row.try_get("external_id")?,
        home_team: row.try_get("home_team")?,
        away_team: row.try_get("away_team")?,
        start_time: row.try_get("start_time")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn odds_from_row(row: &SqliteRow) -> Result<OddsRecord> {
    Ok(OddsRecord {
        id: row.try_get("id")?,
        game_id: GameId(row.try_get("game_id")?),
        provider: row.try_get("provider")?,
        market: row.try_get("market")?,
        selection: row.try_get("selection")?,
        odds: row.try_get("odds")?,
        fetched_at: row.try_get("fetched_at")?,
    })
}

#[async_trait::async_trait]
impl OddsStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::info!("Odds database schema ready");
        Ok(())
    }

    async fn upsert_game(&self, game: &NewGame) -> Result<GameId> {
        game.validate()?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO games (sport, external_id, home_team, away_team, start_time, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (sport, external_id)
            DO UPDATE SET
                home_team = excluded.home_team,
                away_team = excluded.away_team,
                start_time = excluded.start_time,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&game.sport)
        .bind(&game.external_id)
        .bind(&game.home_team)
        .bind(&game.away_team)
        .bind(game.start_time)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(GameId(id))
    }

    async fn insert_odds(&self, odds: &NewOdds) -> Result<i64> {
        odds.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO odds (game_id, provider, market, selection, odds, fetched_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(odds.game_id.0)
        .bind(&odds.provider)
        .bind(&odds.market)
        .bind(&odds.selection)
        .bind(odds.odds)
        .bind(odds.fetched_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(StoreError::GameNotFound(odds.game_id.0))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_games(&self, sport: Option<&str>) -> Result<Vec<Game>> {
        let rows = match sport {
            Some(sport) => {
                sqlx::query(
                    "SELECT * FROM games WHERE sport = ?1 ORDER BY start_time IS NULL, start_time, id",
                )
                .bind(sport)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM games ORDER BY start_time IS NULL, start_time, id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(game_from_row).collect()
    }

    async fn get_game(&self, id: GameId) -> Result<Option<Game>> {
        let row = sqlx::query("SELECT * FROM games WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(game_from_row).transpose()
    }

    async fn odds_for_game(&self, id: GameId) -> Result<Vec<OddsRecord>> {
        let rows = sqlx::query("SELECT * FROM odds WHERE game_id = ?1 ORDER BY id")
            .bind(id.0)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(odds_from_row).collect()
    }

    async fn stats(&self) -> Result<StoreStats> {
        let games: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games").fetch_one(&self.pool).await?;
        let odds: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM odds").fetch_one(&self.pool).await?;

        Ok(StoreStats { games: games as u64, odds: odds as u64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn file_store(dir: &TempDir) -> SqliteStore {
        let url = format!("sqlite://{}", dir.path().join("odds.db").display());
        let store = SqliteStore::connect(StoreConfig::new(url)).await.unwrap();
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir).await;

        assert!(temp_dir.path().join("odds.db").exists());
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_and_last_write_wins() {
        let store = SqliteStore::in_memory().await.unwrap();
        let kickoff = Utc.with_ymd_and_hms(2025, 9, 7, 17, 0, 0).unwrap();

        let first = store.upsert_game(&NewGame::new("NFL", "g1", "home", "away", None)).await.unwrap();
        let second = store
            .upsert_game(&NewGame::new("NFL", "g1", "Home", "Away", Some(kickoff)))
            .await
            .unwrap();
        assert_eq!(first, second);

        let games = store.list_games(Some("NFL")).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home_team, "Home");
        assert_eq!(games[0].start_time, Some(kickoff));
    }

    #[tokio::test]
    async fn test_games_without_start_time_are_listed_last() {
        let store = SqliteStore::in_memory().await.unwrap();
        let kickoff = Utc.with_ymd_and_hms(2025, 9, 7, 17, 0, 0).unwrap();

        store.upsert_game(&NewGame::new("NFL", "tbd", "A", "B", None)).await.unwrap();
        store.upsert_game(&NewGame::new("NFL", "sunday", "C", "D", Some(kickoff))).await.unwrap();

        let order: Vec<String> = store.list_games(None).await.unwrap().into_iter().map(|g| g.external_id).collect();
        assert_eq!(order, vec!["sunday", "tbd"]);
    }

    #[tokio::test]
    async fn test_odds_for_missing_game_is_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();

        let result = store.insert_odds(&NewOdds::new(GameId(7), "a", "Moneyline", "Home", 1.5)).await;
        assert!(matches!(result, Err(StoreError::GameNotFound(7))));
    }

    #[tokio::test]
    async fn test_odds_history_is_appended() {
        let store = SqliteStore::in_memory().await.unwrap();
        let id = store.upsert_game(&NewGame::new("NFL", "g1", "Home", "Away", None)).await.unwrap();

        store.insert_odds(&NewOdds::new(id, "a", "Moneyline", "Home", 1.5)).await.unwrap();
        store.insert_odds(&NewOdds::new(id, "a", "Moneyline", "Home", 1.45)).await.unwrap();

        let odds = store.odds_for_game(id).await.unwrap();
        assert_eq!(odds.len(), 2);
        assert_eq!(odds[0].odds, 1.5);
        assert_eq!(odds[1].odds, 1.45);
        assert_eq!(store.get_game(id).await.unwrap().map(|g| g.external_id), Some("g1".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_writers_on_file_database() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(file_store(&temp_dir).await);

        let mut handles = Vec::new();
        for writer in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for n in 0..10 {
                    let game = NewGame::new("NBA", format!("g{}", n), "Home", "Away", None);
                    let id = store.upsert_game(&game).await.unwrap();
                    let odds = NewOdds::new(id, format!("p{}", writer), "Moneyline", "Home", 1.9);
                    store.insert_odds(&odds).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.games, 10);
        assert_eq!(stats.odds, 80);
    }
}
