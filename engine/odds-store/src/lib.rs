//! # Odds Store
//!
//! Persistence for normalized games and odds.
//!
//! ## Architecture
//!
//! - **OddsStore**: Abstract trait every backend implements
//! - **SqliteStore**: Single local SQLite database file (the production backend)
//! - **InMemoryStore**: Mutex-guarded tables for tests
//!
//! Games are upserted on their natural key `(sport, external_id)`; odds rows are
//! append-only so every fetch cycle adds to the line history.
//!
//! ## Usage
//!
//! ```rust
//! use odds_store::{NewGame, NewOdds, OddsStore, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::in_memory().await?;
//!
//!     let game = NewGame::new("NFL", "dk_1001", "Home", "Away", None);
//!     let game_id = store.upsert_game(&game).await?;
//!     store.insert_odds(&NewOdds::new(game_id, "draftkings", "Moneyline", "Home", 1.5)).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod sqlite;

pub use backend::{InMemoryStore, OddsStore};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use models::{Game, GameId, NewGame, NewOdds, OddsRecord, StoreStats};
pub use sqlite::SqliteStore;
