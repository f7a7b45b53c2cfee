//! Error types for the odds store

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database errors (connection, constraint, I/O)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Odds referenced a game row that does not exist
    #[error("Game {0} not found")]
    GameNotFound(i64),

    /// A record failed validation before reaching the database
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a new invalid record error
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
