//! Error types for orchestration and scheduling

use crate::config::TaskKey;
use thiserror::Error;

/// Errors returned by a single-provider orchestrator run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider {provider} does not support sport {sport}")]
    UnsupportedSport { sport: String, provider: String },
}

/// Schedule configuration errors. Only raised before any task starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Schedule is empty")]
    EmptySchedule,

    #[error("Interval for {0} must be greater than zero")]
    InvalidInterval(TaskKey),

    #[error("Unknown provider in schedule entry {0}")]
    UnknownProvider(TaskKey),

    #[error("Provider does not support the sport in schedule entry {0}")]
    UnsupportedSport(TaskKey),

    #[error("Schedule entry {0} is listed more than once")]
    DuplicateEntry(TaskKey),
}
