//! # Odds Scheduler
//!
//! Decides when each `(sport, provider)` pair is fetched and runs the fetches.
//!
//! - **Orchestrator**: runs the providers for one sport concurrently, merges
//!   their games under a lock, drops duplicate odds and writes through to the store.
//!   Provider errors and panics become empty results.
//! - **Scheduler**: one periodic task per schedule entry. The first tick fires
//!   immediately; the interval is measured from the end of one tick to the start
//!   of the next, so ticks of one task never overlap. A failed tick is logged and
//!   the loop carries on.
//! - **StatusBoard**: per-task counters and last error, for spotting providers
//!   that silently return nothing.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod scheduler;
pub mod status;

#[cfg(test)]
mod testing;


#[cfg(test)]
mod integration_tests;

pub use config::{validate_entries, ScheduleConfig, ScheduleEntry, TaskKey, DEFAULT_INTERVAL_SECS};
pub use error::{OrchestratorError, SchedulerError};
pub use orchestrator::{Orchestrator, RunSummary};
pub use scheduler::{Scheduler, SchedulerHandle, ShutdownReport};
pub use status::{StatusBoard, TaskState, TaskStatus};
