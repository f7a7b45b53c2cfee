//! Per-task status surface

use crate::config::{ScheduleEntry, TaskKey};
use crate::orchestrator::RunSummary;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lifecycle of one scheduler task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Idle,
    Running,
    Sleeping,
    Stopped,
}

/// Snapshot of one `(sport, provider)` task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub sport: String,
    pub provider: String,
    pub interval_ms: u64,
    pub state: TaskState,

    /// Ticks started
    pub ticks: u64,
    pub successes: u64,
    pub failures: u64,

    /// Failures since the last successful tick
    pub consecutive_failures: u64,

    pub last_started: Option<DateTime<Utc>>,
    pub last_finished: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,

    /// Games and odds persisted by the most recent tick
    pub last_games: usize,
    pub last_odds: usize,
}

impl TaskStatus {
    fn new(entry: &ScheduleEntry) -> Self {
        Self {
            sport: entry.sport.clone(),
            provider: entry.provider.clone(),
            interval_ms: entry.interval.as_millis() as u64,
            state: TaskState::Idle,
            ticks: 0,
            successes: 0,
            failures: 0,
            consecutive_failures: 0,
            last_started: None,
            last_finished: None,
            last_success: None,
            last_error: None,
            last_games: 0,
            last_odds: 0,
        }
    }

    fn record_failure(&mut self, error: String) {
        let now = Utc::now();
        self.failures += 1;
        self.consecutive_failures += 1;
        self.last_finished = Some(now);
        self.last_error = Some(error);
    }
}

/// Shared, cheaply cloneable view of every task's status
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    tasks: Arc<RwLock<BTreeMap<TaskKey, TaskStatus>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, entry: &ScheduleEntry) {
        self.tasks.write().insert(entry.key(), TaskStatus::new(entry));
    }

    pub fn tick_started(&self, key: &TaskKey) {
        self.update(key, |status| {
            status.state = TaskState::Running;
            status.ticks += 1;
            status.last_started = Some(Utc::now());
        });
    }

    /// Record a completed run. A run with any failed provider, game or odds row counts as a failure.
    pub fn tick_finished(&self, key: &TaskKey, summary: &RunSummary) {
        self.update(key, |status| {
            status.last_games = summary.games_persisted;
            status.last_odds = summary.odds_persisted;

            if summary.is_success() {
                let now = Utc::now();
                status.successes += 1;
                status.consecutive_failures = 0;
                status.last_finished = Some(now);
                status.last_success = Some(now);
            } else {
                status.record_failure(summary.failure_description());
            }
        });
    }

    pub fn tick_failed(&self, key: &TaskKey, error: impl Into<String>) {
        let error = error.into();
        self.update(key, |status| {
            status.last_games = 0;
            status.last_odds = 0;
            status.record_failure(error);
        });
    }

    pub fn set_state(&self, key: &TaskKey, state: TaskState) {
        self.update(key, |status| status.state = state);
    }

    pub fn get(&self, key: &TaskKey) -> Option<TaskStatus> {
        self.tasks.read().get(key).cloned()
    }

    /// All tasks, ordered by sport then provider
    pub fn snapshot(&self) -> Vec<TaskStatus> {
        self.tasks.read().values().cloned().collect()
    }

    fn update(&self, key: &TaskKey, f: impl FnOnce(&mut TaskStatus)) {
        if let Some(status) = self.tasks.write().get_mut(key) {
            f(status);
        }
    }
}
