//! Periodic per-(sport, provider) fetch loops

use crate::config::{validate_entries, ScheduleConfig, ScheduleEntry, TaskKey};
use crate::error::SchedulerError;
use crate::orchestrator::{panic_message, Orchestrator};
use crate::status::{StatusBoard, TaskState, TaskStatus};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Starts one long-lived task per schedule entry
pub struct Scheduler;

impl Scheduler {
    /// Validate `entries` and spawn their loops. Nothing starts if validation fails.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(orchestrator: Arc<Orchestrator>, entries: Vec<ScheduleEntry>) -> Result<SchedulerHandle, SchedulerError> {
        validate_entries(&entries, orchestrator.registry())?;

        let token = CancellationToken::new();
        let status = StatusBoard::new();
        let mut tasks = Vec::with_capacity(entries.len());

        for entry in entries {
            status.register(&entry);
            let key = entry.key();
            let handle = tokio::spawn(run_task(entry, Arc::clone(&orchestrator), status.clone(), token.clone()));
            tasks.push((key, handle));
        }

        info!("Scheduler started with {} tasks", tasks.len());
        Ok(SchedulerHandle { token, tasks, status })
    }

    pub fn start_from_config(
        orchestrator: Arc<Orchestrator>,
        config: &ScheduleConfig,
    ) -> Result<SchedulerHandle, SchedulerError> {
        Self::start(orchestrator, config.entries())
    }
}

/// Outcome of [`SchedulerHandle::stop`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub stopped: Vec<TaskKey>,

    /// Tasks still mid-tick at the deadline. Left to finish on their own.
    pub abandoned: Vec<TaskKey>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.abandoned.is_empty()
    }
}

/// Handle over every running scheduler task
pub struct SchedulerHandle {
    token: CancellationToken,
    tasks: Vec<(TaskKey, JoinHandle<()>)>,
    status: StatusBoard,
}

impl SchedulerHandle {
    /// Shared status board, usable after the handle is consumed by `stop`
    pub fn status(&self) -> StatusBoard {
        self.status.clone()
    }

    pub fn snapshot(&self) -> Vec<TaskStatus> {
        self.status.snapshot()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal every task to stop and wait up to `timeout` for them to exit.
    ///
    /// A tick already in flight is allowed to finish; tasks still running at
    /// the deadline are detached, not aborted.
    pub async fn stop(self, timeout: Duration) -> ShutdownReport {
        info!("Stopping scheduler ({} tasks)", self.tasks.len());
        self.token.cancel();

        let deadline = Instant::now() + timeout;
        let mut report = ShutdownReport::default();

        for (key, handle) in self.tasks {
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => report.stopped.push(key),
                Ok(Err(e)) => {
                    error!(task = %key, error = %e, "Scheduler task ended abnormally");
                    report.stopped.push(key);
                }
                Err(_) => {
                    warn!(task = %key, "Scheduler task did not stop within timeout");
                    report.abandoned.push(key);
                }
            }
        }

        info!(stopped = report.stopped.len(), abandoned = report.abandoned.len(), "Scheduler stopped");
        report
    }
}

async fn run_task(entry: ScheduleEntry, orchestrator: Arc<Orchestrator>, status: StatusBoard, token: CancellationToken) {
    let key = entry.key();
    info!(task = %key, interval_secs = entry.interval.as_secs_f64(), "Scheduler task started");

    loop {
        status.tick_started(&key);

        let tick = AssertUnwindSafe(orchestrator.run(&entry.sport, &entry.provider)).catch_unwind().await;
        match tick {
            Ok(Ok(summary)) => {
                if !summary.is_success() {
                    warn!(task = %key, reason = %summary.failure_description(), "Tick completed with failures");
                }
                status.tick_finished(&key, &summary);
            }
            Ok(Err(e)) => {
                error!(task = %key, error = %e, "Tick failed");
                status.tick_failed(&key, e.to_string());
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(task = %key, panic = %message, "Tick panicked");
                status.tick_failed(&key, format!("panicked: {}", message));
            }
        }

        status.set_state(&key, TaskState::Sleeping);
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(entry.interval) => {}
        }
    }

    status.set_state(&key, TaskState::Stopped);
    info!(task = %key, "Scheduler task stopped");
}
