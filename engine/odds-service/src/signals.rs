//! Signal handling for graceful shutdown

use anyhow::Result;
use odds_scheduler::{SchedulerHandle, ShutdownReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::service::ServiceState;

/// Resolve the returned receiver on Ctrl+C or SIGTERM
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let sigterm = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    {
        use anyhow::Context;
        signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&sigterm))
            .context("Failed to register SIGTERM handler")?;
    }

    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Ctrl+C signal received"),
                Err(e) => {
                    error!("Failed to listen for Ctrl+C signal: {}", e);
                    wait_for_flag(&sigterm).await;
                    info!("SIGTERM signal received");
                }
            },
            _ = wait_for_flag(&sigterm) => info!("SIGTERM signal received"),
        }

        let _ = shutdown_tx.send(());
    });

    Ok(shutdown_rx)
}

async fn wait_for_flag(flag: &AtomicBool) {
    while !flag.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// HTTP server task plus the sender that tells it to stop
pub struct ApiServer {
    pub shutdown: oneshot::Sender<()>,
    pub handle: JoinHandle<()>,
}

/// Graceful shutdown handler
pub async fn graceful_shutdown(
    service_state: Arc<ServiceState>,
    scheduler: SchedulerHandle,
    api: Option<ApiServer>,
) -> Result<ShutdownReport> {
    info!("Starting graceful shutdown...");

    let shutdown_timeout = Duration::from_secs(service_state.config.service.shutdown_timeout_secs);

    // Stop the scheduler before the API
    let report = scheduler.stop(shutdown_timeout).await;
    if report.is_clean() {
        info!("Scheduler stopped gracefully ({} tasks)", report.stopped.len());
    } else {
        warn!("Scheduler tasks abandoned mid-tick: {:?}", report.abandoned);
    }

    if let Some(api) = api {
        let _ = api.shutdown.send(());
        match timeout(shutdown_timeout, api.handle).await {
            Ok(Ok(())) => info!("HTTP API stopped gracefully"),
            Ok(Err(e)) => error!("HTTP API task failed: {}", e),
            Err(_) => warn!("HTTP API did not stop within timeout, forcing shutdown"),
        }
    }

    service_state.shutdown().await;

    info!("Graceful shutdown complete");
    Ok(report)
}
