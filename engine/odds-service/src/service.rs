//! Service state management and component initialization

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use odds_providers::default_registry;
use odds_scheduler::{Orchestrator, Scheduler, SchedulerHandle, StatusBoard, TaskStatus};
use odds_store::{OddsStore, SqliteStore, StoreStats};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::ServiceConfig;

/// Service state containing all initialized components
pub struct ServiceState {
    /// Service configuration
    pub config: ServiceConfig,

    /// Odds database
    pub store: Arc<SqliteStore>,

    /// Orchestrator shared by every scheduler task
    pub orchestrator: Arc<Orchestrator>,

    /// Status of the running scheduler, once started
    pub scheduler_status: RwLock<Option<StatusBoard>>,

    pub started_at: DateTime<Utc>,
}

/// Database section of the health report
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseHealth {
    pub url: String,
    pub accessible: bool,
    pub games: u64,
    pub odds: u64,
    pub error: Option<String>,
}

/// Health of the process and its database
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub database: DatabaseHealth,
    pub providers: Vec<String>,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.database.accessible
    }
}

/// Scheduler and store view served by the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub scheduler_running: bool,
    pub tasks: Vec<TaskStatus>,
    pub store: Option<StoreStats>,
    pub providers: Vec<String>,
    pub uptime_seconds: i64,
}

impl ServiceState {
    /// Open the database, build providers and check the schedule against them
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        info!("Initializing service components...");

        info!("Initializing odds database...");
        let store = SqliteStore::connect(config.database.clone()).await.context("Failed to open odds database")?;
        store.initialize().await.context("Failed to initialize odds database schema")?;
        let store = Arc::new(store);

        info!("Initializing providers...");
        let registry = default_registry(&config.providers).context("Failed to build provider registry")?;

        // Config errors are fatal before any task starts
        config.schedule.validate(&registry).context("Invalid schedule configuration")?;

        let orchestrator_store: Arc<dyn OddsStore> = store.clone();
        let orchestrator = Arc::new(Orchestrator::new(registry, orchestrator_store));

        info!("Service components initialized");
        Ok(Self { config, store, orchestrator, scheduler_status: RwLock::new(None), started_at: Utc::now() })
    }

    /// Spawn one periodic task per schedule entry
    pub async fn start_scheduler(&self) -> Result<SchedulerHandle> {
        let handle = Scheduler::start_from_config(self.orchestrator.clone(), &self.config.schedule)
            .context("Failed to start scheduler")?;

        *self.scheduler_status.write().await = Some(handle.status());
        Ok(handle)
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    pub async fn health(&self) -> HealthReport {
        let database = match self.store.stats().await {
            Ok(stats) => DatabaseHealth {
                url: self.config.database.url.clone(),
                accessible: true,
                games: stats.games,
                odds: stats.odds,
                error: None,
            },
            Err(e) => {
                error!("Health check failed to query the database: {}", e);
                DatabaseHealth {
                    url: self.config.database.url.clone(),
                    accessible: false,
                    games: 0,
                    odds: 0,
                    error: Some(e.to_string()),
                }
            }
        };

        HealthReport {
            status: if database.accessible { "healthy" } else { "unhealthy" }.to_string(),
            database,
            providers: self.orchestrator.registry().names(),
            uptime_seconds: self.uptime_seconds(),
            timestamp: Utc::now(),
        }
    }

    pub async fn status(&self) -> StatusReport {
        let board = self.scheduler_status.read().await.clone();
        let store = match self.store.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!("Status report failed to query the database: {}", e);
                None
            }
        };

        StatusReport {
            scheduler_running: board.is_some(),
            tasks: board.map(|b| b.snapshot()).unwrap_or_default(),
            store,
            providers: self.orchestrator.registry().names(),
            uptime_seconds: self.uptime_seconds(),
        }
    }

    /// Release the database after the scheduler has stopped
    pub async fn shutdown(&self) {
        *self.scheduler_status.write().await = None;
        self.store.close().await;
        info!("Odds database closed");
    }
}
