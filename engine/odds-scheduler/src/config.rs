//! Schedule configuration

use crate::error::SchedulerError;
use odds_providers::ProviderRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;

/// Default fetch interval, in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Identity of one periodic task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey {
    pub sport: String,
    pub provider: String,
}

impl TaskKey {
    pub fn new(sport: impl Into<String>, provider: impl Into<String>) -> Self {
        Self { sport: sport.into(), provider: provider.into() }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.sport, self.provider)
    }
}

/// One `(sport, provider, interval)` triple. Immutable once the scheduler starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub sport: String,
    pub provider: String,
    pub interval: Duration,
}

impl ScheduleEntry {
    pub fn new(sport: impl Into<String>, provider: impl Into<String>, interval: Duration) -> Self {
        Self { sport: sport.into(), provider: provider.into(), interval }
    }

    pub fn key(&self) -> TaskKey {
        TaskKey::new(self.sport.clone(), self.provider.clone())
    }
}

/// Nested `sport -> provider -> interval_secs` schedule
///
/// ```toml
/// [schedule.intervals.NFL]
/// draftkings = 300
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub intervals: BTreeMap<String, BTreeMap<String, u64>>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::empty()
            .with_interval("NFL", "draftkings", DEFAULT_INTERVAL_SECS)
            .with_interval("NBA", "draftkings", DEFAULT_INTERVAL_SECS)
    }
}

impl ScheduleConfig {
    pub fn empty() -> Self {
        Self { intervals: BTreeMap::new() }
    }

    pub fn with_interval(mut self, sport: &str, provider: &str, interval_secs: u64) -> Self {
        self.intervals.entry(sport.to_string()).or_default().insert(provider.to_string(), interval_secs);
        self
    }

    /// Flatten into one entry per `(sport, provider)`, ordered by sport then provider
    pub fn entries(&self) -> Vec<ScheduleEntry> {
        self.intervals
            .iter()
            .flat_map(|(sport, providers)| {
                providers.iter().map(move |(provider, secs)| {
                    ScheduleEntry::new(sport.clone(), provider.clone(), Duration::from_secs(*secs))
                })
            })
            .collect()
    }

    /// Upper-case every sport key. Loaders that fold keys to lower case would
    /// otherwise no longer match canonical sport names.
    ///
    /// Two spellings of one sport that name the same provider are a duplicate entry.
    pub fn canonicalized(self) -> Result<Self, SchedulerError> {
        let mut intervals: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        for (sport, providers) in self.intervals {
            let sport = sport.trim().to_uppercase();
            let merged = intervals.entry(sport.clone()).or_default();
            for (provider, secs) in providers {
                if merged.insert(provider.clone(), secs).is_some() {
                    return Err(SchedulerError::DuplicateEntry(TaskKey::new(sport, provider)));
                }
            }
        }
        Ok(Self { intervals })
    }

    pub fn validate(&self, registry: &ProviderRegistry) -> Result<(), SchedulerError> {
        validate_entries(&self.entries(), registry)
    }
}

/// Check every entry against the registry
pub fn validate_entries(entries: &[ScheduleEntry], registry: &ProviderRegistry) -> Result<(), SchedulerError> {
    if entries.is_empty() {
        return Err(SchedulerError::EmptySchedule);
    }

    let mut seen = HashSet::new();
    for entry in entries {
        let key = entry.key();

        if entry.interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(key));
        }

        let provider = registry.get(&entry.provider).ok_or_else(|| SchedulerError::UnknownProvider(key.clone()))?;
        if !provider.supports(&entry.sport) {
            return Err(SchedulerError::UnsupportedSport(key));
        }

        if !seen.insert(key.clone()) {
            return Err(SchedulerError::DuplicateEntry(key));
        }
    }

    Ok(())
}
