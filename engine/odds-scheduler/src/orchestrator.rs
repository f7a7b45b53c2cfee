//! Concurrent fetch and write-through for one sport

use crate::error::OrchestratorError;
use futures::FutureExt;
use odds_providers::{NormalizedGame, OddsProvider, ProviderRegistry};
use odds_store::{NewGame, NewOdds, OddsStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Counters for one orchestrator run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub sport: String,
    pub providers_ok: usize,
    pub providers_failed: usize,
    pub games_fetched: usize,
    pub games_persisted: usize,
    pub games_failed: usize,
    pub odds_persisted: usize,
    pub odds_failed: usize,
    pub duplicates_dropped: usize,

    /// `provider: reason` for every provider that failed
    pub errors: Vec<String>,
}

impl RunSummary {
    fn new(sport: &str) -> Self {
        Self { sport: sport.to_string(), ..Default::default() }
    }

    /// No provider failed and every fetched row was written
    pub fn is_success(&self) -> bool {
        self.providers_failed == 0 && self.games_failed == 0 && self.odds_failed == 0
    }

    pub fn failure_description(&self) -> String {
        let mut parts = self.errors.clone();
        if self.games_failed > 0 {
            parts.push(format!("{} games failed to persist", self.games_failed));
        }
        if self.odds_failed > 0 {
            parts.push(format!("{} odds failed to persist", self.odds_failed));
        }
        parts.join("; ")
    }
}

/// Games returned by one provider in one run
struct ProviderBatch {
    provider: String,
    games: Vec<NormalizedGame>,
}

type OddsKey = (String, String, String, String, String);

/// Runs providers concurrently and writes their results through to the store
pub struct Orchestrator {
    registry: ProviderRegistry,
    store: Arc<dyn OddsStore>,
}

impl Orchestrator {
    pub fn new(registry: ProviderRegistry, store: Arc<dyn OddsStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn OddsStore> {
        &self.store
    }

    /// Fetch `sport` from every provider that covers it. Never fails.
    pub async fn run_sport(&self, sport: &str) -> RunSummary {
        let providers = self.registry.for_sport(sport);
        if providers.is_empty() {
            warn!(sport, "No providers registered for sport");
        }

        self.execute(sport, providers).await
    }

    /// Fetch `sport` from a single named provider
    pub async fn run(&self, sport: &str, provider: &str) -> Result<RunSummary, OrchestratorError> {
        let selected =
            self.registry.get(provider).ok_or_else(|| OrchestratorError::UnknownProvider(provider.to_string()))?;

        if !selected.supports(sport) {
            return Err(OrchestratorError::UnsupportedSport {
                sport: sport.to_string(),
                provider: provider.to_string(),
            });
        }

        Ok(self.execute(sport, vec![selected]).await)
    }

    async fn execute(&self, sport: &str, providers: Vec<Arc<dyn OddsProvider>>) -> RunSummary {
        let mut summary = RunSummary::new(sport);
        let accumulator: Arc<Mutex<Vec<ProviderBatch>>> = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::with_capacity(providers.len());
        for provider in providers {
            let name = provider.name().to_string();
            let accumulator = Arc::clone(&accumulator);
            let sport = sport.to_string();

            let handle = tokio::spawn(async move {
                let result = AssertUnwindSafe(provider.fetch_odds(&sport)).catch_unwind().await;
                match result {
                    Ok(Ok(games)) => {
                        info!(sport = %sport, provider = provider.name(), games = games.len(), "Provider fetch succeeded");
                        accumulator.lock().push(ProviderBatch { provider: provider.name().to_string(), games });
                        Ok(())
                    }
                    Ok(Err(e)) => {
                        error!(sport = %sport, provider = provider.name(), error = %e, "Provider fetch failed");
                        Err(e.to_string())
                    }
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        error!(sport = %sport, provider = provider.name(), panic = %message, "Provider fetch panicked");
                        Err(format!("panicked: {}", message))
                    }
                }
            });
            handles.push((name, handle));
        }

        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(())) => summary.providers_ok += 1,
                Ok(Err(reason)) => {
                    summary.providers_failed += 1;
                    summary.errors.push(format!("{}: {}", name, reason));
                }
                Err(join_error) => {
                    error!(sport, provider = %name, error = %join_error, "Provider task did not complete");
                    summary.providers_failed += 1;
                    summary.errors.push(format!("{}: {}", name, join_error));
                }
            }
        }

        let batches = match Arc::try_unwrap(accumulator) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => std::mem::take(&mut *shared.lock()),
        };

        self.persist(batches, &mut summary).await;

        info!(
            sport,
            providers_ok = summary.providers_ok,
            providers_failed = summary.providers_failed,
            games_persisted = summary.games_persisted,
            odds_persisted = summary.odds_persisted,
            duplicates_dropped = summary.duplicates_dropped,
            "Run complete"
        );

        summary
    }

    async fn persist(&self, batches: Vec<ProviderBatch>, summary: &mut RunSummary) {
        let mut seen: HashSet<OddsKey> = HashSet::new();

        for batch in batches {
            for game in batch.games {
                summary.games_fetched += 1;

                let mut quotes = Vec::with_capacity(game.quotes.len());
                for quote in game.quotes {
                    let key = (
                        game.sport.clone(),
                        game.external_id.clone(),
                        batch.provider.clone(),
                        quote.market.clone(),
                        quote.selection.clone(),
                    );
                    if seen.insert(key) {
                        quotes.push(quote);
                    } else {
                        summary.duplicates_dropped += 1;
                        warn!(
                            sport = %game.sport,
                            game = %game.external_id,
                            provider = %batch.provider,
                            market = %quote.market,
                            selection = %quote.selection,
                            "Dropping duplicate odds"
                        );
                    }
                }

                let new_game =
                    NewGame::new(game.sport, game.external_id, game.home_team, game.away_team, game.start_time);
                let game_id = match self.store.upsert_game(&new_game).await {
                    Ok(id) => {
                        summary.games_persisted += 1;
                        id
                    }
                    Err(e) => {
                        summary.games_failed += 1;
                        error!(
                            sport = %new_game.sport,
                            game = %new_game.external_id,
                            provider = %batch.provider,
                            skipped_odds = quotes.len(),
                            error = %e,
                            "Failed to upsert game"
                        );
                        continue;
                    }
                };

                for quote in quotes {
                    let odds = NewOdds::new(game_id, batch.provider.clone(), quote.market, quote.selection, quote.odds);
                    match self.store.insert_odds(&odds).await {
                        Ok(_) => summary.odds_persisted += 1,
                        Err(e) => {
                            summary.odds_failed += 1;
                            error!(
                                game_id = %game_id,
                                provider = %batch.provider,
                                market = %odds.market,
                                selection = %odds.selection,
                                error = %e,
                                "Failed to insert odds"
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
