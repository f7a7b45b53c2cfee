//! Mock providers shared by the test modules

use odds_providers::{FetchResult, NormalizedGame, OddsProvider, ProviderError, ProviderRegistry};
use odds_store::OddsStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::Orchestrator;

#[derive(Clone)]
pub enum Behavior {
    Games(Vec<NormalizedGame>),
    Fail,
    Panic,
}

pub struct MockProvider {
    name: String,
    sports: Vec<String>,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &str, sports: &[&str], behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            sports: sports.iter().map(|s| s.to_string()).collect(),
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(name: &str, sports: &[&str], games: Vec<NormalizedGame>) -> Self {
        Self::new(name, sports, Behavior::Games(games))
    }

    pub fn failing(name: &str, sports: &[&str]) -> Self {
        Self::new(name, sports, Behavior::Fail)
    }

    pub fn panicking(name: &str, sports: &[&str]) -> Self {
        Self::new(name, sports, Behavior::Panic)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl OddsProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn sports_mapping(&self) -> HashMap<String, String> {
        self.sports.iter().enumerate().map(|(i, s)| ((i + 1).to_string(), s.clone())).collect()
    }

    async fn fetch_odds(&self, sport: &str) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Games(games) => Ok(games.iter().filter(|g| g.sport == sport).cloned().collect()),
            Behavior::Fail => Err(ProviderError::Status(503)),
            Behavior::Panic => panic!("{} exploded while parsing", self.name),
        }
    }
}

/// One game with a single home moneyline quote
pub fn moneyline_game(sport: &str, external_id: &str, home: &str, away: &str, odds: f64) -> NormalizedGame {
    NormalizedGame::new(sport, external_id, home, away).with_quote("Moneyline", "Home", odds)
}

pub fn registry(providers: &[Arc<MockProvider>]) -> ProviderRegistry {
    providers.iter().fold(ProviderRegistry::new(), |registry, provider| {
        let provider: Arc<dyn OddsProvider> = provider.clone();
        registry.register(provider).unwrap()
    })
}

pub fn orchestrator(providers: &[Arc<MockProvider>], store: Arc<dyn OddsStore>) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(registry(providers), store))
}
