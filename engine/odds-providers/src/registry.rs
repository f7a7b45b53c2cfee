//! Explicit provider registry

use crate::config::ProvidersConfig;
use crate::draftkings::{DraftKingsProvider, PROVIDER_NAME as DRAFTKINGS};
use crate::error::RegistryError;
use crate::provider::OddsProvider;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Providers known to the process, keyed by name
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn OddsProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. Names must be unique.
    pub fn register(mut self, provider: Arc<dyn OddsProvider>) -> Result<Self, RegistryError> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(RegistryError::DuplicateProvider(name));
        }

        self.providers.insert(name, provider);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn OddsProvider>> {
        self.providers.get(name).cloned()
    }

    /// Every provider that maps some sport id to `sport`
    pub fn for_sport(&self, sport: &str) -> Vec<Arc<dyn OddsProvider>> {
        self.providers.values().filter(|p| p.supports(sport)).cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry").field("providers", &self.names()).finish()
    }
}

/// Registry holding every enabled built-in provider
pub fn default_registry(config: &ProvidersConfig) -> Result<ProviderRegistry, RegistryError> {
    let mut registry = ProviderRegistry::new();

    if config.draftkings.enabled {
        let provider = DraftKingsProvider::new(config.draftkings.clone()).map_err(|source| {
            RegistryError::Construction { name: DRAFTKINGS.to_string(), source }
        })?;
        registry = registry.register(Arc::new(provider))?;
    }

    info!("Registered providers: {:?}", registry.names());
    Ok(registry)
}
