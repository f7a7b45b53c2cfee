//! Error types for providers and the provider registry

use thiserror::Error;

/// Errors a provider can return from a fetch
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Sport not supported by provider: {0}")]
    UnsupportedSport(String),

    #[error("Provider error: {0}")]
    Other(String),
}

impl ProviderError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Errors raised while building a registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Provider already registered: {0}")]
    DuplicateProvider(String),

    #[error("Failed to construct provider {name}: {source}")]
    Construction {
        name: String,
        #[source]
        source: ProviderError,
    },
}
