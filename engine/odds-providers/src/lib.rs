//! # Odds Providers
//!
//! Sportsbook adapters that fetch odds and normalize them into a common schema.
//!
//! ## Architecture
//!
//! - **OddsProvider**: capability trait (sport mapping + fetch for one canonical sport)
//! - **ProviderRegistry**: explicit, statically declared set of providers
//! - **DraftKingsProvider**: league endpoint client and response parser
//!
//! ## Usage
//!
//! ```rust
//! use odds_providers::{default_registry, OddsProvider, ProvidersConfig};
//!
//! let registry = default_registry(&ProvidersConfig::default()).unwrap();
//! for provider in registry.for_sport("NFL") {
//!     println!("{} covers NFL", provider.name());
//! }
//! ```

pub mod config;
pub mod draftkings;
pub mod error;
pub mod models;
pub mod provider;
pub mod registry;

pub use config::{DraftKingsConfig, ProvidersConfig};
pub use draftkings::DraftKingsProvider;
pub use error::{ProviderError, RegistryError};
pub use models::{FetchResult, MarketQuote, NormalizedGame};
pub use provider::OddsProvider;
pub use registry::{default_registry, ProviderRegistry};
