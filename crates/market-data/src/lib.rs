//! Market data providers for Stratify
//!
//! This crate supplies the strategy engine with underlying snapshots and
//! option chains.
//!
//! # Core Components
//!
//! - [`provider`] - The [`MarketDataProvider`] trait the engine consumes
//! - [`static_provider`] - In-memory / JSON fixture provider
//! - [`yahoo`] - Yahoo Finance HTTP provider
//! - [`indicators`] - RSI and other indicators computed from closes
//!
//! # Key Invariants
//!
//! - Providers never rank or filter; they report what the market shows
//! - Chains come back normalized: usable strikes only, sorted ascending
//! - Expirations are `YYYY-MM-DD` strings; callers skip ones that don't parse

use std::sync::Arc;

use config::{ProviderConfig, ProviderKind};

pub mod error;
pub mod indicators;
pub mod provider;
pub mod static_provider;
pub mod yahoo;

pub use error::MarketDataError;
pub use provider::MarketDataProvider;
pub use static_provider::{MarketFixture, StaticMarketData};
pub use yahoo::YahooMarketData;

pub type Result<T> = std::result::Result<T, MarketDataError>;

/// Build the provider selected by configuration
pub fn provider_from_config(config: &ProviderConfig) -> Result<Arc<dyn MarketDataProvider>> {
    match config.kind {
        ProviderKind::Yahoo => Ok(Arc::new(YahooMarketData::new(config)?)),
        ProviderKind::Static => {
            let path = config
                .fixture_path
                .as_deref()
                .ok_or_else(|| MarketDataError::Fixture("fixture_path is not set".to_string()))?;
            Ok(Arc::new(StaticMarketData::from_file(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_without_fixture_path() {
        let config = ProviderConfig {
            kind: ProviderKind::Static,
            ..ProviderConfig::default()
        };
        assert!(matches!(
            provider_from_config(&config),
            Err(MarketDataError::Fixture(_))
        ));
    }

    #[test]
    fn test_yahoo_from_defaults() {
        let provider = provider_from_config(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.name(), "yahoo");
    }
}
