//! Strategy engine error types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single (strategy, expiration) evaluation produced no candidate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// The chain side the strategy needs is empty
    #[error("no options available")]
    NoOptionsAvailable,

    /// The provider failed to return the chain
    #[error("chain fetch failed: {0}")]
    ChainFetchFailed(String),

    /// The chain fetch exceeded the per-fetch timeout
    #[error("chain fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    /// A selected leg has neither a usable quote nor a last price
    #[error("no pricing data")]
    NoPricingData,
}

impl StrategyError {
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::NoOptionsAvailable => SkipReason::NoOptionsAvailable,
            Self::ChainFetchFailed(_) => SkipReason::ChainFetchFailed,
            Self::FetchTimeout(_) => SkipReason::FetchTimeout,
            Self::NoPricingData => SkipReason::NoPricingData,
        }
    }
}

/// Tag used to count skipped evaluations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoOptionsAvailable,
    ChainFetchFailed,
    FetchTimeout,
    NoPricingData,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoOptionsAvailable => "no_options_available",
            Self::ChainFetchFailed => "chain_fetch_failed",
            Self::FetchTimeout => "fetch_timeout",
            Self::NoPricingData => "no_pricing_data",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbol-level failures reported in place of a strategy list
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScreenError {
    #[error("no options available")]
    NoExpirations,

    #[error("no expirations within range")]
    NoExpirationsInRange,

    #[error("failed to fetch market data: {0}")]
    MarketData(String),

    #[error("all strategy evaluations failed ({0})")]
    AllEvaluationsFailed(String),
}
