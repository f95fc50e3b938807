//! Options strategy screening engine for Stratify
//!
//! This crate evaluates seven option strategy shapes against every listed
//! expiration of a symbol, scores each candidate and ranks the results with
//! a diversification pass.
//!
//! # Core Components
//!
//! - [`numeric`] - Normal CDF, clamping and rounding helpers
//! - [`volatility`] - Historical volatility and IV/HV blending
//! - [`probability`] - Lognormal profit probabilities over price bands
//! - [`scoring`] - Risk transforms, ROI and the composite score
//! - [`selection`] - Strike ladders and per-strategy fallback tiers
//! - [`strategies`] - The seven evaluators behind the [`Strategy`] trait
//! - [`ranking`] - Diversified top-N ranking and result filters
//! - [`screener`] - Concurrent multi-symbol screening over a
//!   [`MarketDataProvider`](market_data::MarketDataProvider)
//! - `api` - Axum routes (feature `api`)
//!
//! # Key Invariants
//!
//! - Every probability is in `[0, 100]` and every risk score in `[0, 100]`
//! - Sigma is never below the volatility floor
//! - A failed (strategy, expiration) evaluation is skipped and counted,
//!   never fatal to the symbol
//! - Ranking is deterministic: stable sort, ties keep evaluation order

pub mod error;
pub mod numeric;
pub mod probability;
pub mod ranking;
pub mod request;
pub mod scoring;
pub mod screener;
pub mod selection;
pub mod strategies;
pub mod types;
pub mod volatility;

#[cfg(feature = "api")]
pub mod api;

pub use error::{ScreenError, SkipReason, StrategyError};
pub use ranking::{rank_candidates, ResultFilters};
pub use request::{ScreenRequest, ScreenResponse, StrategyRequest, StrategyResponse, SymbolReport, SymbolList};
pub use screener::{Ranking, Screener, ScreenerSettings};
pub use strategies::{evaluate, EvaluationContext, Strategy};
pub use types::{
    EvaluationConfig, Leg, ScoringWeights, SelectionParams, StrategyCandidate, VolatilityEstimate,
    VolatilitySource,
};

/// Result type for strategy evaluation
pub type Result<T> = std::result::Result<T, StrategyError>;
