//! Request and response types for screening
//!
//! Every field except `symbols` is optional; absent values fall back to the
//! screener's configured defaults.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{StrategyKind, Symbol};
use serde::{Deserialize, Serialize};

use crate::error::SkipReason;
use crate::ranking::ResultFilters;
use crate::types::{ScoringWeights, StrategyCandidate};

/// Symbols as sent by clients: a list, a single symbol, or a comma-separated string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolList {
    Many(Vec<String>),
    One(String),
}

impl Default for SymbolList {
    fn default() -> Self {
        SymbolList::Many(Vec::new())
    }
}

impl SymbolList {
    /// Trimmed, upper-cased and de-duplicated, in first-seen order
    pub fn normalized(&self) -> Vec<Symbol> {
        let raw: Vec<&str> = match self {
            SymbolList::Many(items) => items.iter().flat_map(|s| s.split(',')).collect(),
            SymbolList::One(s) => s.split(',').collect(),
        };
        let mut out: Vec<Symbol> = Vec::with_capacity(raw.len());
        for s in raw {
            let symbol = Symbol::new(s);
            if !symbol.is_empty() && !out.contains(&symbol) {
                out.push(symbol);
            }
        }
        out
    }
}

impl<S: Into<String>> FromIterator<S> for SymbolList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        SymbolList::Many(iter.into_iter().map(Into::into).collect())
    }
}

/// A multi-symbol screening request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenRequest {
    pub symbols: SymbolList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otm_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<ScoringWeights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ResultFilters>,
}

impl ScreenRequest {
    pub fn new<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = Some(max_days);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn with_otm_percent(mut self, otm_percent: f64) -> Self {
        self.otm_percent = Some(otm_percent);
        self
    }

    pub fn with_spread_width(mut self, spread_width: f64) -> Self {
        self.spread_width = Some(spread_width);
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_filters(mut self, filters: ResultFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.symbols.normalized()
    }

    /// Reject requests that cannot produce a meaningful screen
    pub fn validate(&self) -> common::Result<()> {
        if self.symbols().is_empty() {
            return Err(common::Error::invalid_input("at least one symbol is required"));
        }
        validate_overrides(self.max_days, self.otm_percent, self.spread_width)?;
        if let Some(w) = &self.weights {
            let all = [w.probability, w.roi, w.risk];
            if all.iter().any(|x| !x.is_finite() || *x < 0.0) {
                return Err(common::Error::invalid_input("weights must be non-negative"));
            }
            let sum: f64 = all.iter().sum();
            if (sum - 1.0).abs() > config::WEIGHT_SUM_TOLERANCE {
                return Err(common::Error::invalid_input(format!(
                    "weights must sum to 1.0 (got {})",
                    sum
                )));
            }
            if !(w.roi_scale.is_finite() && w.roi_scale > 0.0) {
                return Err(common::Error::invalid_input("roi_scale must be positive"));
            }
        }
        Ok(())
    }
}

fn validate_overrides(
    max_days: Option<u32>,
    otm_percent: Option<f64>,
    spread_width: Option<f64>,
) -> common::Result<()> {
    if max_days == Some(0) {
        return Err(common::Error::invalid_input("max_days must be at least 1"));
    }
    if let Some(otm) = otm_percent {
        if !(0.0..100.0).contains(&otm) {
            return Err(common::Error::invalid_input(format!(
                "otm_percent must be in [0, 100), got {}",
                otm
            )));
        }
    }
    if let Some(width) = spread_width {
        if !(width.is_finite() && width > 0.0) {
            return Err(common::Error::invalid_input(format!(
                "spread_width must be positive, got {}",
                width
            )));
        }
    }
    Ok(())
}

/// Per-symbol outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolReport {
    Ranked {
        symbol: String,
        strategies: Vec<StrategyCandidate>,
        skipped: BTreeMap<SkipReason, usize>,
    },
    Failed {
        symbol: String,
        error: String,
        skipped: BTreeMap<SkipReason, usize>,
    },
}

impl SymbolReport {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolReport::Ranked { symbol, .. } | SymbolReport::Failed { symbol, .. } => symbol,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SymbolReport::Ranked { .. })
    }

    pub fn strategies(&self) -> &[StrategyCandidate] {
        match self {
            SymbolReport::Ranked { strategies, .. } => strategies,
            SymbolReport::Failed { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SymbolReport::Failed { error, .. } => Some(error),
            SymbolReport::Ranked { .. } => None,
        }
    }

    pub fn skipped(&self) -> &BTreeMap<SkipReason, usize> {
        match self {
            SymbolReport::Ranked { skipped, .. } | SymbolReport::Failed { skipped, .. } => skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenResponse {
    pub results: Vec<SymbolReport>,
    pub timestamp: DateTime<Utc>,
}

/// Overrides for a single-strategy evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyRequest {
    #[serde(default)]
    pub max_days: Option<u32>,
    #[serde(default)]
    pub otm_percent: Option<f64>,
    #[serde(default)]
    pub spread_width: Option<f64>,
}

impl StrategyRequest {
    pub fn validate(&self) -> common::Result<()> {
        validate_overrides(self.max_days, self.otm_percent, self.spread_width)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResponse {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub strategies: Vec<StrategyCandidate>,
}
