//! Engine configuration values and evaluation output

use chrono::{DateTime, NaiveDate, Utc};
use common::{LegAction, OptionContract, OptionType, StrategyKind};
use serde::{Deserialize, Serialize};

/// Composite score weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub probability: f64,
    pub roi: f64,
    pub risk: f64,
    /// ROI multiplier applied before clamping
    #[serde(default = "config::default_roi_scale")]
    pub roi_scale: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::from(&config::ScoringConfig::default())
    }
}

impl From<&config::ScoringConfig> for ScoringWeights {
    fn from(c: &config::ScoringConfig) -> Self {
        Self {
            probability: c.probability_weight,
            roi: c.roi_weight,
            risk: c.risk_weight,
            roi_scale: c.roi_scale,
        }
    }
}

/// Strike selection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionParams {
    /// Minimum out-of-the-money distance, in percent of spot
    pub otm_percent: f64,
    /// Target spread width, in dollars
    pub spread_width: f64,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self::from(&config::SelectionConfig::default())
    }
}

impl From<&config::SelectionConfig> for SelectionParams {
    fn from(c: &config::SelectionConfig) -> Self {
        Self {
            otm_percent: c.min_otm_percent,
            spread_width: c.min_spread_width,
        }
    }
}

/// Everything a single evaluation depends on besides market data.
///
/// Built once from configuration; per-request overrides produce a new
/// value rather than mutating a shared one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub scoring: ScoringWeights,
    pub selection: SelectionParams,
    pub risk_free_rate: f64,
    pub history_window_days: u32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self::from_config(&config::StratifyConfig::default())
    }
}

impl EvaluationConfig {
    pub fn from_config(c: &config::StratifyConfig) -> Self {
        Self {
            scoring: ScoringWeights::from(&c.scoring),
            selection: SelectionParams::from(&c.selection),
            risk_free_rate: c.pricing.risk_free_rate,
            history_window_days: c.engine.history_window_days,
        }
    }

    /// Copy with selection overrides applied
    pub fn with_selection(self, otm_percent: Option<f64>, spread_width: Option<f64>) -> Self {
        Self {
            selection: SelectionParams {
                otm_percent: otm_percent.unwrap_or(self.selection.otm_percent),
                spread_width: spread_width.unwrap_or(self.selection.spread_width),
            },
            ..self
        }
    }

    /// Copy with different scoring weights
    pub fn with_scoring(self, scoring: ScoringWeights) -> Self {
        Self { scoring, ..self }
    }
}

/// Where the sigma used for probabilities came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilitySource {
    Blended,
    HistoricalOnly,
    ImpliedOnly,
    /// Neither input was usable; the floor was applied
    Floor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityEstimate {
    /// Chain implied volatility, if any leg reported one
    pub implied: Option<f64>,
    pub historical: f64,
    /// Annualized sigma used by the probability model
    pub sigma: f64,
    pub source: VolatilitySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_factor: Option<f64>,
}

/// One leg of a position, priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub action: LegAction,
    pub option_type: OptionType,
    pub strike: f64,
    /// Per-share price the leg trades at
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_volatility: Option<f64>,
}

impl Leg {
    pub fn new(contract: &OptionContract, action: LegAction, price: f64) -> Self {
        Self {
            action,
            option_type: contract.option_type,
            strike: contract.strike,
            price,
            implied_volatility: contract.usable_iv(),
        }
    }
}

/// Contract multiplier for US equity options
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Per-share dollar amount expressed per contract
pub fn per_contract(x: f64) -> f64 {
    x * CONTRACT_MULTIPLIER
}

/// A fully evaluated strategy for one symbol and expiration.
///
/// Dollar amounts are per share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyCandidate {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub expiration: NaiveDate,
    pub days_to_expiry: i64,
    pub spot: Option<f64>,
    pub price_timestamp: Option<DateTime<Utc>>,
    pub legs: Vec<Leg>,
    pub short_strike: Option<String>,
    pub long_strike: Option<String>,
    /// Positive for a credit received, negative for a debit paid
    pub net_premium: f64,
    /// None when the upside is open-ended
    pub max_profit: Option<f64>,
    pub max_loss: f64,
    pub roi_percent: f64,
    pub prob_any_profit: f64,
    pub prob_max_profit: f64,
    pub breakevens: Vec<f64>,
    pub risk_score: f64,
    pub composite_score: f64,
    pub volatility: VolatilityEstimate,
    pub rsi: Option<f64>,
    pub earnings_before_expiry: bool,
}

impl StrategyCandidate {
    pub fn is_credit(&self) -> bool {
        self.net_premium > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_config() {
        let cfg = EvaluationConfig::default();
        assert_eq!(cfg.scoring.probability, 0.70);
        assert_eq!(cfg.scoring.roi, 0.20);
        assert_eq!(cfg.scoring.risk, 0.10);
        assert_eq!(cfg.scoring.roi_scale, 1.5);
        assert_eq!(cfg.selection.otm_percent, 2.5);
        assert_eq!(cfg.selection.spread_width, 5.0);
        assert_eq!(cfg.risk_free_rate, 0.045);
        assert_eq!(cfg.history_window_days, 90);
    }

    #[test]
    fn test_overrides_do_not_mutate() {
        let base = EvaluationConfig::default();
        let custom = base.with_selection(Some(5.0), None);
        assert_eq!(custom.selection.otm_percent, 5.0);
        assert_eq!(custom.selection.spread_width, 5.0);
        assert_eq!(base.selection.otm_percent, 2.5);
    }

    #[test]
    fn test_weights_deserialize_without_scale() {
        let w: ScoringWeights =
            serde_json::from_str(r#"{"probability": 0.5, "roi": 0.3, "risk": 0.2}"#).unwrap();
        assert_eq!(w.roi_scale, 1.5);
    }

    #[test]
    fn test_per_contract() {
        assert_eq!(per_contract(0.8), 80.0);
    }
}
