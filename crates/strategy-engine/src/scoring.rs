//! Risk and composite scoring

use crate::numeric::{clamp_percent, positive, round_to};
use crate::types::ScoringWeights;

/// Risk score when spot is unavailable
pub const DEFAULT_RISK_SCORE: f64 = 50.0;

/// Linear map from strike distance (percent of spot) to a 0..=100 risk score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskTransform {
    /// `slope * d`: farther out of the money scores higher
    Rising { slope: f64 },
    /// `100 - slope * d`: farther out of the money scores lower
    Falling { slope: f64 },
}

impl RiskTransform {
    pub fn apply(&self, distance_percent: f64) -> f64 {
        let raw = match *self {
            RiskTransform::Rising { slope } => slope * distance_percent,
            RiskTransform::Falling { slope } => 100.0 - slope * distance_percent,
        };
        clamp_percent(raw)
    }

    /// Score a strike distance, or [`DEFAULT_RISK_SCORE`] without a distance
    pub fn score(&self, distance_percent: Option<f64>) -> f64 {
        match distance_percent {
            Some(d) => self.apply(d),
            None => DEFAULT_RISK_SCORE,
        }
    }
}

/// `(spot - strike) / spot` in percent
pub fn percent_below(spot: Option<f64>, strike: f64) -> Option<f64> {
    spot.and_then(positive).map(|s| (s - strike) / s * 100.0)
}

/// `(strike - spot) / spot` in percent
pub fn percent_above(spot: Option<f64>, strike: f64) -> Option<f64> {
    spot.and_then(positive).map(|s| (strike - s) / s * 100.0)
}

/// Return on capital at risk, in percent; zero when nothing is at risk
pub fn roi_on_risk(profit: f64, at_risk: f64) -> f64 {
    if at_risk > 0.0 && profit.is_finite() {
        profit / at_risk * 100.0
    } else {
        0.0
    }
}

/// Weighted blend of probability, scaled ROI and risk, rounded to 2 decimals.
///
/// Each component is clamped to 0..=100 before weighting, so with
/// non-negative weights summing to one the result stays in 0..=100.
pub fn composite_score(weights: &ScoringWeights, probability: f64, roi: f64, risk: f64) -> f64 {
    let score = weights.probability * clamp_percent(probability)
        + weights.roi * clamp_percent(roi * weights.roi_scale)
        + weights.risk * clamp_percent(risk);
    round_to(score, 2)
}
