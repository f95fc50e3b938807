//! Volatility estimation: historical volatility from daily closes, blended
//! with chain implied volatility.

use chrono::Duration;
use common::{DailyClose, UnderlyingSnapshot};
use tracing::debug;

use crate::numeric::positive;
use crate::types::{VolatilityEstimate, VolatilitySource};

pub const IV_WEIGHT: f64 = 0.7;
pub const HV_WEIGHT: f64 = 0.3;

/// Below this, chain IV is treated as suspect and historical dominates
pub const LOW_IV_THRESHOLD: f64 = 0.10;
pub const LOW_IV_WEIGHT: f64 = 0.2;

/// Minimum sigma handed to the probability model
pub const VOL_FLOOR: f64 = 0.20;

/// Historical volatility used when history is too short
pub const FALLBACK_HISTORICAL_VOL: f64 = 0.30;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Two log returns are the minimum for a sample standard deviation
const MIN_CLOSES: usize = 3;

/// Annualized standard deviation of daily log returns over the trailing
/// `window_days` calendar days.
///
/// Returns [`FALLBACK_HISTORICAL_VOL`] when fewer than three usable closes
/// remain or the result is not finite.
pub fn historical_volatility(history: &[DailyClose], window_days: u32) -> f64 {
    let closes: Vec<f64> = match history.last() {
        Some(last) => {
            let cutoff = last.date - Duration::days(i64::from(window_days));
            history
                .iter()
                .filter(|c| c.date > cutoff)
                .filter_map(|c| positive(c.close))
                .collect()
        }
        None => Vec::new(),
    };

    if closes.len() < MIN_CLOSES {
        debug!(
            closes = closes.len(),
            fallback = FALLBACK_HISTORICAL_VOL,
            "Insufficient price history; using fallback volatility"
        );
        return FALLBACK_HISTORICAL_VOL;
    }

    let returns: Vec<f64> = closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let annualized = variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();

    if annualized.is_finite() {
        annualized
    } else {
        FALLBACK_HISTORICAL_VOL
    }
}

/// Combine implied and historical volatility, then apply [`VOL_FLOOR`].
///
/// Non-positive or NaN inputs count as absent.
pub fn blend(implied: Option<f64>, historical: f64) -> VolatilityEstimate {
    let iv = implied.and_then(positive);
    let hv = positive(historical);

    let (raw, source) = match (iv, hv) {
        (Some(iv), Some(hv)) if iv < LOW_IV_THRESHOLD => (
            LOW_IV_WEIGHT * iv + (1.0 - LOW_IV_WEIGHT) * hv,
            VolatilitySource::Blended,
        ),
        (Some(iv), Some(hv)) => (IV_WEIGHT * iv + HV_WEIGHT * hv, VolatilitySource::Blended),
        (Some(iv), None) => (iv, VolatilitySource::ImpliedOnly),
        (None, Some(hv)) => (hv, VolatilitySource::HistoricalOnly),
        (None, None) => (VOL_FLOOR, VolatilitySource::Floor),
    };

    VolatilityEstimate {
        implied: iv,
        historical,
        sigma: raw.max(VOL_FLOOR),
        source,
        put_sigma: None,
        call_sigma: None,
        skew_factor: None,
    }
}

/// Estimate sigma for a position from its chain IV and the underlying's history
pub fn estimate(
    chain_iv: Option<f64>,
    underlying: &UnderlyingSnapshot,
    window_days: u32,
) -> VolatilityEstimate {
    blend(chain_iv, historical_volatility(&underlying.history, window_days))
}

/// Skew multiplier from the spread of the legs' implied volatilities.
///
/// `1 + (max - min) / 2` over the positive IVs, or `1.0` when none are usable.
pub fn skew_factor(ivs: impl IntoIterator<Item = f64>) -> f64 {
    let (lo, hi) = ivs
        .into_iter()
        .filter_map(positive)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), iv| {
            (lo.min(iv), hi.max(iv))
        });
    if lo.is_finite() {
        1.0 + (hi - lo) * 0.5
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> Vec<DailyClose> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| DailyClose::new(start + Duration::days(i as i64), c))
            .collect()
    }

    #[test]
    fn test_blend_normal() {
        let est = blend(Some(0.30), 0.20);
        assert!((est.sigma - 0.27).abs() < 1e-12);
        assert_eq!(est.source, VolatilitySource::Blended);
    }

    #[test]
    fn test_blend_low_iv_leans_on_history() {
        let est = blend(Some(0.05), 0.40);
        assert!((est.sigma - (0.2 * 0.05 + 0.8 * 0.40)).abs() < 1e-12);
    }

    #[test]
    fn test_blend_single_sources_and_floor() {
        let iv_only = blend(Some(0.35), 0.0);
        assert_eq!(iv_only.sigma, 0.35);
        assert_eq!(iv_only.source, VolatilitySource::ImpliedOnly);

        let hv_only = blend(None, 0.25);
        assert_eq!(hv_only.sigma, 0.25);
        assert_eq!(hv_only.source, VolatilitySource::HistoricalOnly);

        let neither = blend(Some(f64::NAN), -1.0);
        assert_eq!(neither.sigma, VOL_FLOOR);
        assert_eq!(neither.source, VolatilitySource::Floor);

        let floored = blend(Some(0.12), 0.10);
        assert_eq!(floored.sigma, VOL_FLOOR);
    }

    #[test]
    fn test_sigma_never_below_floor() {
        for iv in [None, Some(0.0), Some(0.01), Some(0.09), Some(0.5), Some(f64::NAN)] {
            for hv in [0.0, 0.01, 0.15, 0.6, f64::NAN] {
                assert!(blend(iv, hv).sigma >= VOL_FLOOR);
            }
        }
    }

    #[test]
    fn test_historical_volatility_known_value() {
        // alternating +/- 1% moves
        let closes = [100.0, 101.0, 100.0, 101.0, 100.0];
        let hv = historical_volatility(&series(&closes), 90);

        let up = (101.0f64 / 100.0).ln();
        let returns = [up, -up, up, -up];
        let mean = 0.0;
        let var = returns.iter().map(|r: &f64| (r - mean).powi(2)).sum::<f64>() / 3.0;
        let expected = var.sqrt() * 252f64.sqrt();
        assert!((hv - expected).abs() < 1e-12);
    }

    #[test]
    fn test_historical_volatility_fallback() {
        assert_eq!(historical_volatility(&[], 90), FALLBACK_HISTORICAL_VOL);
        assert_eq!(
            historical_volatility(&series(&[100.0, 101.0]), 90),
            FALLBACK_HISTORICAL_VOL
        );
        // bad closes are dropped before counting
        assert_eq!(
            historical_volatility(&series(&[100.0, -1.0, f64::NAN, 101.0]), 90),
            FALLBACK_HISTORICAL_VOL
        );
    }

    #[test]
    fn test_historical_volatility_window() {
        // a wild stretch outside the window must not matter
        let mut closes = vec![100.0, 200.0, 50.0, 300.0];
        closes.extend(std::iter::repeat(100.0).take(40));
        let hv = historical_volatility(&series(&closes), 30);
        assert_eq!(hv, 0.0);
        assert!(historical_volatility(&series(&closes), 90) > 1.0);
    }

    #[test]
    fn test_estimate_uses_history() {
        let snap = UnderlyingSnapshot::new("X");
        let est = estimate(Some(0.4), &snap, 90);
        assert!((est.sigma - (0.7 * 0.4 + 0.3 * FALLBACK_HISTORICAL_VOL)).abs() < 1e-12);
    }

    #[test]
    fn test_skew_factor() {
        assert!((skew_factor([0.40, 0.20]) - 1.10).abs() < 1e-12);
        assert_eq!(skew_factor([0.0, f64::NAN]), 1.0);
        assert_eq!(skew_factor(std::iter::empty()), 1.0);
        assert_eq!(skew_factor([0.3]), 1.0);
    }
}
