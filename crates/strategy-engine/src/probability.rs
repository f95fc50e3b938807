//! Lognormal probability model for terminal underlying prices.
//!
//! A position's payoff region is described as a [`ProfitBand`]: the range
//! of terminal prices in which it is profitable. The model turns a band
//! into a percentage.

use serde::{Deserialize, Serialize};

use crate::numeric::{clamp_unit, norm_cdf, positive, years_to_expiry};

/// Probability reported when inputs are degenerate
pub const NEUTRAL_PROBABILITY: f64 = 50.0;

/// Near-expiry floor when spot sits outside the band
pub const NEAR_EXPIRY_FLOOR: f64 = 5.0;

/// Near-expiry ceiling
pub const NEAR_EXPIRY_CEILING: f64 = 95.0;

/// One edge of a profit band with the sigma used to price it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub level: f64,
    pub sigma: f64,
}

impl Bound {
    pub fn new(level: f64, sigma: f64) -> Self {
        Self { level, sigma }
    }
}

/// Terminal price range `lower < S_T < upper`; a missing edge is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfitBand {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl ProfitBand {
    /// `S_T > level`
    pub fn above(level: f64, sigma: f64) -> Self {
        Self {
            lower: Some(Bound::new(level, sigma)),
            upper: None,
        }
    }

    /// `S_T < level`
    pub fn below(level: f64, sigma: f64) -> Self {
        Self {
            lower: None,
            upper: Some(Bound::new(level, sigma)),
        }
    }

    /// `lower < S_T < upper`
    pub fn between(lower: Bound, upper: Bound) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }
}

/// Probability model for one underlying and expiration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityModel {
    spot: Option<f64>,
    days_to_expiry: i64,
    /// Risk-free rate net of dividend yield
    rate: f64,
}

impl ProbabilityModel {
    pub fn new(spot: Option<f64>, days_to_expiry: i64, rate: f64) -> Self {
        Self {
            spot: spot.and_then(positive),
            days_to_expiry,
            rate: if rate.is_finite() { rate } else { 0.0 },
        }
    }

    pub fn years(&self) -> f64 {
        years_to_expiry(self.days_to_expiry)
    }

    /// Risk-neutral drift `μ = r − σ²/2`
    pub fn drift(&self, sigma: f64) -> f64 {
        self.rate - 0.5 * sigma * sigma
    }

    fn z(&self, log_ratio: f64, sigma: f64) -> f64 {
        let t = self.years();
        (log_ratio - self.drift(sigma) * t) / (sigma * t.sqrt())
    }

    /// Fraction of outcomes with `S_T > level`: `Φ((ln(S/K) − μT) / (σ√T))`
    pub fn prob_above(&self, level: f64, sigma: f64) -> Option<f64> {
        let spot = self.spot?;
        let sigma = positive(sigma)?;
        let level = positive(level)?;
        Some(norm_cdf(self.z((spot / level).ln(), sigma)))
    }

    /// Fraction of outcomes with `S_T < level`: `Φ((ln(K/S) − μT) / (σ√T))`
    pub fn prob_below(&self, level: f64, sigma: f64) -> Option<f64> {
        let spot = self.spot?;
        let sigma = positive(sigma)?;
        let level = positive(level)?;
        Some(norm_cdf(self.z((level / spot).ln(), sigma)))
    }

    /// Probability, in percent, that the terminal price lands in `band`.
    ///
    /// Missing spot or a non-positive sigma gives [`NEUTRAL_PROBABILITY`].
    /// Under one day to expiry the closed form is replaced by a linear
    /// interpolation between [`NEAR_EXPIRY_FLOOR`] and [`NEAR_EXPIRY_CEILING`].
    pub fn probability(&self, band: &ProfitBand) -> f64 {
        let Some(spot) = self.spot else {
            return NEUTRAL_PROBABILITY;
        };
        let sigmas_ok = [band.lower, band.upper]
            .iter()
            .flatten()
            .all(|b| positive(b.sigma).is_some());
        if !sigmas_ok {
            return NEUTRAL_PROBABILITY;
        }

        // S_T > 0 always holds, so a non-positive lower edge is no edge
        let lower = band.lower.filter(|b| positive(b.level).is_some());
        let upper = band.upper;
        if let Some(u) = upper {
            if !(u.level.is_finite() && u.level > 0.0) {
                return 0.0;
            }
        }

        if self.days_to_expiry < 1 {
            return near_expiry(spot, lower.map(|b| b.level), upper.map(|b| b.level));
        }

        let fraction = match (lower, upper) {
            (None, None) => Some(1.0),
            (Some(l), None) => self.prob_above(l.level, l.sigma),
            (None, Some(u)) => self.prob_below(u.level, u.sigma),
            (Some(l), Some(u)) => self
                .prob_below(u.level, u.sigma)
                .zip(self.prob_below(l.level, l.sigma))
                .map(|(below_upper, below_lower)| below_upper - below_lower),
        };

        match fraction {
            Some(p) => clamp_unit(p) * 100.0,
            None => NEUTRAL_PROBABILITY,
        }
    }
}

/// Linear stand-in for the closed form when expiry is under a day away.
///
/// Outside the band, or sitting on an edge: floor. Inside: `50 + 40 * distance / width`, capped at
/// the ceiling, where distance is to the nearer edge and width is the band
/// width (or spot, for a one-sided band).
fn near_expiry(spot: f64, lower: Option<f64>, upper: Option<f64>) -> f64 {
    let outside = lower.is_some_and(|l| spot <= l) || upper.is_some_and(|u| spot >= u);
    if outside {
        return NEAR_EXPIRY_FLOOR;
    }

    let (distance, width) = match (lower, upper) {
        (Some(l), Some(u)) => ((spot - l).min(u - spot), u - l),
        (Some(l), None) => (spot - l, spot),
        (None, Some(u)) => (u - spot, spot),
        (None, None) => return NEAR_EXPIRY_CEILING,
    };
    if width <= 0.0 {
        return NEUTRAL_PROBABILITY;
    }
    (50.0 + distance / width * 40.0).min(NEAR_EXPIRY_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(spot: f64, days: i64, rate: f64) -> ProbabilityModel {
        ProbabilityModel::new(Some(spot), days, rate)
    }

    #[test]
    fn test_prob_above_matches_formula() {
        let m = model(100.0, 21, 0.04);
        let t: f64 = 21.0 / 365.0;
        let mu = 0.04 - 0.5 * 0.25 * 0.25;
        let expected = norm_cdf(((100.0f64 / 97.0).ln() - mu * t) / (0.25 * t.sqrt()));
        let p = m.prob_above(97.0, 0.25).unwrap();
        assert_eq!(p, expected);
        assert!(p > 0.66 && p < 0.70);
    }

    #[test]
    fn test_prob_below_matches_formula() {
        let m = model(100.0, 30, 0.03);
        let t: f64 = 30.0 / 365.0;
        let mu = 0.03 - 0.5 * 0.3 * 0.3;
        let expected = norm_cdf(((105.0f64 / 100.0).ln() - mu * t) / (0.3 * t.sqrt()));
        assert_eq!(m.prob_below(105.0, 0.3).unwrap(), expected);
    }

    #[test]
    fn test_degenerate_inputs_are_neutral() {
        let band = ProfitBand::above(95.0, 0.25);
        assert_eq!(ProbabilityModel::new(None, 21, 0.04).probability(&band), 50.0);
        assert_eq!(
            ProbabilityModel::new(Some(f64::NAN), 21, 0.04).probability(&band),
            50.0
        );
        assert_eq!(model(100.0, 21, 0.04).probability(&ProfitBand::above(95.0, 0.0)), 50.0);
        assert_eq!(
            model(100.0, 21, 0.04).probability(&ProfitBand::below(105.0, -0.2)),
            50.0
        );
    }

    #[test]
    fn test_non_positive_lower_edge_is_certain() {
        let p = model(100.0, 21, 0.04).probability(&ProfitBand::above(-0.5, 0.3));
        assert_eq!(p, 100.0);
    }

    #[test]
    fn test_two_sided_band() {
        let m = model(100.0, 30, 0.04);
        let band = ProfitBand::between(Bound::new(95.0, 0.25), Bound::new(105.0, 0.25));
        let expected =
            (m.prob_below(105.0, 0.25).unwrap() - m.prob_below(95.0, 0.25).unwrap()) * 100.0;
        let p = m.probability(&band);
        assert!((p - expected).abs() < 1e-12);
        assert!(p > 0.0 && p < 100.0);
    }

    #[test]
    fn test_inverted_band_clamps_to_zero() {
        let m = model(100.0, 30, 0.04);
        let band = ProfitBand::between(Bound::new(110.0, 0.25), Bound::new(90.0, 0.25));
        assert_eq!(m.probability(&band), 0.0);
    }

    #[test]
    fn test_near_expiry_interpolation() {
        let m = model(100.0, 0, 0.04);
        let band = ProfitBand::between(Bound::new(90.0, 0.25), Bound::new(110.0, 0.25));
        // centered: 50 + (10/20)*40
        assert_eq!(m.probability(&band), 70.0);

        let outside = ProfitBand::between(Bound::new(101.0, 0.25), Bound::new(110.0, 0.25));
        assert_eq!(m.probability(&outside), 5.0);

        // spot on a bounding strike counts as outside
        let edge = ProfitBand::between(Bound::new(100.0, 0.25), Bound::new(110.0, 0.25));
        assert_eq!(m.probability(&edge), 5.0);
        let upper_edge = ProfitBand::between(Bound::new(90.0, 0.25), Bound::new(100.0, 0.25));
        assert_eq!(m.probability(&upper_edge), 5.0);
        assert_eq!(m.probability(&ProfitBand::above(100.0, 0.25)), 5.0);

        let one_sided = ProfitBand::above(50.0, 0.25);
        // 50 + (50/100)*40
        assert_eq!(m.probability(&one_sided), 70.0);
        assert_eq!(m.probability(&ProfitBand::above(10.0, 0.25)), 86.0);
        assert_eq!(m.probability(&ProfitBand::below(99.0, 0.25)), 5.0);
    }

    #[test]
    fn test_probability_bounded() {
        for days in [1, 7, 30, 365] {
            for sigma in [0.2, 0.5, 1.5] {
                for level in [1.0, 50.0, 99.0, 100.0, 101.0, 200.0, 1e6] {
                    let m = model(100.0, days, 0.045);
                    for band in [ProfitBand::above(level, sigma), ProfitBand::below(level, sigma)] {
                        let p = m.probability(&band);
                        assert!((0.0..=100.0).contains(&p), "p={} level={}", p, level);
                    }
                }
            }
        }
    }

    #[test]
    fn test_higher_spot_never_lowers_short_put_odds() {
        let band = ProfitBand::above(95.0, 0.3);
        let mut last = 0.0;
        for spot in [90.0, 95.0, 100.0, 105.0, 110.0] {
            let p = model(spot, 21, 0.04).probability(&band);
            assert!(p >= last);
            last = p;
        }
    }
}
