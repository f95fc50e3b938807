//! Numeric guards shared by the pricing, probability and scoring code

use std::f64::consts::SQRT_2;

/// Days per year used to convert days-to-expiry into years
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Floor on time to expiry, in years
pub const MIN_YEARS: f64 = 1e-6;

/// Standard normal CDF via the error function
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / SQRT_2))
}

/// Days to expiry as a fraction of a year, floored at [`MIN_YEARS`]
pub fn years_to_expiry(days: i64) -> f64 {
    (days as f64 / DAYS_PER_YEAR).max(MIN_YEARS)
}

/// Clamp a score or probability into 0..=100; NaN becomes 0
pub fn clamp_percent(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 100.0)
    }
}

/// Clamp a fraction into 0..=1; NaN becomes 0
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Round to `decimals` places
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}

/// Keep a value only if it is finite and strictly positive
pub fn positive(x: f64) -> Option<f64> {
    (x.is_finite() && x > 0.0).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf_values() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-15);
        assert!((norm_cdf(1.0) - 0.841_344_746_068_542_9).abs() < 1e-12);
        assert!((norm_cdf(-1.96) - 0.024_997_895_148_220_4).abs() < 1e-12);
        assert!(norm_cdf(40.0) == 1.0);
        assert!(norm_cdf(-40.0) < 1e-300);
    }

    #[test]
    fn test_norm_cdf_symmetry() {
        for x in [0.1, 0.5, 1.3, 2.7] {
            assert!((norm_cdf(x) + norm_cdf(-x) - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn test_years_floor() {
        assert_eq!(years_to_expiry(0), MIN_YEARS);
        assert_eq!(years_to_expiry(-3), MIN_YEARS);
        assert!((years_to_expiry(365) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(140.0), 100.0);
        assert_eq!(clamp_percent(-2.0), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 100.0);
        assert_eq!(clamp_unit(1.2), 1.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(71.23456, 2), 71.23);
        assert_eq!(round_to(0.005, 1), 0.0);
    }

    #[test]
    fn test_positive() {
        assert_eq!(positive(0.2), Some(0.2));
        assert_eq!(positive(0.0), None);
        assert_eq!(positive(f64::NAN), None);
    }
}
