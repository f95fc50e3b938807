//! Technical indicators computed from daily closes

/// Relative strength index over the trailing `period` price changes.
///
/// Uses simple averages of gains and losses. Returns `None` when there are
/// fewer than `period + 1` closes or the series is flat.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return None;
    }

    let value = if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return None;
        }
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };

    Some((value * 10.0).round() / 10.0)
}
