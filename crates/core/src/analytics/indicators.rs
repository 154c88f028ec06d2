//! Price-series primitives. Every function is total: short or degenerate input yields `None`.

/// Ordinary least squares of `values` against their index (0..n-1), evaluated at index n.
pub fn linear_trend_prediction(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / nf;

    let (sxy, sxx) = values
        .iter()
        .enumerate()
        .fold((0.0_f64, 0.0_f64), |(sxy, sxx), (i, &y)| {
            let dx = i as f64 - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let prediction = intercept + slope * nf;
    prediction.is_finite().then_some(prediction)
}

/// RSI with exponentially smoothed gains and losses (alpha = 1 / period, seeded with the first
/// delta, no bias adjustment). Needs at least `period` closes.
///
/// A zero average loss saturates at 100.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let alpha = 1.0 / period as f64;
    let mut deltas = closes.windows(2).map(|w| w[1] - w[0]);

    let first = deltas.next()?;
    let mut avg_gain = first.max(0.0);
    let mut avg_loss = (-first).max(0.0);

    for delta in deltas {
        avg_gain = (1.0 - alpha) * avg_gain + alpha * delta.max(0.0);
        avg_loss = (1.0 - alpha) * avg_loss + alpha * (-delta).max(0.0);
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let value = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    value.is_finite().then_some(value)
}

/// Fractional close-to-close returns. Pairs with a non-positive base are skipped.
pub fn pct_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Sample standard deviation of the returns of the trailing `window` closes, in percent.
pub fn return_volatility_percent(closes: &[f64], window: usize) -> Option<f64> {
    if window < 3 || closes.len() < window {
        return None;
    }

    let returns = pct_returns(&closes[closes.len() - window..]);
    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt() * 100.0;
    std.is_finite().then_some(std)
}

/// Latest bar's high-low range relative to its close, in percent.
pub fn range_volatility_percent(high: f64, low: f64, close: f64) -> Option<f64> {
    if close <= 0.0 {
        return None;
    }
    let v = (high - low) / close * 100.0;
    (v.is_finite() && v >= 0.0).then_some(v)
}

/// Sum of the fractional daily returns across the trailing `window` closes.
pub fn momentum_return_sum(closes: &[f64], window: usize) -> Option<f64> {
    if window < 2 || closes.len() < window {
        return None;
    }
    let sum: f64 = pct_returns(&closes[closes.len() - window..]).iter().sum();
    sum.is_finite().then_some(sum)
}

pub fn day_change_percent(previous: f64, current: f64) -> Option<f64> {
    if previous <= 0.0 {
        return None;
    }
    let v = (current / previous - 1.0) * 100.0;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn trend_extrapolates_one_step_past_window() {
        let p = linear_trend_prediction(&[100.0, 101.0, 102.0, 103.0, 104.0]).unwrap();
        assert!(approx(p, 105.0));

        let flat = linear_trend_prediction(&[50.0, 50.0, 50.0]).unwrap();
        assert!(approx(flat, 50.0));

        assert!(linear_trend_prediction(&[1.0]).is_none());
    }

    #[test]
    fn trend_on_falling_series_is_below_last_close() {
        let p = linear_trend_prediction(&[10.0, 9.0, 8.5, 8.0]).unwrap();
        assert!(p < 8.0);
    }

    #[test]
    fn rsi_saturates_without_losses() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&closes, 14), Some(100.0));

        let flat = vec![100.0; 20];
        assert_eq!(rsi(&flat, 14), Some(100.0));
    }

    #[test]
    fn rsi_is_low_for_falling_series() {
        let closes: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        let v = rsi(&closes, 14).unwrap();
        assert!(approx(v, 0.0));
    }

    #[test]
    fn rsi_requires_period_bars() {
        let closes: Vec<f64> = (0..13).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&closes, 14).is_none());
    }

    #[test]
    fn rsi_matches_hand_computed_ewm() {
        // Deltas: +2, -1, +1 with alpha = 1/2.
        // gain: 2 -> 1 -> 1;  loss: 0 -> 0.5 -> 0.25
        let v = rsi(&[10.0, 12.0, 11.0, 12.0], 2).unwrap();
        assert!(approx(v, 80.0));
    }

    #[test]
    fn volatility_uses_trailing_window_only() {
        let mut closes = vec![1.0, 50.0, 3.0];
        closes.extend(std::iter::repeat(100.0).take(14));
        assert_eq!(return_volatility_percent(&closes, 14), Some(0.0));
    }

    #[test]
    fn volatility_of_alternating_returns() {
        // Returns alternate +10% / -10%-ish; the deviation must be positive.
        let closes = [100.0, 110.0, 99.0, 108.9, 98.01];
        let v = return_volatility_percent(&closes, 5).unwrap();
        assert!(v > 9.0 && v < 13.0, "{v}");
        assert!(return_volatility_percent(&closes, 6).is_none());
    }

    #[test]
    fn momentum_sums_trailing_returns() {
        let closes = [1.0, 100.0, 110.0, 121.0];
        let m = momentum_return_sum(&closes, 3).unwrap();
        assert!(approx(m, 0.2));
        assert!(momentum_return_sum(&closes, 5).is_none());
    }

    #[test]
    fn range_and_day_change() {
        assert!(approx(range_volatility_percent(105.0, 95.0, 100.0).unwrap(), 10.0));
        assert!(approx(day_change_percent(100.0, 103.0).unwrap(), 3.0));
        assert!(day_change_percent(0.0, 103.0).is_none());
    }
}
