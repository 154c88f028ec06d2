pub mod indicators;

use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::price::PriceSeries;
use crate::domain::recommendation::Unavailable;
use crate::engine::config::EngineConfig;

/// Derive the analytics snapshot for one series. Fails only when there are fewer than two bars;
/// RSI, volatility and momentum are left as `None` when their windows are not filled.
pub fn analyze(series: &PriceSeries, cfg: &EngineConfig) -> Result<AnalyticsSnapshot, Unavailable> {
    let required = cfg.min_bars();
    let closes = series.closes();
    let insufficient = || Unavailable::InsufficientHistory {
        bars: closes.len(),
        required,
    };

    if closes.len() < required {
        return Err(insufficient());
    }

    let current_price = closes[closes.len() - 1];
    let previous_price = closes[closes.len() - 2];
    let day_change_percent =
        indicators::day_change_percent(previous_price, current_price).ok_or_else(insufficient)?;
    let trend_prediction =
        indicators::linear_trend_prediction(&closes).ok_or_else(insufficient)?;

    let range_volatility_percent = series
        .last()
        .and_then(|bar| indicators::range_volatility_percent(bar.high, bar.low, bar.close));

    Ok(AnalyticsSnapshot {
        bars: closes.len(),
        current_price,
        previous_price,
        day_change_percent,
        trend_prediction,
        rsi: indicators::rsi(&closes, cfg.rsi_period),
        volatility_percent: indicators::return_volatility_percent(&closes, cfg.volatility_window),
        range_volatility_percent,
        momentum_return_sum: indicators::momentum_return_sum(&closes, cfg.momentum_window),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        PriceSeries::from_closes("TEST", start, closes).unwrap()
    }

    #[test]
    fn single_bar_is_insufficient() {
        let err = analyze(&series(&[100.0]), &EngineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            Unavailable::InsufficientHistory {
                bars: 1,
                required: 2
            }
        );
    }

    #[test]
    fn short_series_leaves_windowed_fields_empty() {
        let snap = analyze(&series(&[100.0, 101.0, 102.0]), &EngineConfig::default()).unwrap();
        assert_eq!(snap.current_price, 102.0);
        assert_eq!(snap.previous_price, 101.0);
        assert!(snap.rsi.is_none());
        assert!(snap.volatility_percent.is_none());
        assert!(snap.momentum_return_sum.is_none());
        // Flat bars have no intraday range.
        assert_eq!(snap.range_volatility_percent, Some(0.0));
    }

    #[test]
    fn full_series_fills_every_field() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0 + i as f64 * 0.2)
            .collect();
        let snap = analyze(&series(&closes), &EngineConfig::default()).unwrap();
        assert_eq!(snap.bars, 30);
        assert!(snap.rsi.is_some());
        assert!(snap.volatility_percent.unwrap() >= 0.0);
        assert!(snap.momentum_return_sum.is_some());
    }
}
