use crate::domain::price::{PriceBar, PriceSeries};
use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire shape served by HTTP JSON price providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBarsResponse {
    pub ticker: String,
    pub bars: Vec<DailyBar>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl DailyBarsResponse {
    pub fn validate_and_into_series(
        self,
        expected_ticker: &str,
        lookback_bars: usize,
    ) -> anyhow::Result<PriceSeries> {
        let ticker = self.ticker.trim().to_ascii_uppercase();
        ensure!(
            ticker == expected_ticker.trim().to_ascii_uppercase(),
            "provider ticker mismatch: expected {expected_ticker}, got {}",
            self.ticker
        );
        ensure!(!self.bars.is_empty(), "provider returned no bars for {ticker}");
        ensure!(lookback_bars >= 1, "lookback must be at least one bar");

        let mut bars: Vec<PriceBar> = self
            .bars
            .into_iter()
            .map(|b| PriceBar {
                date: b.date,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
            })
            .collect();

        // Providers are not consistent about ordering.
        bars.sort_by_key(|b| b.date);

        Ok(PriceSeries::new(ticker, bars)?.truncate_to_lookback(lookback_bars))
    }
}
