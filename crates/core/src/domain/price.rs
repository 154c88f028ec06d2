use anyhow::ensure;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Daily bars for one ticker, oldest first. Construction validates every bar, so the
/// analytics never see non-positive prices or out-of-order dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> anyhow::Result<Self> {
        let ticker = ticker.into();
        ensure!(!ticker.trim().is_empty(), "ticker must be non-empty");

        for bar in &bars {
            validate_bar(bar)?;
        }
        for pair in bars.windows(2) {
            ensure!(
                pair[0].date < pair[1].date,
                "bars must be strictly chronological ({} then {})",
                pair[0].date,
                pair[1].date
            );
        }

        Ok(Self { ticker, bars })
    }

    /// Flat bars (open = high = low = close) on consecutive calendar days.
    pub fn from_closes(
        ticker: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> anyhow::Result<Self> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
            })
            .collect();
        Self::new(ticker, bars)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Keep only the most recent `lookback` bars.
    pub fn truncate_to_lookback(mut self, lookback: usize) -> Self {
        if self.bars.len() > lookback {
            let excess = self.bars.len() - lookback;
            self.bars.drain(..excess);
        }
        self
    }
}

fn validate_bar(bar: &PriceBar) -> anyhow::Result<()> {
    let prices = [bar.open, bar.high, bar.low, bar.close];
    ensure!(
        prices.iter().all(|p| p.is_finite() && *p > 0.0),
        "bar {} has non-positive or non-finite prices",
        bar.date
    );
    ensure!(
        bar.low <= bar.high,
        "bar {} has low {} above high {}",
        bar.date,
        bar.low,
        bar.high
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn from_closes_builds_consecutive_days() {
        let series = PriceSeries::from_closes("AAPL", day(2), &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.bars()[2].date, day(4));
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rejects_out_of_order_bars() {
        let bar = |d| PriceBar {
            date: day(d),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
        };
        assert!(PriceSeries::new("AAPL", vec![bar(3), bar(2)]).is_err());
        assert!(PriceSeries::new("AAPL", vec![bar(3), bar(3)]).is_err());
    }

    #[test]
    fn rejects_bad_prices() {
        assert!(PriceSeries::from_closes("AAPL", day(2), &[1.0, 0.0]).is_err());
        assert!(PriceSeries::from_closes("AAPL", day(2), &[1.0, f64::NAN]).is_err());

        let inverted = PriceBar {
            date: day(2),
            open: 10.0,
            high: 9.0,
            low: 11.0,
            close: 10.0,
        };
        assert!(PriceSeries::new("AAPL", vec![inverted]).is_err());
    }

    #[test]
    fn truncates_to_most_recent_bars() {
        let series = PriceSeries::from_closes("AAPL", day(2), &[1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .truncate_to_lookback(2);
        assert_eq!(series.closes(), vec![3.0, 4.0]);
    }
}
