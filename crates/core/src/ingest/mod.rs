pub mod provider;
pub mod yahoo;

use crate::domain::price::PriceSeries;
use anyhow::Result;

/// Daily OHLC history for one ticker, oldest first.
#[async_trait::async_trait]
pub trait PriceSeriesProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_price_series(&self, ticker: &str, lookback_bars: usize) -> Result<PriceSeries>;
}

/// Headline sentiment in [30, 98]. Errors are mapped to the neutral default by the engine.
#[async_trait::async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn fetch_sentiment_score(&self, ticker: &str) -> Result<i32>;
}

/// Next earnings date as free text, or "N/A".
#[async_trait::async_trait]
pub trait EarningsProvider: Send + Sync {
    async fn fetch_earnings_date_text(&self, ticker: &str) -> Result<String>;
}
