use crate::domain::price::{PriceBar, PriceSeries};
use crate::domain::signals::EARNINGS_DATE_UNAVAILABLE;
use crate::ingest::{EarningsProvider, PriceSeriesProvider, SentimentProvider};
use crate::sentiment;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";
const SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com";
const NEWS_BASE_URL: &str = "https://finance.yahoo.com";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Yahoo Finance chart, news and calendar endpoints. Unofficial and best-effort.
#[derive(Debug, Clone)]
pub struct YahooClient {
    http: reqwest::Client,
    chart_base_url: String,
    summary_base_url: String,
    news_base_url: String,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build yahoo http client")?;

        Ok(Self {
            http,
            chart_base_url: std::env::var("YAHOO_CHART_BASE_URL")
                .unwrap_or_else(|_| CHART_BASE_URL.to_string()),
            summary_base_url: std::env::var("YAHOO_SUMMARY_BASE_URL")
                .unwrap_or_else(|_| SUMMARY_BASE_URL.to_string()),
            news_base_url: std::env::var("YAHOO_NEWS_BASE_URL")
                .unwrap_or_else(|_| NEWS_BASE_URL.to_string()),
        })
    }

    async fn get_text(&self, url: String, query: &[(&str, String)]) -> Result<String> {
        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("yahoo request failed: {url}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read yahoo response")?;
        if !status.is_success() {
            anyhow::bail!("yahoo HTTP {status} for {url}");
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl PriceSeriesProvider for YahooClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_price_series(&self, ticker: &str, lookback_bars: usize) -> Result<PriceSeries> {
        // Calendar span wide enough to cover `lookback_bars` sessions plus holidays.
        let now = Utc::now();
        let span_days = (lookback_bars as i64) * 7 / 5 + 10;
        let period1 = (now - ChronoDuration::days(span_days)).timestamp();

        let url = format!(
            "{}/v8/finance/chart/{ticker}",
            self.chart_base_url.trim_end_matches('/')
        );
        let text = self
            .get_text(
                url,
                &[
                    ("period1", period1.to_string()),
                    ("period2", now.timestamp().to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;

        let parsed = serde_json::from_str::<ChartEnvelope>(&text)
            .context("failed to parse yahoo chart response")?;
        parse_chart(ticker, parsed, lookback_bars)
    }
}

#[async_trait::async_trait]
impl SentimentProvider for YahooClient {
    async fn fetch_sentiment_score(&self, ticker: &str) -> Result<i32> {
        let url = format!(
            "{}/quote/{ticker}/news",
            self.news_base_url.trim_end_matches('/')
        );
        let html = self.get_text(url, &[]).await?;
        let headlines = sentiment::extract_headlines(&html, sentiment::MAX_HEADLINES);
        tracing::debug!(ticker, headlines = headlines.len(), "scored news headlines");
        Ok(sentiment::score_headlines(&headlines))
    }
}

#[async_trait::async_trait]
impl EarningsProvider for YahooClient {
    async fn fetch_earnings_date_text(&self, ticker: &str) -> Result<String> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{ticker}",
            self.summary_base_url.trim_end_matches('/')
        );
        let text = self
            .get_text(url, &[("modules", "calendarEvents".to_string())])
            .await?;
        let parsed = serde_json::from_str::<SummaryEnvelope>(&text)
            .context("failed to parse yahoo quoteSummary response")?;
        Ok(earnings_text(parsed))
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn parse_chart(ticker: &str, envelope: ChartEnvelope, lookback_bars: usize) -> Result<PriceSeries> {
    if let Some(err) = envelope.chart.error {
        anyhow::bail!(
            "yahoo chart error for {ticker}: {} ({})",
            err.description.unwrap_or_default(),
            err.code.unwrap_or_default()
        );
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .with_context(|| format!("yahoo chart returned no result for {ticker}"))?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .with_context(|| format!("yahoo chart returned no quote for {ticker}"))?;

    let mut bars: Vec<PriceBar> = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            // Halted sessions come back as nulls.
            continue;
        };
        let Some(date) = session_date(*ts, result.meta.gmtoffset) else {
            continue;
        };

        let bar = PriceBar {
            date,
            open,
            high,
            low,
            close,
        };
        // An in-progress session can repeat the last date; the later row wins.
        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }

    anyhow::ensure!(!bars.is_empty(), "yahoo chart returned no complete bars for {ticker}");
    Ok(PriceSeries::new(ticker, bars)?.truncate_to_lookback(lookback_bars))
}

fn session_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.date_naive())
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    #[serde(rename = "calendarEvents")]
    calendar_events: Option<CalendarEvents>,
}

#[derive(Debug, Deserialize)]
struct CalendarEvents {
    earnings: Option<EarningsEvents>,
}

#[derive(Debug, Deserialize)]
struct EarningsEvents {
    #[serde(rename = "earningsDate", default)]
    earnings_date: Vec<FormattedValue>,
}

#[derive(Debug, Deserialize)]
struct FormattedValue {
    fmt: Option<String>,
}

fn earnings_text(envelope: SummaryEnvelope) -> String {
    let dates: Vec<String> = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.calendar_events)
        .and_then(|c| c.earnings)
        .map(|e| e.earnings_date.into_iter().filter_map(|d| d.fmt).collect())
        .unwrap_or_default();

    if dates.is_empty() {
        EARNINGS_DATE_UNAVAILABLE.to_string()
    } else {
        dates.join(" - ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart(v: serde_json::Value) -> ChartEnvelope {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn parses_chart_and_skips_null_rows() {
        // 2026-01-26 / 27 / 28 at 14:30 UTC.
        let env = chart(json!({
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": -18000},
                    "timestamp": [1769437800, 1769524200, 1769610600],
                    "indicators": {"quote": [{
                        "open": [10.0, null, 12.0],
                        "high": [11.0, 12.0, 13.0],
                        "low": [9.0, 10.0, 11.5],
                        "close": [10.5, 11.0, 12.5]
                    }]}
                }],
                "error": null
            }
        }));

        let series = parse_chart("AAPL", env, 100).unwrap();
        assert_eq!(series.closes(), vec![10.5, 12.5]);
        assert_eq!(
            series.bars()[1].date,
            NaiveDate::from_ymd_opt(2026, 1, 28).unwrap()
        );
    }

    #[test]
    fn later_row_wins_for_repeated_date() {
        let env = chart(json!({
            "chart": {
                "result": [{
                    "timestamp": [1769437800, 1769440000],
                    "indicators": {"quote": [{
                        "open": [10.0, 10.0],
                        "high": [11.0, 11.5],
                        "low": [9.0, 9.0],
                        "close": [10.5, 11.2]
                    }]}
                }],
                "error": null
            }
        }));

        let series = parse_chart("AAPL", env, 100).unwrap();
        assert_eq!(series.closes(), vec![11.2]);
    }

    #[test]
    fn surfaces_chart_errors() {
        let env = chart(json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }));
        let err = parse_chart("ZZZZ", env, 100).unwrap_err();
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn earnings_text_joins_range_or_reports_na() {
        let env: SummaryEnvelope = serde_json::from_value(json!({
            "quoteSummary": {"result": [{"calendarEvents": {"earnings": {
                "earningsDate": [{"raw": 1769644800, "fmt": "2026-01-29"},
                                 {"raw": 1770076800, "fmt": "2026-02-03"}]
            }}}]}
        }))
        .unwrap();
        assert_eq!(earnings_text(env), "2026-01-29 - 2026-02-03");

        let empty: SummaryEnvelope =
            serde_json::from_value(json!({"quoteSummary": {"result": null}})).unwrap();
        assert_eq!(earnings_text(empty), "N/A");
    }
}
