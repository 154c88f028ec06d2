use crate::config::Settings;
use crate::domain::contract::DailyBarsResponse;
use crate::domain::price::PriceSeries;
use crate::ingest::PriceSeriesProvider;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(250);
const DEFAULT_PATH: &str = "/v1/daily_bars";
const DEFAULT_RETRIES: u32 = 2;

/// Price bars from a generic JSON endpoint:
/// `GET {base}{path}?ticker=..&lookback=..` returning `{ticker, bars: [...]}`.
#[derive(Debug, Clone)]
pub struct HttpJsonPriceProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonPriceProvider {
    /// `fetch_budget` is the caller's timeout for a whole fetch. Each attempt gets a share of it
    /// so the retries fit inside the budget.
    pub fn from_settings(settings: &Settings, fetch_budget: Duration) -> Result<Self> {
        let base_url = settings.require_price_provider_base_url()?.to_string();
        let api_key = settings.price_provider_api_key.clone();

        let retries = std::env::var("PRICE_PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let timeout = std::env::var("PRICE_PROVIDER_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| attempt_timeout(fetch_budget, retries));

        let path = std::env::var("PRICE_PROVIDER_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build price provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, ticker: &str, lookback_bars: usize) -> Result<DailyBarsResponse> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[("ticker", ticker.to_string()), ("lookback", lookback_bars.to_string())])
            .send()
            .await
            .context("price provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read price provider response")?;
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("price provider response is not valid JSON: {text}"))?;

        if !status.is_success() {
            anyhow::bail!("price provider HTTP {status}: {raw_json}");
        }

        serde_json::from_value::<DailyBarsResponse>(raw_json)
            .context("failed to parse price provider response into DailyBarsResponse")
    }
}

#[async_trait::async_trait]
impl PriceSeriesProvider for HttpJsonPriceProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_price_series(&self, ticker: &str, lookback_bars: usize) -> Result<PriceSeries> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(ticker, lookback_bars).await {
                Ok(parsed) => return parsed.validate_and_into_series(ticker, lookback_bars),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = backoff_after(attempt);
                    tracing::warn!(attempt, ticker, ?backoff, error = %err, "price fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn backoff_after(attempt: u32) -> Duration {
    Duration::from_millis(250 << (attempt.saturating_sub(1)).min(6))
}

/// Per-attempt timeout that leaves room for every attempt plus the backoff between them.
fn attempt_timeout(budget: Duration, attempts: u32) -> Duration {
    let attempts = attempts.max(1);
    let backoff: Duration = (1..attempts).map(backoff_after).sum();
    (budget.saturating_sub(backoff) / attempts).max(MIN_ATTEMPT_TIMEOUT)
}
