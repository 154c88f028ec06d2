pub mod config;

pub use config::EngineConfig;

use crate::analytics;
use crate::config::Settings;
use crate::decision::{self, Classification};
use crate::domain::price::PriceSeries;
use crate::domain::recommendation::{Evaluation, Recommendation, Unavailable};
use crate::domain::signals::{AuxiliarySignals, EARNINGS_DATE_UNAVAILABLE};
use crate::earnings;
use crate::ingest::provider::HttpJsonPriceProvider;
use crate::ingest::yahoo::YahooClient;
use crate::ingest::{EarningsProvider, PriceSeriesProvider, SentimentProvider};
use crate::risk;
use crate::scoring;
use crate::time::calendar;
use crate::watchlist::{normalize_ticker, Watchlist, WatchlistEntry, WatchlistSnapshot};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Run the whole pipeline over already-fetched inputs. Synchronous and pure: the same series and
/// signals always yield the same evaluation.
pub fn evaluate_series(
    series: &PriceSeries,
    signals: AuxiliarySignals,
    cfg: &EngineConfig,
) -> Evaluation {
    let analytics = match analytics::analyze(series, cfg) {
        Ok(snapshot) => snapshot,
        Err(reason) => return Evaluation::Unavailable(reason),
    };

    let scores = scoring::score(&analytics, &signals, cfg);
    let (decision, rationale) =
        match decision::classify(Some(&scores), signals.earnings_urgent, cfg) {
            Classification::Decided {
                decision,
                rationale,
            } => (decision, rationale),
            Classification::InsufficientData => {
                return Evaluation::Unavailable(Unavailable::InsufficientHistory {
                    bars: analytics.bars,
                    required: cfg.min_bars(),
                })
            }
        };
    let risk = risk::levels(&analytics, cfg);

    Evaluation::Ready(Recommendation {
        ticker: series.ticker().to_string(),
        decision,
        rationale: rationale.to_string(),
        scores,
        risk,
        analytics,
        signals,
    })
}

/// Fetches inputs for a ticker and runs `evaluate_series`. Holds no mutable state, so one
/// instance can serve concurrent evaluations.
pub struct Engine {
    prices: Arc<dyn PriceSeriesProvider>,
    sentiment: Arc<dyn SentimentProvider>,
    earnings: Arc<dyn EarningsProvider>,
    config: EngineConfig,
    holidays: HashSet<NaiveDate>,
}

impl Engine {
    pub fn new(
        prices: Arc<dyn PriceSeriesProvider>,
        sentiment: Arc<dyn SentimentProvider>,
        earnings: Arc<dyn EarningsProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            prices,
            sentiment,
            earnings,
            config,
            holidays: HashSet::new(),
        }
    }

    pub fn with_holidays(mut self, holidays: HashSet<NaiveDate>) -> Self {
        self.holidays = holidays;
        self
    }

    /// Yahoo for sentiment and earnings; prices from `PRICE_PROVIDER_BASE_URL` when set,
    /// otherwise Yahoo as well.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let config = EngineConfig::from_env()?;
        let yahoo = Arc::new(YahooClient::new(config.fetch_timeout)?);

        let prices: Arc<dyn PriceSeriesProvider> = if settings.price_provider_base_url.is_some() {
            Arc::new(HttpJsonPriceProvider::from_settings(settings, config.fetch_timeout)?)
        } else {
            yahoo.clone()
        };
        tracing::info!(price_provider = prices.provider_name(), "engine configured");

        Ok(Self::new(prices, yahoo.clone(), yahoo, config)
            .with_holidays(calendar::configured_holidays()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn evaluate(&self, ticker: &str) -> Evaluation {
        self.evaluate_on(ticker, market_date()).await
    }

    /// `today` anchors the earnings window.
    pub async fn evaluate_on(&self, ticker: &str, today: NaiveDate) -> Evaluation {
        let Some(ticker) = normalize_ticker(ticker) else {
            return Evaluation::Unavailable(Unavailable::FetchFailed {
                reason: format!("invalid ticker symbol: {ticker:?}"),
            });
        };

        let (series, signals) = tokio::join!(
            self.fetch_series(&ticker),
            self.fetch_signals(&ticker, today)
        );

        let evaluation = match series {
            Ok(series) => evaluate_series(&series, signals, &self.config),
            Err(reason) => Evaluation::Unavailable(reason),
        };

        match &evaluation {
            Evaluation::Ready(rec) => tracing::info!(
                ticker = %ticker,
                decision = %rec.decision,
                ensemble = rec.scores.ensemble_score,
                momentum = rec.scores.momentum_score,
                sentiment = rec.scores.sentiment_score,
                swing = ?rec.scores.swing_score,
                "ticker evaluated"
            ),
            Evaluation::Unavailable(reason) => {
                tracing::warn!(ticker = %ticker, reason = %reason, "ticker unavailable")
            }
        }

        evaluation
    }

    /// Evaluate every ticker independently. Failures mark that ticker unavailable and never
    /// abort the batch.
    pub async fn evaluate_all<I, S>(&self, tickers: I) -> WatchlistSnapshot
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let watchlist: Watchlist = tickers.into_iter().collect();
        let today = market_date();

        let entries = futures::future::join_all(watchlist.tickers().iter().map(|ticker| async move {
            let evaluation = self.evaluate_on(ticker, today).await;
            WatchlistEntry {
                ticker: ticker.clone(),
                evaluation,
                evaluated_at: Utc::now(),
            }
        }))
        .await;

        WatchlistSnapshot { entries }
    }

    async fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, Unavailable> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(
            timeout,
            self.prices
                .fetch_price_series(ticker, self.config.lookback_bars),
        )
        .await
        {
            Ok(Ok(series)) => Ok(series),
            Ok(Err(err)) => Err(Unavailable::FetchFailed {
                reason: format!("{err:#}"),
            }),
            Err(_) => Err(Unavailable::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Never fails: missing sentiment or earnings data becomes `None` / not urgent.
    pub async fn fetch_signals(&self, ticker: &str, today: NaiveDate) -> AuxiliarySignals {
        let timeout = self.config.fetch_timeout;
        let (sentiment, earnings_text) = tokio::join!(
            tokio::time::timeout(timeout, self.sentiment.fetch_sentiment_score(ticker)),
            tokio::time::timeout(timeout, self.earnings.fetch_earnings_date_text(ticker)),
        );

        let sentiment_score = match sentiment {
            Ok(Ok(score)) => Some(score),
            Ok(Err(err)) => {
                tracing::warn!(ticker, error = %err, "sentiment unavailable; using neutral default");
                None
            }
            Err(_) => {
                tracing::warn!(ticker, "sentiment fetch timed out; using neutral default");
                None
            }
        };

        let earnings_date_text = match earnings_text {
            Ok(Ok(text)) => Some(text.trim().to_string())
                .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case(EARNINGS_DATE_UNAVAILABLE)),
            Ok(Err(err)) => {
                tracing::warn!(ticker, error = %err, "earnings date unavailable");
                None
            }
            Err(_) => {
                tracing::warn!(ticker, "earnings date fetch timed out");
                None
            }
        };

        let earnings_urgent = earnings_date_text.as_deref().is_some_and(|text| {
            earnings::is_urgent(
                text,
                today,
                self.config.earnings_window_days,
                &self.holidays,
            )
        });

        AuxiliarySignals {
            sentiment_score,
            earnings_date_text,
            earnings_urgent,
        }
    }
}

fn market_date() -> NaiveDate {
    let now = Utc::now();
    calendar::market_today(now).unwrap_or_else(|_| now.date_naive())
}
