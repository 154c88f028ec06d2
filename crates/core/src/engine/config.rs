use crate::domain::analytics::VolatilityMeasure;
use anyhow::ensure;
use std::str::FromStr;
use std::time::Duration;

/// Tunable heuristics for the whole pipeline. The defaults are informally tuned values with no
/// derivation behind them; every one can be overridden through an `ENGINE_*` variable.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Bars requested from the price provider.
    pub lookback_bars: usize,
    /// RSI smoothing period (EMA with alpha = 1 / period). Also the minimum bar count for RSI.
    pub rsi_period: usize,
    /// Trailing closes used for the return standard deviation.
    pub volatility_window: usize,
    /// Trailing closes summed for short-term momentum.
    pub momentum_window: usize,
    pub volatility_measure: VolatilityMeasure,

    pub ensemble_base: i32,
    /// Added when the regression line points above the current price.
    pub trend_up_bonus: i32,
    /// Subtracted when it does not.
    pub trend_down_penalty: i32,
    /// RSI below this counts as oversold.
    pub oversold_rsi: f64,
    pub oversold_bonus: i32,

    pub momentum_base: f64,
    /// Multiplier on the summed fractional returns.
    pub momentum_gain: f64,

    pub sentiment_min: i32,
    pub sentiment_max: i32,
    /// Used when no sentiment could be fetched.
    pub sentiment_neutral: i32,

    pub swing_base: f64,
    pub swing_change_weight: f64,
    /// Penalty per volatility percent. Higher values make the engine more volatility-averse.
    pub swing_volatility_penalty: f64,

    pub ensemble_buy_threshold: i32,
    pub momentum_buy_threshold: i32,
    pub sentiment_buy_threshold: i32,
    pub swing_threshold: f64,

    pub stop_loss_base: f64,
    pub stop_loss_sensitivity: f64,
    pub stop_loss_min: f64,
    pub stop_loss_max: f64,
    /// take_profit_percent = stop_loss_percent * reward_ratio.
    pub reward_ratio: f64,

    /// Earnings within this many business days make a ticker AVOID.
    pub earnings_window_days: u32,

    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_bars: 100,
            rsi_period: 14,
            volatility_window: 14,
            momentum_window: 5,
            volatility_measure: VolatilityMeasure::ReturnStdDev,

            ensemble_base: 72,
            trend_up_bonus: 12,
            trend_down_penalty: 8,
            oversold_rsi: 45.0,
            oversold_bonus: 10,

            momentum_base: 65.0,
            momentum_gain: 150.0,

            sentiment_min: 30,
            sentiment_max: 98,
            sentiment_neutral: 50,

            swing_base: 50.0,
            swing_change_weight: 6.0,
            swing_volatility_penalty: 2.0,

            ensemble_buy_threshold: 75,
            momentum_buy_threshold: 70,
            sentiment_buy_threshold: 75,
            swing_threshold: 60.0,

            stop_loss_base: 1.5,
            stop_loss_sensitivity: 1.2,
            stop_loss_min: 2.5,
            stop_loss_max: 7.0,
            reward_ratio: 2.5,

            earnings_window_days: 7,

            fetch_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();
        let cfg = Self {
            lookback_bars: env_or("ENGINE_LOOKBACK_BARS", d.lookback_bars),
            rsi_period: env_or("ENGINE_RSI_PERIOD", d.rsi_period),
            volatility_window: env_or("ENGINE_VOLATILITY_WINDOW", d.volatility_window),
            momentum_window: env_or("ENGINE_MOMENTUM_WINDOW", d.momentum_window),
            volatility_measure: env_or("ENGINE_VOLATILITY_MEASURE", d.volatility_measure),

            ensemble_base: env_or("ENGINE_ENSEMBLE_BASE", d.ensemble_base),
            trend_up_bonus: env_or("ENGINE_TREND_UP_BONUS", d.trend_up_bonus),
            trend_down_penalty: env_or("ENGINE_TREND_DOWN_PENALTY", d.trend_down_penalty),
            oversold_rsi: env_or("ENGINE_OVERSOLD_RSI", d.oversold_rsi),
            oversold_bonus: env_or("ENGINE_OVERSOLD_BONUS", d.oversold_bonus),

            momentum_base: env_or("ENGINE_MOMENTUM_BASE", d.momentum_base),
            momentum_gain: env_or("ENGINE_MOMENTUM_GAIN", d.momentum_gain),

            sentiment_min: env_or("ENGINE_SENTIMENT_MIN", d.sentiment_min),
            sentiment_max: env_or("ENGINE_SENTIMENT_MAX", d.sentiment_max),
            sentiment_neutral: env_or("ENGINE_SENTIMENT_NEUTRAL", d.sentiment_neutral),

            swing_base: env_or("ENGINE_SWING_BASE", d.swing_base),
            swing_change_weight: env_or("ENGINE_SWING_CHANGE_WEIGHT", d.swing_change_weight),
            swing_volatility_penalty: env_or(
                "ENGINE_SWING_VOLATILITY_PENALTY",
                d.swing_volatility_penalty,
            ),

            ensemble_buy_threshold: env_or(
                "ENGINE_ENSEMBLE_BUY_THRESHOLD",
                d.ensemble_buy_threshold,
            ),
            momentum_buy_threshold: env_or(
                "ENGINE_MOMENTUM_BUY_THRESHOLD",
                d.momentum_buy_threshold,
            ),
            sentiment_buy_threshold: env_or(
                "ENGINE_SENTIMENT_BUY_THRESHOLD",
                d.sentiment_buy_threshold,
            ),
            swing_threshold: env_or("ENGINE_SWING_THRESHOLD", d.swing_threshold),

            stop_loss_base: env_or("ENGINE_STOP_LOSS_BASE", d.stop_loss_base),
            stop_loss_sensitivity: env_or("ENGINE_STOP_LOSS_SENSITIVITY", d.stop_loss_sensitivity),
            stop_loss_min: env_or("ENGINE_STOP_LOSS_MIN", d.stop_loss_min),
            stop_loss_max: env_or("ENGINE_STOP_LOSS_MAX", d.stop_loss_max),
            reward_ratio: env_or("ENGINE_REWARD_RATIO", d.reward_ratio),

            earnings_window_days: env_or("ENGINE_EARNINGS_WINDOW_DAYS", d.earnings_window_days),

            fetch_timeout: Duration::from_millis(env_or(
                "ENGINE_FETCH_TIMEOUT_MS",
                d.fetch_timeout.as_millis() as u64,
            )),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.lookback_bars >= 2, "lookback_bars must be >= 2");
        ensure!(self.rsi_period >= 2, "rsi_period must be >= 2");
        ensure!(
            self.volatility_window >= 3,
            "volatility_window must be >= 3 (two returns for a sample deviation)"
        );
        ensure!(self.momentum_window >= 2, "momentum_window must be >= 2");

        ensure!(
            self.sentiment_min <= self.sentiment_max,
            "sentiment_min {} above sentiment_max {}",
            self.sentiment_min,
            self.sentiment_max
        );

        let finite = [
            self.oversold_rsi,
            self.momentum_base,
            self.momentum_gain,
            self.swing_base,
            self.swing_change_weight,
            self.swing_volatility_penalty,
            self.swing_threshold,
            self.stop_loss_base,
            self.stop_loss_sensitivity,
            self.stop_loss_min,
            self.stop_loss_max,
            self.reward_ratio,
        ];
        ensure!(
            finite.iter().all(|v| v.is_finite()),
            "engine thresholds must be finite"
        );

        ensure!(
            self.stop_loss_min > 0.0 && self.stop_loss_min <= self.stop_loss_max,
            "stop-loss bounds must satisfy 0 < min <= max (got {}..{})",
            self.stop_loss_min,
            self.stop_loss_max
        );
        ensure!(
            self.stop_loss_max < 100.0,
            "stop_loss_max must be below 100%"
        );
        ensure!(
            self.stop_loss_sensitivity >= 0.0,
            "stop_loss_sensitivity must be non-negative"
        );
        ensure!(self.reward_ratio > 0.0, "reward_ratio must be positive");
        ensure!(
            self.swing_volatility_penalty >= 0.0,
            "swing_volatility_penalty must be non-negative"
        );
        ensure!(
            !self.fetch_timeout.is_zero(),
            "fetch_timeout must be non-zero"
        );
        Ok(())
    }

    /// Fewest bars the analytics accept at all (day-over-day change).
    pub fn min_bars(&self) -> usize {
        2
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}
