use serde::{Deserialize, Serialize};

/// Which volatility figure feeds the swing score and the stop-loss. One measure is chosen per
/// engine configuration and used everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityMeasure {
    /// Sample standard deviation of trailing daily returns, in percent.
    #[default]
    ReturnStdDev,
    /// Latest bar's (high - low) / close, in percent.
    DailyRange,
}

impl std::str::FromStr for VolatilityMeasure {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "return_std_dev" | "stddev" => Ok(Self::ReturnStdDev),
            "daily_range" | "range" => Ok(Self::DailyRange),
            other => anyhow::bail!("unknown volatility measure: {other}"),
        }
    }
}

/// Primitives derived once from a price series. Optional fields are `None` when the series is
/// too short for them and count as neutral downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub bars: usize,
    pub current_price: f64,
    pub previous_price: f64,
    pub day_change_percent: f64,
    /// Least-squares line over the closes, evaluated one bar past the window. A heuristic
    /// extrapolation, not a forecast.
    pub trend_prediction: f64,
    pub rsi: Option<f64>,
    pub volatility_percent: Option<f64>,
    pub range_volatility_percent: Option<f64>,
    /// Sum of the trailing daily returns as fractions (0.01 = 1%).
    pub momentum_return_sum: Option<f64>,
}

impl AnalyticsSnapshot {
    /// `None` when the selected measure could not be computed. Never substituted with zero.
    pub fn volatility(&self, measure: VolatilityMeasure) -> Option<f64> {
        let value = match measure {
            VolatilityMeasure::ReturnStdDev => self.volatility_percent,
            VolatilityMeasure::DailyRange => self.range_volatility_percent,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn trend_is_up(&self) -> bool {
        self.trend_prediction > self.current_price
    }
}
