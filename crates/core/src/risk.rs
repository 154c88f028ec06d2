use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::recommendation::RiskLevels;
use crate::engine::config::EngineConfig;

/// Volatility-scaled stop distance in percent, always inside
/// `[stop_loss_min, stop_loss_max]` and non-decreasing in `volatility_percent`.
pub fn stop_loss_percent(volatility_percent: f64, cfg: &EngineConfig) -> f64 {
    // NaN or negative volatility counts as calm.
    let volatility = if volatility_percent.is_nan() {
        0.0
    } else {
        volatility_percent.max(0.0)
    };
    let raw = cfg.stop_loss_base + volatility * cfg.stop_loss_sensitivity;
    raw.max(cfg.stop_loss_min).min(cfg.stop_loss_max)
}

pub fn take_profit_percent(stop_loss_percent: f64, cfg: &EngineConfig) -> f64 {
    stop_loss_percent * cfg.reward_ratio
}

/// Without a volatility figure the widest stop (`stop_loss_max`) is used.
pub fn levels(snapshot: &AnalyticsSnapshot, cfg: &EngineConfig) -> RiskLevels {
    match snapshot.volatility(cfg.volatility_measure) {
        Some(volatility) => levels_for(snapshot.current_price, volatility, cfg),
        None => levels_at_stop(snapshot.current_price, cfg.stop_loss_max, cfg),
    }
}

pub fn levels_for(current_price: f64, volatility_percent: f64, cfg: &EngineConfig) -> RiskLevels {
    levels_at_stop(current_price, stop_loss_percent(volatility_percent, cfg), cfg)
}

fn levels_at_stop(current_price: f64, stop_loss_percent: f64, cfg: &EngineConfig) -> RiskLevels {
    let take_profit_percent = take_profit_percent(stop_loss_percent, cfg);
    RiskLevels {
        stop_loss_percent,
        take_profit_percent,
        stop_loss_price: current_price * (1.0 - stop_loss_percent / 100.0),
        take_profit_price: current_price * (1.0 + take_profit_percent / 100.0),
    }
}
