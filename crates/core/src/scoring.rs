use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::recommendation::CompositeScores;
use crate::domain::signals::AuxiliarySignals;
use crate::engine::config::EngineConfig;

/// Combine analytics and auxiliary signals into the named scores. Recomputed from scratch on
/// every call; nothing is carried between evaluations.
pub fn score(
    snapshot: &AnalyticsSnapshot,
    signals: &AuxiliarySignals,
    cfg: &EngineConfig,
) -> CompositeScores {
    CompositeScores {
        ensemble_score: ensemble_score(snapshot, cfg),
        momentum_score: momentum_score(snapshot, cfg),
        sentiment_score: sentiment_score(signals, cfg),
        swing_score: swing_score(snapshot, cfg),
    }
}

/// Trend direction of the regression line, plus an oversold bonus when RSI is known.
pub fn ensemble_score(snapshot: &AnalyticsSnapshot, cfg: &EngineConfig) -> i32 {
    let trend = if snapshot.trend_is_up() {
        cfg.trend_up_bonus
    } else {
        -cfg.trend_down_penalty
    };
    let oversold = match snapshot.rsi {
        Some(rsi) if rsi < cfg.oversold_rsi => cfg.oversold_bonus,
        _ => 0,
    };
    cfg.ensemble_base + trend + oversold
}

/// Amplified short-term momentum. Truncates toward zero.
pub fn momentum_score(snapshot: &AnalyticsSnapshot, cfg: &EngineConfig) -> i32 {
    let momentum = snapshot.momentum_return_sum.unwrap_or(0.0);
    (cfg.momentum_base + cfg.momentum_gain * momentum) as i32
}

pub fn sentiment_score(signals: &AuxiliarySignals, cfg: &EngineConfig) -> i32 {
    match signals.sentiment_score {
        Some(score) => score.clamp(cfg.sentiment_min, cfg.sentiment_max.max(cfg.sentiment_min)),
        None => cfg.sentiment_neutral,
    }
}

/// Rewards a positive day and penalizes volatility. `None` without a volatility figure.
pub fn swing_score(snapshot: &AnalyticsSnapshot, cfg: &EngineConfig) -> Option<f64> {
    let volatility = snapshot.volatility(cfg.volatility_measure)?;
    Some(
        cfg.swing_base + cfg.swing_change_weight * snapshot.day_change_percent
            - cfg.swing_volatility_penalty * volatility,
    )
}
