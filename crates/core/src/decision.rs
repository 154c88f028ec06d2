use crate::domain::recommendation::{CompositeScores, Decision};
use crate::engine::config::EngineConfig;

pub const RATIONALE_EARNINGS: &str = "earnings proximity: elevated event risk";
pub const RATIONALE_CONFIRMED: &str =
    "directional signal present and swing momentum confirms it";
pub const RATIONALE_UNCONFIRMED: &str =
    "directional signal present, momentum/volatility not yet confirming";
pub const RATIONALE_VOLATILITY_UNKNOWN: &str =
    "directional signal present, volatility unknown so swing cannot confirm";
pub const RATIONALE_NO_SIGNAL: &str = "no confirming signal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Decided {
        decision: Decision,
        rationale: &'static str,
    },
    /// Analytics could not be computed. Never reported as AVOID.
    InsufficientData,
}

/// Decision table, first match wins:
/// 1. earnings urgent: AVOID
/// 2. bullish and swing confirmed: BUY
/// 3. bullish only (including an unknown swing): HOLD
/// 4. otherwise: AVOID
pub fn classify(
    scores: Option<&CompositeScores>,
    earnings_urgent: bool,
    cfg: &EngineConfig,
) -> Classification {
    let Some(scores) = scores else {
        return Classification::InsufficientData;
    };

    let (decision, rationale) = if earnings_urgent {
        (Decision::Avoid, RATIONALE_EARNINGS)
    } else if is_bullish(scores, cfg) {
        match scores.swing_score {
            None => (Decision::Hold, RATIONALE_VOLATILITY_UNKNOWN),
            Some(_) if swing_confirmed(scores, cfg) => (Decision::Buy, RATIONALE_CONFIRMED),
            Some(_) => (Decision::Hold, RATIONALE_UNCONFIRMED),
        }
    } else {
        (Decision::Avoid, RATIONALE_NO_SIGNAL)
    };

    Classification::Decided {
        decision,
        rationale,
    }
}

pub fn is_bullish(scores: &CompositeScores, cfg: &EngineConfig) -> bool {
    scores.ensemble_score > cfg.ensemble_buy_threshold
        || scores.momentum_score > cfg.momentum_buy_threshold
        || scores.sentiment_score > cfg.sentiment_buy_threshold
}

pub fn swing_confirmed(scores: &CompositeScores, cfg: &EngineConfig) -> bool {
    scores
        .swing_score
        .is_some_and(|swing| swing > cfg.swing_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(ensemble: i32, momentum: i32, sentiment: i32, swing: f64) -> CompositeScores {
        CompositeScores {
            ensemble_score: ensemble,
            momentum_score: momentum,
            sentiment_score: sentiment,
            swing_score: Some(swing),
        }
    }

    fn decision_of(c: Classification) -> Option<Decision> {
        match c {
            Classification::Decided { decision, .. } => Some(decision),
            Classification::InsufficientData => None,
        }
    }

    #[test]
    fn earnings_overrides_everything() {
        let cfg = EngineConfig::default();
        let strong = scores(100, 100, 98, 100.0);
        assert_eq!(
            classify(Some(&strong), true, &cfg),
            Classification::Decided {
                decision: Decision::Avoid,
                rationale: RATIONALE_EARNINGS
            }
        );
    }

    #[test]
    fn any_bullish_signal_with_swing_is_buy() {
        let cfg = EngineConfig::default();
        for s in [
            scores(84, 60, 50, 61.0),
            scores(64, 71, 50, 61.0),
            scores(64, 60, 76, 61.0),
        ] {
            assert_eq!(
                decision_of(classify(Some(&s), false, &cfg)),
                Some(Decision::Buy)
            );
        }
    }

    #[test]
    fn bullish_without_swing_is_hold() {
        let cfg = EngineConfig::default();
        let s = scores(84, 60, 50, 60.0);
        assert_eq!(
            decision_of(classify(Some(&s), false, &cfg)),
            Some(Decision::Hold)
        );
    }

    #[test]
    fn unknown_swing_caps_bullish_at_hold() {
        let cfg = EngineConfig::default();
        let s = CompositeScores {
            swing_score: None,
            ..scores(100, 100, 98, 0.0)
        };
        assert!(!swing_confirmed(&s, &cfg));
        assert_eq!(
            classify(Some(&s), false, &cfg),
            Classification::Decided {
                decision: Decision::Hold,
                rationale: RATIONALE_VOLATILITY_UNKNOWN
            }
        );
    }

    #[test]
    fn thresholds_are_strict() {
        let cfg = EngineConfig::default();
        let s = scores(75, 70, 75, 90.0);
        assert_eq!(
            classify(Some(&s), false, &cfg),
            Classification::Decided {
                decision: Decision::Avoid,
                rationale: RATIONALE_NO_SIGNAL
            }
        );
    }

    #[test]
    fn missing_scores_are_insufficient_not_avoid() {
        let cfg = EngineConfig::default();
        assert_eq!(
            classify(None, false, &cfg),
            Classification::InsufficientData
        );
        assert_eq!(classify(None, true, &cfg), Classification::InsufficientData);
    }
}
