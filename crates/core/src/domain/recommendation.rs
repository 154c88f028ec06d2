use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::signals::AuxiliarySignals;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Hold,
    Avoid,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Hold => "HOLD",
            Decision::Avoid => "AVOID",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScores {
    pub ensemble_score: i32,
    pub momentum_score: i32,
    pub sentiment_score: i32,
    /// `None` when volatility is unknown; an unknown swing never confirms a BUY.
    pub swing_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
}

/// Output of one pipeline run. Depends only on the analytics and auxiliary signals it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub decision: Decision,
    pub rationale: String,
    pub scores: CompositeScores,
    pub risk: RiskLevels,
    pub analytics: AnalyticsSnapshot,
    pub signals: AuxiliarySignals,
}

/// Why a ticker could not be evaluated. Kept apart from `Decision::Avoid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Unavailable {
    FetchFailed { reason: String },
    Timeout { after_ms: u64 },
    InsufficientHistory { bars: usize, required: usize },
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::FetchFailed { reason } => write!(f, "price data unavailable: {reason}"),
            Unavailable::Timeout { after_ms } => {
                write!(f, "price data unavailable: fetch timed out after {after_ms}ms")
            }
            Unavailable::InsufficientHistory { bars, required } => write!(
                f,
                "insufficient data: {bars} bars, at least {required} required"
            ),
        }
    }
}

impl std::error::Error for Unavailable {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Evaluation {
    Ready(Recommendation),
    Unavailable(Unavailable),
}

impl Evaluation {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Evaluation::Ready(rec) => Some(rec),
            Evaluation::Unavailable(_) => None,
        }
    }

    pub fn decision(&self) -> Option<Decision> {
        self.recommendation().map(|rec| rec.decision)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Evaluation::Unavailable(_))
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Evaluation::Ready(rec) => rec.decision.as_str(),
            Evaluation::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decision_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Decision::Hold).unwrap(), json!("HOLD"));
        assert_eq!(Decision::Avoid.to_string(), "AVOID");
    }

    #[test]
    fn unavailable_evaluation_has_tagged_shape() {
        let eval = Evaluation::Unavailable(Unavailable::InsufficientHistory {
            bars: 1,
            required: 2,
        });
        let v = serde_json::to_value(&eval).unwrap();
        assert_eq!(
            v,
            json!({
                "status": "unavailable",
                "detail": {"kind": "insufficient_history", "bars": 1, "required": 2}
            })
        );

        let back: Evaluation = serde_json::from_value(v).unwrap();
        assert_eq!(back, eval);
        assert_eq!(back.status_label(), "UNAVAILABLE");
        assert!(back.decision().is_none());
    }
}
