use serde::{Deserialize, Serialize};

pub const EARNINGS_DATE_UNAVAILABLE: &str = "N/A";

/// Best-effort hints fetched alongside the price series. `None` means the provider could not
/// supply the value; scoring substitutes a neutral default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuxiliarySignals {
    pub sentiment_score: Option<i32>,
    pub earnings_date_text: Option<String>,
    pub earnings_urgent: bool,
}

impl AuxiliarySignals {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn earnings_date_display(&self) -> &str {
        self.earnings_date_text
            .as_deref()
            .unwrap_or(EARNINGS_DATE_UNAVAILABLE)
    }
}
