//! Keyword scoring of recent news headlines.

use scraper::{Html, Selector};

pub const MAX_HEADLINES: usize = 10;

const BASE_SCORE: i32 = 70;
const STEP: i32 = 3;
const MIN_SCORE: i32 = 30;
const MAX_SCORE: i32 = 98;

const POSITIVE: [&str; 4] = ["growth", "buy", "surge", "profit"];
const NEGATIVE: [&str; 4] = ["drop", "fall", "sell", "miss"];

/// Start at 70; each headline mentioning a positive keyword adds 3 and each mentioning a
/// negative keyword subtracts 3 (a headline can do both). Clamped to [30, 98].
pub fn score_headlines<S: AsRef<str>>(headlines: &[S]) -> i32 {
    let mut score = BASE_SCORE;
    for headline in headlines.iter().take(MAX_HEADLINES) {
        let h = headline.as_ref().to_lowercase();
        if POSITIVE.iter().any(|w| h.contains(w)) {
            score += STEP;
        }
        if NEGATIVE.iter().any(|w| h.contains(w)) {
            score -= STEP;
        }
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Text content of the first `limit` `<h3>` elements, with nested markup flattened and
/// whitespace collapsed. Empty headings are skipped.
pub fn extract_headlines(html: &str, limit: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse("h3") else {
        return Vec::new();
    };

    Html::parse_document(html)
        .select(&selector)
        .map(|h3| h3.text().collect::<String>())
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
        .take(limit)
        .collect()
}
