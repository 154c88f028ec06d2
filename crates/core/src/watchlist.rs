use crate::domain::recommendation::{Decision, Evaluation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_TICKER_LEN: usize = 16;

/// Trim and upper-case a symbol. Rejects empty input and anything outside
/// `[A-Z0-9.^=-]`.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_ascii_uppercase();
    if ticker.is_empty() || ticker.len() > MAX_TICKER_LEN {
        return None;
    }
    ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        .then_some(ticker)
}

/// Ordered, de-duplicated, case-normalized ticker set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    tickers: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split plain delimited text (commas, whitespace, newlines). Invalid symbols are dropped.
    pub fn parse(text: &str) -> Self {
        text.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .collect()
    }

    /// Returns false when the symbol is invalid or already present.
    pub fn add(&mut self, raw: &str) -> bool {
        match normalize_ticker(raw) {
            Some(ticker) if !self.tickers.contains(&ticker) => {
                self.tickers.push(ticker);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, raw: &str) -> bool {
        let Some(ticker) = normalize_ticker(raw) else {
            return false;
        };
        let before = self.tickers.len();
        self.tickers.retain(|t| *t != ticker);
        self.tickers.len() != before
    }

    pub fn clear(&mut self) {
        self.tickers.clear();
    }

    pub fn contains(&self, raw: &str) -> bool {
        normalize_ticker(raw).is_some_and(|t| self.tickers.contains(&t))
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn to_delimited_text(&self) -> String {
        self.tickers.join(",")
    }
}

impl<S: AsRef<str>> FromIterator<S> for Watchlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut out = Self::new();
        for raw in iter {
            out.add(raw.as_ref());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub evaluation: Evaluation,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub buy: usize,
    pub hold: usize,
    pub avoid: usize,
    pub unavailable: usize,
}

/// One evaluation cycle over a watchlist, in list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchlistSnapshot {
    pub entries: Vec<WatchlistEntry>,
}

impl WatchlistSnapshot {
    pub fn get(&self, ticker: &str) -> Option<&WatchlistEntry> {
        let ticker = normalize_ticker(ticker)?;
        self.entries.iter().find(|e| e.ticker == ticker)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> SnapshotSummary {
        self.entries
            .iter()
            .fold(SnapshotSummary::default(), |mut acc, entry| {
                match entry.evaluation.decision() {
                    Some(Decision::Buy) => acc.buy += 1,
                    Some(Decision::Hold) => acc.hold += 1,
                    Some(Decision::Avoid) => acc.avoid += 1,
                    None => acc.unavailable += 1,
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recommendation::Unavailable;

    #[test]
    fn normalizes_symbols() {
        assert_eq!(normalize_ticker("  aapl "), Some("AAPL".to_string()));
        assert_eq!(normalize_ticker("brk.b"), Some("BRK.B".to_string()));
        assert_eq!(normalize_ticker("^gspc"), Some("^GSPC".to_string()));
        assert_eq!(normalize_ticker(""), None);
        assert_eq!(normalize_ticker("AA PL"), None);
        assert_eq!(normalize_ticker("<script>"), None);
    }

    #[test]
    fn dedupes_case_insensitively_and_keeps_order() {
        let list: Watchlist = ["msft", "AAPL", "Msft", "nvda", ""].into_iter().collect();
        assert_eq!(list.tickers(), ["MSFT", "AAPL", "NVDA"]);
    }

    #[test]
    fn parses_delimited_text() {
        let list = Watchlist::parse("aapl, msft\nNVDA;;tsla  aapl");
        assert_eq!(list.to_delimited_text(), "AAPL,MSFT,NVDA,TSLA");
    }

    #[test]
    fn add_remove_clear() {
        let mut list = Watchlist::new();
        assert!(list.add("aapl"));
        assert!(!list.add("AAPL"));
        assert!(!list.add("bad symbol"));
        assert!(list.contains("aapl"));
        assert!(list.remove(" aapl"));
        assert!(!list.remove("aapl"));

        list.add("msft");
        list.add("nvda");
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn summary_counts_unavailable_separately() {
        let entry = |ticker: &str| WatchlistEntry {
            ticker: ticker.to_string(),
            evaluation: Evaluation::Unavailable(Unavailable::Timeout { after_ms: 5000 }),
            evaluated_at: Utc::now(),
        };
        let snapshot = WatchlistSnapshot {
            entries: vec![entry("AAA"), entry("BBB")],
        };
        let summary = snapshot.summary();
        assert_eq!(summary.unavailable, 2);
        assert_eq!(summary.avoid, 0);
        assert!(snapshot.get("aaa").is_some());
        assert!(snapshot.get("ccc").is_none());
    }
}
