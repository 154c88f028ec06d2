use crate::domain::signals::EARNINGS_DATE_UNAVAILABLE;
use crate::time::calendar;
use chrono::NaiveDate;
use std::collections::HashSet;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%m/%d/%Y"];

/// Parse provider text such as `2026-01-29`, `Jan 29, 2026` or a range
/// `Jan 29, 2026 - Feb 02, 2026` (the first date wins).
pub fn parse_earnings_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case(EARNINGS_DATE_UNAVAILABLE) {
        return None;
    }

    let first = text
        .split(" - ")
        .next()
        .and_then(|s| s.split(" – ").next())
        .unwrap_or(text)
        .trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(first, fmt).ok())
}

/// True when the earnings date lies between `today` and `window_days` business days ahead.
/// Unparseable or past dates are not urgent.
pub fn is_urgent(
    text: &str,
    today: NaiveDate,
    window_days: u32,
    holidays: &HashSet<NaiveDate>,
) -> bool {
    let Some(date) = parse_earnings_date(text) else {
        return false;
    };
    if date < today {
        return false;
    }
    // Bounds the calendar walk; `window_days` business days never span more calendar days.
    let max_calendar_days = i64::from(window_days) * 2 + 14;
    if (date - today).num_days() > max_calendar_days {
        return false;
    }
    calendar::business_days_between(today, date, holidays) <= window_days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_earnings_date("2026-01-29"), Some(d(2026, 1, 29)));
        assert_eq!(parse_earnings_date("Jan 29, 2026"), Some(d(2026, 1, 29)));
        assert_eq!(parse_earnings_date("January 29, 2026"), Some(d(2026, 1, 29)));
        assert_eq!(parse_earnings_date("01/29/2026"), Some(d(2026, 1, 29)));
        assert_eq!(
            parse_earnings_date("Jan 29, 2026 - Feb 02, 2026"),
            Some(d(2026, 1, 29))
        );
    }

    #[test]
    fn unavailable_text_is_not_a_date() {
        assert_eq!(parse_earnings_date("N/A"), None);
        assert_eq!(parse_earnings_date(""), None);
        assert_eq!(parse_earnings_date("sometime soon"), None);
    }

    #[test]
    fn urgency_counts_business_days() {
        let holidays = HashSet::new();
        // Friday 2026-01-23; the following Monday is one business day away.
        let today = d(2026, 1, 23);
        assert!(is_urgent("2026-01-23", today, 7, &holidays));
        assert!(is_urgent("2026-01-26", today, 1, &holidays));
        assert!(!is_urgent("2026-01-27", today, 1, &holidays));
        assert!(!is_urgent("2026-01-22", today, 7, &holidays));
        assert!(!is_urgent("N/A", today, 7, &holidays));
    }

    #[test]
    fn far_future_dates_are_not_urgent() {
        let holidays = HashSet::new();
        let today = d(2026, 1, 23);
        assert!(!is_urgent("9999-12-31", today, 7, &holidays));
        assert!(!is_urgent("2026-03-30", today, 7, &holidays));
        // A window wide enough to need the calendar walk still resolves.
        assert!(is_urgent("2026-02-20", today, 20, &holidays));
    }

    #[test]
    fn holidays_extend_the_window() {
        let today = d(2026, 1, 23);
        let holidays: HashSet<_> = [d(2026, 1, 26)].into_iter().collect();
        assert!(is_urgent("2026-01-27", today, 1, &holidays));
    }
}
