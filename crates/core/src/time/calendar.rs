use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

// Fixed US Eastern standard offset; daylight saving shifts the cutoff by an hour, which only
// matters for runs in the hour after the close.
const NEW_YORK_OFFSET_SECS: i32 = -5 * 3600;

// Regular session closes at 16:00 ET; wait a little for final prints.
const CLOSE_CUTOFF_HOUR_ET: u32 = 16;
const CLOSE_CUTOFF_MINUTE_ET: u32 = 30;

/// Calendar date in New York.
pub fn market_today(now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    let et = chrono::FixedOffset::east_opt(NEW_YORK_OFFSET_SECS).context("invalid ET offset")?;
    Ok(now_utc.with_timezone(&et).date_naive())
}

/// Last completed session date, or the explicit `YYYY-MM-DD` argument.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
    holidays: &HashSet<NaiveDate>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid as-of date: {s}"));
    }

    let et = chrono::FixedOffset::east_opt(NEW_YORK_OFFSET_SECS).context("invalid ET offset")?;
    let now_et = now_utc.with_timezone(&et);

    let cutoff_reached =
        (now_et.hour(), now_et.minute()) >= (CLOSE_CUTOFF_HOUR_ET, CLOSE_CUTOFF_MINUTE_ET);
    let mut date = now_et.date_naive();
    if !cutoff_reached {
        date = date - Duration::days(1);
    }

    while !is_business_day(date, holidays) {
        date = date - Duration::days(1);
    }

    Ok(date)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

pub fn is_business_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    !is_weekend(date) && !holidays.contains(&date)
}

/// Business days in `(from, to]`. Zero when `to <= from`.
pub fn business_days_between(from: NaiveDate, to: NaiveDate, holidays: &HashSet<NaiveDate>) -> u32 {
    let mut count = 0;
    let mut date = from;
    while date < to {
        date = date + Duration::days(1);
        if is_business_day(date, holidays) {
            count += 1;
        }
    }
    count
}

pub fn configured_holidays() -> HashSet<NaiveDate> {
    // Fixed-date NYSE holidays only. Extend via MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
    let mut out = HashSet::new();
    for y in 2024..=2030 {
        for (m, d) in [(1, 1), (6, 19), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                out.insert(date);
            }
        }
    }

    if let Ok(s) = std::env::var("MARKET_HOLIDAYS") {
        out.extend(parse_holidays(&s));
    }

    out
}

pub fn parse_holidays(s: &str) -> HashSet<NaiveDate> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| NaiveDate::parse_from_str(part, "%Y-%m-%d").ok())
        .collect()
}
