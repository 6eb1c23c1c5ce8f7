use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};

/// Resolves the date the fare calendar is queried from.
///
/// An explicit `YYYY-MM-DD` argument wins; otherwise the UTC calendar date of `now_utc`.
pub fn resolve_flight_date(
    flight_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    match flight_date_arg.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid flight date {s:?}, expected YYYY-MM-DD")),
        None => Ok(now_utc.date_naive()),
    }
}
