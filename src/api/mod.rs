pub mod leave_request;
pub mod punch;
pub mod statistics;
pub mod user;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Parses the datetime-local shapes clients send (minute or second
/// precision), anchored at the configured regional offset.
pub(crate) fn parse_local_datetime(s: &str, tz: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    naive.and_local_timezone(tz).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_minute_and_second_precision() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let a = parse_local_datetime("2026-03-02T09:30", tz).unwrap();
        assert_eq!(a.hour(), 9);
        assert_eq!(a.offset().local_minus_utc(), 8 * 3600);
        assert!(parse_local_datetime("2026-03-02T09:30:15", tz).is_some());
        assert!(parse_local_datetime("2026/03/02 09:30", tz).is_none());
        assert!(parse_local_datetime("not-a-date", tz).is_none());
    }
}
