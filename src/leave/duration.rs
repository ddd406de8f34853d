use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};

use crate::model::leave_request::LeaveType;

/// A user's daily business hours. Clipped leave categories only accrue
/// time inside this window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WorkWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Per-user overrides fall back to the company-wide window field by
    /// field, matching how unset columns are treated at submission.
    pub fn resolve(start: Option<NaiveTime>, end: Option<NaiveTime>, fallback: WorkWindow) -> Self {
        Self {
            start: start.unwrap_or(fallback.start),
            end: end.unwrap_or(fallback.end),
        }
    }
}

impl Default for WorkWindow {
    // Company default 08:00-18:00.
    fn default() -> Self {
        Self {
            start: hms(8, 0),
            end: hms(18, 0),
        }
    }
}

/// Result of one duration computation. Stored verbatim at submission and
/// never recomputed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveDuration {
    pub hours: f64,
    /// Fractional day count (hours / 8), not floored.
    pub days: f64,
    pub label: String,
}

#[derive(Debug, derive_more::Display)]
pub enum DurationError {
    #[display(fmt = "end time must be after start time")]
    InvalidRange,
}

impl std::error::Error for DurationError {}

// Fixed company lunch break, [12:00, 14:00) local.
fn lunch_start() -> NaiveTime {
    hms(12, 0)
}

fn lunch_end() -> NaiveTime {
    hms(14, 0)
}

fn hms(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid wall-clock time")
}

// Fixed offsets have no DST gaps, so the local mapping is total.
fn at(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    date.and_time(time)
        .and_local_timezone(offset)
        .single()
        .expect("fixed offset mapping is unambiguous")
}

/// Converts a raw start/end range into a business-hours duration.
///
/// Walks every calendar date in the inclusive span (weekends included).
/// Overtime accrues continuously: interior days of a multi-day span count
/// midnight to midnight, boundary days count from/to the actual instants.
/// Every other category is clipped per date to the work window, with the
/// lunch break subtracted.
///
/// Fails with [`DurationError::InvalidRange`] when `end <= start`; the
/// caller must reject the submission and persist nothing.
pub fn calculate(
    leave_type: LeaveType,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    window: &WorkWindow,
) -> Result<LeaveDuration, DurationError> {
    if end <= start {
        return Err(DurationError::InvalidRange);
    }

    let offset = *start.offset();
    let first = start.date_naive();
    let last = end.date_naive();

    let mut total = Duration::zero();
    let mut date = first;
    while date <= last {
        total += if leave_type.is_clipped() {
            clipped_day(date, start, end, window, offset)
        } else {
            overtime_day(date, start, end, first, last, offset)
        };
        date += Duration::days(1);
    }

    let hours = total.num_seconds() as f64 / 3600.0;
    Ok(LeaveDuration {
        hours,
        days: hours / 8.0,
        label: format_label(hours),
    })
}

/// Overtime contribution of one date: the full overlap of the request
/// range with that date. Interior days run a full 24h.
fn overtime_day(
    date: NaiveDate,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    first: NaiveDate,
    last: NaiveDate,
    offset: FixedOffset,
) -> Duration {
    let day_start = if date == first {
        start
    } else {
        at(date, hms(0, 0), offset)
    };
    let day_end = if date == last {
        end
    } else {
        at(date + Duration::days(1), hms(0, 0), offset)
    };
    day_end - day_start
}

/// Clipped contribution of one date: intersect the request range with the
/// work window, then subtract the lunch break.
fn clipped_day(
    date: NaiveDate,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    window: &WorkWindow,
    offset: FixedOffset,
) -> Duration {
    let day_start = at(date, window.start, offset).max(start);
    let day_end = at(date, window.end, offset).min(end);

    // No overlap with work hours that day; clamp, never go negative.
    if day_start >= day_end {
        return Duration::zero();
    }

    let lunch_from = at(date, lunch_start(), offset);
    let lunch_to = at(date, lunch_end(), offset);

    // The four lunch cases are ordered and mutually exclusive; the order
    // matters at the boundaries.
    if day_start < lunch_from && day_end > lunch_to {
        // Straddles the whole break.
        (lunch_from - day_start) + (day_end - lunch_to)
    } else if day_start < lunch_to && day_end > lunch_to {
        // Starts inside the break.
        day_end - lunch_to
    } else if day_start < lunch_from && day_end > lunch_from {
        // Ends inside the break.
        lunch_from - day_start
    } else {
        day_end - day_start
    }
}

/// Batch variant for reporting: sums calculator hours over many stored
/// ranges. Rows that no longer form a valid range are skipped rather
/// than poisoning the aggregate.
pub fn sum_hours<I>(items: I) -> f64
where
    I: IntoIterator<
        Item = (
            LeaveType,
            DateTime<FixedOffset>,
            DateTime<FixedOffset>,
            WorkWindow,
        ),
    >,
{
    items
        .into_iter()
        .filter_map(|(lt, start, end, window)| calculate(lt, start, end, &window).ok())
        .map(|d| d.hours)
        .sum()
}

/// Human-readable duration, counted in 8-hour days plus a remainder.
pub fn format_label(hours: f64) -> String {
    let days = (hours / 8.0).floor() as i64;
    let remainder = hours % 8.0;
    if days > 0 {
        if remainder > 0.0 {
            format!("{days}天{remainder:.1}小時")
        } else {
            format!("{days}天")
        }
    } else {
        format!("{hours:.1}小時")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
            .and_local_timezone(tz())
            .unwrap()
    }

    fn window() -> WorkWindow {
        WorkWindow::default()
    }

    #[test]
    fn rejects_inverted_and_empty_ranges() {
        let err = calculate(
            LeaveType::Sick,
            dt(2026, 3, 2, 10, 0),
            dt(2026, 3, 2, 9, 0),
            &window(),
        );
        assert!(matches!(err, Err(DurationError::InvalidRange)));

        let err = calculate(
            LeaveType::Sick,
            dt(2026, 3, 2, 10, 0),
            dt(2026, 3, 2, 10, 0),
            &window(),
        );
        assert!(matches!(err, Err(DurationError::InvalidRange)));
    }

    #[test]
    fn same_day_before_lunch() {
        let d = calculate(
            LeaveType::Personal,
            dt(2026, 3, 2, 9, 0),
            dt(2026, 3, 2, 11, 0),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 2.0);
        assert_eq!(d.days, 0.25);
        assert_eq!(d.label, "2.0小時");
    }

    #[test]
    fn same_day_straddling_lunch() {
        // 10:00-15:00 clipped span is 5h; the 2h break comes off.
        let d = calculate(
            LeaveType::Sick,
            dt(2026, 3, 2, 10, 0),
            dt(2026, 3, 2, 15, 0),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 3.0);
        assert_eq!(d.label, "3.0小時");
    }

    #[test]
    fn starts_inside_lunch() {
        let d = calculate(
            LeaveType::Annual,
            dt(2026, 3, 2, 13, 0),
            dt(2026, 3, 2, 16, 0),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 2.0);
    }

    #[test]
    fn ends_inside_lunch() {
        let d = calculate(
            LeaveType::Annual,
            dt(2026, 3, 2, 9, 0),
            dt(2026, 3, 2, 13, 0),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 3.0);
    }

    #[test]
    fn entirely_inside_lunch_counts_in_full() {
        // A range lying wholly within the break matches none of the
        // first three lunch cases and falls through to the no-overlap
        // arm. The case order is load-bearing; keep this pinned.
        let d = calculate(
            LeaveType::Sick,
            dt(2026, 3, 2, 12, 30),
            dt(2026, 3, 2, 13, 30),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 1.0);
        assert_eq!(d.label, "1.0小時");
    }

    #[test]
    fn outside_work_window_contributes_zero() {
        let d = calculate(
            LeaveType::Personal,
            dt(2026, 3, 2, 19, 0),
            dt(2026, 3, 2, 20, 0),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 0.0);
        assert_eq!(d.label, "0.0小時");
    }

    #[test]
    fn overtime_multi_day_counts_full_interior_days() {
        // Day 1: 20:00-24:00 = 4h, day 2: 24h, day 3: 00:00-02:00 = 2h.
        let d = calculate(
            LeaveType::Overtime,
            dt(2026, 3, 2, 20, 0),
            dt(2026, 3, 4, 2, 0),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 30.0);
        assert_eq!(d.days, 3.75);
        assert_eq!(d.label, "3天6.0小時");
    }

    #[test]
    fn overtime_single_day_counts_actual_span_only() {
        let d = calculate(
            LeaveType::Overtime,
            dt(2026, 3, 2, 10, 0),
            dt(2026, 3, 2, 12, 30),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 2.5);
        assert_eq!(d.label, "2.5小時");
    }

    #[test]
    fn weekend_days_are_clipped_not_skipped() {
        // Fri 2026-03-06 09:00 to Mon 2026-03-09 11:00.
        // Fri 9-18 minus lunch = 7h, Sat/Sun full window = 8h each,
        // Mon 8-11 (no lunch overlap) = 3h.
        let d = calculate(
            LeaveType::Annual,
            dt(2026, 3, 6, 9, 0),
            dt(2026, 3, 9, 11, 0),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 26.0);
        assert_eq!(d.label, "3天2.0小時");
    }

    #[test]
    fn whole_day_label_has_no_remainder() {
        // Full window day: 10h minus 2h lunch = 8h exactly.
        let d = calculate(
            LeaveType::Sick,
            dt(2026, 3, 2, 8, 0),
            dt(2026, 3, 2, 18, 0),
            &window(),
        )
        .unwrap();
        assert_eq!(d.hours, 8.0);
        assert_eq!(d.days, 1.0);
        assert_eq!(d.label, "1天");
    }

    #[test]
    fn custom_window_is_honored() {
        let w = WorkWindow::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        // Request 08:00-12:00 clips to 09:00-12:00.
        let d = calculate(
            LeaveType::Personal,
            dt(2026, 3, 2, 8, 0),
            dt(2026, 3, 2, 12, 0),
            &w,
        )
        .unwrap();
        assert_eq!(d.hours, 3.0);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let run = || {
            calculate(
                LeaveType::Compensatory,
                dt(2026, 3, 2, 10, 30),
                dt(2026, 3, 5, 16, 15),
                &window(),
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn window_resolution_falls_back_per_field() {
        let w = WorkWindow::resolve(
            Some(NaiveTime::from_hms_opt(9, 30, 0).unwrap()),
            None,
            WorkWindow::default(),
        );
        assert_eq!(w.start, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(w.end, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }
}
