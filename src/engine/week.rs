//! ISO week boundaries.
//!
//! Weeks run from Monday 00:00 UTC to the following Monday 00:00 UTC.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

/// Returns the Monday 00:00 UTC that starts the ISO week containing `at`.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use labor_compliance::engine::iso_week_start;
///
/// // 2026-01-15 is a Thursday
/// let thursday = Utc.with_ymd_and_hms(2026, 1, 15, 13, 30, 0).unwrap();
/// assert_eq!(iso_week_start(thursday), Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap());
/// ```
pub fn iso_week_start(at: DateTime<Utc>) -> DateTime<Utc> {
    let date = at.date_naive();
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    monday.and_time(NaiveTime::MIN).and_utc()
}

/// Returns the exclusive end of the ISO week starting at `week_start`.
pub fn iso_week_end(week_start: DateTime<Utc>) -> DateTime<Utc> {
    week_start + Duration::days(7)
}

/// Returns the starts of every ISO week the span `[start, end)` touches.
///
/// A zero-length span touches the week containing `start`.
pub(crate) fn weeks_touched(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut weeks = vec![iso_week_start(start)];
    let mut next = iso_week_end(weeks[0]);
    while next < end {
        weeks.push(next);
        next = iso_week_end(next);
    }
    weeks
}
