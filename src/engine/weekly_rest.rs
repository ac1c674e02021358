//! Weekly rest rule.

use chrono::{DateTime, Duration, Utc};

use crate::config::RuleConfig;
use crate::models::{DetectedViolation, ViolationType, WorkInterval};

use super::build_violation;
use super::week::{iso_week_end, weeks_touched};

/// Flags ISO weeks without a long enough uninterrupted rest block.
///
/// Only weeks touched by at least one interval are examined. Within a week,
/// every instant not covered by an interval counts as rest, including the
/// stretch from the week start to the first interval and from the last
/// interval to the week end. Intervals crossing a week boundary are clipped.
/// `expected` and `actual` are minutes.
pub fn detect_weekly_rest(
    intervals: &[WorkInterval],
    config: &RuleConfig,
) -> Vec<DetectedViolation> {
    let Some(first) = intervals.first() else {
        return Vec::new();
    };

    let mut weeks: Vec<DateTime<Utc>> = intervals
        .iter()
        .flat_map(|interval| weeks_touched(interval.start, interval.end.max(interval.start)))
        .collect();
    weeks.sort();
    weeks.dedup();

    let required = config.min_weekly_rest_minutes();

    weeks
        .into_iter()
        .filter_map(|week_start| {
            let week_end = iso_week_end(week_start);
            let in_week: Vec<&WorkInterval> = intervals
                .iter()
                .filter(|interval| overlaps_week(interval, week_start, week_end))
                .collect();

            let longest = longest_rest(&in_week, week_start, week_end);
            if longest.num_minutes() >= required {
                return None;
            }

            Some(build_violation(
                ViolationType::WeeklyRestViolation,
                config,
                &first.user_id,
                (week_start, week_end),
                required,
                longest.num_minutes(),
                in_week.iter().map(|interval| interval.id.clone()).collect(),
            ))
        })
        .collect()
}

fn overlaps_week(
    interval: &WorkInterval,
    week_start: DateTime<Utc>,
    week_end: DateTime<Utc>,
) -> bool {
    let end = interval.end.max(interval.start);
    if interval.start == end {
        return interval.start >= week_start && interval.start < week_end;
    }
    interval.start < week_end && end > week_start
}

/// Longest stretch of the week not covered by any interval.
///
/// `in_week` must be sorted by start.
fn longest_rest(
    in_week: &[&WorkInterval],
    week_start: DateTime<Utc>,
    week_end: DateTime<Utc>,
) -> Duration {
    let mut longest = Duration::zero();
    let mut cursor = week_start;

    for interval in in_week {
        let start = interval.start.clamp(week_start, week_end);
        let end = interval.end.max(interval.start).clamp(week_start, week_end);
        if start > cursor {
            longest = longest.max(start - cursor);
        }
        cursor = cursor.max(end);
    }

    longest.max(week_end - cursor)
}
