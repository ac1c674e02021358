//! Maximum weekly working time rule.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::RuleConfig;
use crate::models::{DetectedViolation, ViolationType, WorkInterval};

use super::build_violation;
use super::week::{iso_week_end, iso_week_start};

/// Flags ISO weeks whose summed durations exceed the weekly maximum.
///
/// Each interval counts fully toward the week its start falls in. The
/// violation covers the whole week and lists every interval summed.
pub fn detect_weekly_working_time(
    intervals: &[WorkInterval],
    config: &RuleConfig,
) -> Vec<DetectedViolation> {
    let mut weeks: BTreeMap<DateTime<Utc>, (i64, Vec<&WorkInterval>)> = BTreeMap::new();
    for interval in intervals {
        let (total, members) = weeks.entry(iso_week_start(interval.start)).or_default();
        *total += interval.duration_minutes;
        members.push(interval);
    }

    weeks
        .into_iter()
        .filter(|(_, (total, _))| *total > config.max_weekly_working_minutes)
        .map(|(week_start, (total, members))| {
            build_violation(
                ViolationType::MaxWorkingTimeExceeded,
                config,
                &members[0].user_id,
                (week_start, iso_week_end(week_start)),
                config.max_weekly_working_minutes,
                total,
                members.iter().map(|interval| interval.id.clone()).collect(),
            )
        })
        .collect()
}
