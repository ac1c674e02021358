//! Property tests for the rule engine.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::test_support::eu_config;
use super::{evaluate, sort_intervals};
use crate::models::{ViolationType, WorkInterval};

/// Intervals for one user, built from (gap, duration) pairs. Negative gaps
/// make an interval start before the previous one ends.
fn intervals_strategy() -> impl Strategy<Value = Vec<WorkInterval>> {
    prop::collection::vec((-300i64..2000, 0i64..900), 0..20).prop_map(|spans| {
        let mut cursor = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        spans
            .into_iter()
            .enumerate()
            .map(|(i, (gap, duration))| {
                let start = cursor + Duration::minutes(gap);
                let end = start + Duration::minutes(duration);
                cursor = end;
                WorkInterval::new(format!("i{:02}", i), "u1", start, end)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_evaluation_is_deterministic(intervals in intervals_strategy()) {
        let config = eu_config();
        prop_assert_eq!(evaluate(&intervals, &config), evaluate(&intervals, &config));
    }

    #[test]
    fn prop_evaluation_ignores_input_order(intervals in intervals_strategy()) {
        let config = eu_config();
        let mut reversed = intervals.clone();
        reversed.reverse();
        prop_assert_eq!(evaluate(&intervals, &config), evaluate(&reversed, &config));
    }

    #[test]
    fn prop_short_gaps_yield_exactly_one_rest_violation(intervals in intervals_strategy()) {
        let config = eu_config();
        let violations = evaluate(&intervals, &config);
        let rest: Vec<_> = violations
            .iter()
            .filter(|v| v.violation_type == ViolationType::RestPeriodViolation)
            .collect();

        let mut sorted = intervals.clone();
        sort_intervals(&mut sorted);
        let mut expected = 0;
        for pair in sorted.windows(2) {
            let gap = (pair[1].start - pair[0].end).num_minutes();
            if gap < config.min_rest_period_minutes {
                expected += 1;
                let (from, to) = if gap >= 0 {
                    (pair[0].end, pair[1].start)
                } else {
                    (pair[1].start, pair[0].end)
                };
                let matching = rest
                    .iter()
                    .filter(|v| v.period_start == from && v.period_end == to)
                    .filter(|v| v.details.actual == gap)
                    .filter(|v| {
                        v.details.affected_entries == vec![pair[0].id.clone(), pair[1].id.clone()]
                    })
                    .count();
                prop_assert_eq!(matching, 1);
            }
        }
        prop_assert_eq!(rest.len(), expected);
    }

    #[test]
    fn prop_long_shifts_yield_exactly_one_duration_violation(intervals in intervals_strategy()) {
        let config = eu_config();
        let violations = evaluate(&intervals, &config);

        for interval in &intervals {
            let matching: Vec<_> = violations
                .iter()
                .filter(|v| v.violation_type == ViolationType::ShiftDurationViolation)
                .filter(|v| v.details.affected_entries == vec![interval.id.clone()])
                .collect();
            if interval.duration_minutes > config.max_shift_duration_minutes {
                prop_assert_eq!(matching.len(), 1);
                prop_assert_eq!(matching[0].details.actual, interval.duration_minutes);
            } else {
                prop_assert!(matching.is_empty());
            }
        }
    }

    #[test]
    fn prop_periods_are_ordered(intervals in intervals_strategy()) {
        for violation in evaluate(&intervals, &eu_config()) {
            prop_assert!(violation.period_start <= violation.period_end);
            prop_assert!(!violation.details.affected_entries.is_empty());
        }
    }
}
