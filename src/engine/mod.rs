//! Compliance rule engine.
//!
//! This module evaluates work intervals against a [`RuleConfig`]. Every
//! function here is pure: identical input yields identical output, and no
//! I/O or clock access happens during evaluation.
//!
//! Rules are evaluated independently, so one run may emit several violation
//! types for the same interval:
//! - shift duration ([`detect_shift_duration`])
//! - missing breaks ([`detect_missing_breaks`])
//! - rest between adjacent shifts ([`detect_rest_periods`])
//! - weekly rest ([`detect_weekly_rest`])
//! - maximum weekly working time ([`detect_weekly_working_time`])

mod missing_break;
mod rest_period;
mod shift_duration;
mod week;
mod weekly_rest;
mod weekly_working_time;

#[cfg(test)]
mod properties;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::RuleConfig;
use crate::models::{DetectedViolation, ViolationDetails, ViolationType, WorkInterval};

pub use missing_break::detect_missing_breaks;
pub use rest_period::detect_rest_periods;
pub use shift_duration::detect_shift_duration;
pub use week::{iso_week_end, iso_week_start};
pub use weekly_rest::detect_weekly_rest;
pub use weekly_working_time::detect_weekly_working_time;

/// Evaluates all rules for the given intervals.
///
/// Intervals may belong to several users; rest and weekly rules only ever
/// relate intervals of the same user. Each user's intervals are sorted by
/// `(start, id)` before evaluation, so the caller's order does not matter.
/// The result is sorted by user, period start, violation type, period end
/// and first affected entry.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use labor_compliance::config::{RuleOverrides, RuleSetCatalog};
/// use labor_compliance::engine::evaluate;
/// use labor_compliance::models::{ViolationType, WorkInterval};
///
/// let config = RuleSetCatalog::builtin()
///     .unwrap()
///     .build_config("EU", &RuleOverrides::default(), "system", Utc::now())
///     .unwrap();
/// let intervals = vec![
///     WorkInterval::new("a", "u1",
///         Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap(),
///         Utc.with_ymd_and_hms(2026, 1, 12, 17, 0, 0).unwrap())
///         .with_break(
///             Utc.with_ymd_and_hms(2026, 1, 12, 12, 0, 0).unwrap(),
///             Utc.with_ymd_and_hms(2026, 1, 12, 12, 30, 0).unwrap()),
///     WorkInterval::new("b", "u1",
///         Utc.with_ymd_and_hms(2026, 1, 12, 17, 5, 0).unwrap(),
///         Utc.with_ymd_and_hms(2026, 1, 12, 19, 0, 0).unwrap()),
/// ];
///
/// let violations = evaluate(&intervals, &config);
/// assert!(violations
///     .iter()
///     .any(|v| v.violation_type == ViolationType::RestPeriodViolation));
/// ```
pub fn evaluate(intervals: &[WorkInterval], config: &RuleConfig) -> Vec<DetectedViolation> {
    let mut violations = Vec::new();

    for user_intervals in group_by_user(intervals).into_values() {
        violations.extend(evaluate_user(&user_intervals, config));
    }

    sort_violations(&mut violations);
    violations
}

/// Evaluates all rules for one user's intervals, already sorted by start.
fn evaluate_user(intervals: &[WorkInterval], config: &RuleConfig) -> Vec<DetectedViolation> {
    let mut violations = Vec::new();
    violations.extend(detect_shift_duration(intervals, config));
    violations.extend(detect_missing_breaks(intervals, config));
    violations.extend(detect_rest_periods(intervals, config));
    violations.extend(detect_weekly_rest(intervals, config));
    violations.extend(detect_weekly_working_time(intervals, config));
    violations
}

/// Groups intervals by user; each group is sorted by `(start, id)`.
pub fn group_by_user(intervals: &[WorkInterval]) -> BTreeMap<String, Vec<WorkInterval>> {
    let mut groups: BTreeMap<String, Vec<WorkInterval>> = BTreeMap::new();
    for interval in intervals {
        groups
            .entry(interval.user_id.clone())
            .or_default()
            .push(interval.clone());
    }
    for group in groups.values_mut() {
        sort_intervals(group);
    }
    groups
}

/// Sorts intervals chronologically, breaking ties by id.
pub fn sort_intervals(intervals: &mut [WorkInterval]) {
    intervals.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
}

fn sort_violations(violations: &mut [DetectedViolation]) {
    violations.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| a.period_start.cmp(&b.period_start))
            .then_with(|| a.violation_type.cmp(&b.violation_type))
            .then_with(|| a.period_end.cmp(&b.period_end))
            .then_with(|| a.details.affected_entries.cmp(&b.details.affected_entries))
    });
}

/// Builds a violation, deriving its severity from the configuration.
///
/// The period bounds are ordered so that `period_start <= period_end` holds
/// even for inverted source data.
fn build_violation(
    kind: ViolationType,
    config: &RuleConfig,
    user_id: &str,
    period: (DateTime<Utc>, DateTime<Utc>),
    expected: i64,
    actual: i64,
    affected_entries: Vec<String>,
) -> DetectedViolation {
    let (period_start, period_end) = if period.0 <= period.1 {
        period
    } else {
        (period.1, period.0)
    };
    let details = ViolationDetails {
        expected,
        actual,
        affected_entries,
    };
    DetectedViolation {
        user_id: user_id.to_string(),
        violation_type: kind,
        severity: config.severity.classify(kind, details.magnitude_minutes()),
        period_start,
        period_end,
        details,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{at, eu_config, interval};
    use super::*;
    use crate::models::Severity;

    #[test]
    fn test_scenario_a_short_rest_is_error() {
        // 09:00-17:00, then 17:05-01:00 next day: 5 minute gap against 660.
        let intervals = vec![
            interval("a", at(13, 9, 0), at(13, 17, 0)),
            interval("b", at(13, 17, 5), at(14, 1, 0)),
        ];

        let violations = evaluate(&intervals, &eu_config());
        let rest: Vec<_> = violations
            .iter()
            .filter(|v| v.violation_type == ViolationType::RestPeriodViolation)
            .collect();

        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].severity, Severity::Error);
        assert_eq!(rest[0].period_start, at(13, 17, 0));
        assert_eq!(rest[0].period_end, at(13, 17, 5));
        assert_eq!(rest[0].details.actual, 5);
    }

    #[test]
    fn test_scenario_b_seven_ten_hour_days_exceed_weekly_maximum() {
        let intervals: Vec<_> = (0..7)
            .map(|d| {
                interval(
                    &format!("d{}", d),
                    at(12 + d, 7, 0),
                    at(12 + d, 17, 0),
                )
            })
            .collect();

        let violations = evaluate(&intervals, &eu_config());
        let weekly: Vec<_> = violations
            .iter()
            .filter(|v| v.violation_type == ViolationType::MaxWorkingTimeExceeded)
            .collect();

        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].details.actual, 4200);
        assert_eq!(weekly[0].details.expected, 2880);
        assert_eq!(weekly[0].details.affected_entries.len(), 7);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = interval("a", at(13, 9, 0), at(13, 20, 0));
        let b = interval("b", at(13, 21, 0), at(14, 8, 0));
        let c = interval("c", at(14, 10, 0), at(14, 18, 0));

        let forward = evaluate(&[a.clone(), b.clone(), c.clone()], &eu_config());
        let reversed = evaluate(&[c, b, a], &eu_config());

        assert!(!forward.is_empty());
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_users_are_evaluated_separately() {
        let mut other = interval("b", at(13, 17, 5), at(13, 20, 0));
        other.user_id = "u2".to_string();
        let intervals = vec![interval("a", at(13, 9, 0), at(13, 17, 0)), other];

        let violations = evaluate(&intervals, &eu_config());

        assert!(
            violations
                .iter()
                .all(|v| v.violation_type != ViolationType::RestPeriodViolation)
        );
    }

    #[test]
    fn test_empty_input_yields_no_violations() {
        assert!(evaluate(&[], &eu_config()).is_empty());
    }

    #[test]
    fn test_build_violation_orders_inverted_period() {
        let v = build_violation(
            ViolationType::ShiftDurationViolation,
            &eu_config(),
            "u1",
            (at(13, 18, 0), at(13, 8, 0)),
            600,
            700,
            vec!["x".to_string()],
        );
        assert!(v.period_start <= v.period_end);
    }
}
