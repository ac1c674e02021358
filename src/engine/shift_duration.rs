//! Maximum shift duration rule.

use crate::config::RuleConfig;
use crate::models::{DetectedViolation, ViolationType, WorkInterval};

use super::build_violation;

/// Flags every interval whose duration exceeds the maximum shift length.
///
/// Emits one `SHIFT_DURATION_VIOLATION` per offending interval with
/// `expected = max_shift_duration_minutes` and `actual = duration_minutes`.
/// A duration equal to the maximum is compliant.
pub fn detect_shift_duration(
    intervals: &[WorkInterval],
    config: &RuleConfig,
) -> Vec<DetectedViolation> {
    intervals
        .iter()
        .filter(|interval| interval.duration_minutes > config.max_shift_duration_minutes)
        .map(|interval| {
            build_violation(
                ViolationType::ShiftDurationViolation,
                config,
                &interval.user_id,
                (interval.start, interval.end),
                config.max_shift_duration_minutes,
                interval.duration_minutes,
                vec![interval.id.clone()],
            )
        })
        .collect()
}
