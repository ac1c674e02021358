//! Mandatory break rule.

use crate::config::RuleConfig;
use crate::models::{DetectedViolation, ViolationType, WorkInterval};

use super::build_violation;

/// Flags intervals that need a break but record too little of it.
///
/// The highest break tier whose trigger the duration exceeds decides the
/// required break. `expected` is the required break in minutes and `actual`
/// the recorded break total.
pub fn detect_missing_breaks(
    intervals: &[WorkInterval],
    config: &RuleConfig,
) -> Vec<DetectedViolation> {
    intervals
        .iter()
        .filter_map(|interval| {
            let required = config.required_break_minutes(interval.duration_minutes)?;
            let taken = interval.break_minutes();
            (taken < required).then(|| {
                build_violation(
                    ViolationType::BreakMissing,
                    config,
                    &interval.user_id,
                    (interval.start, interval.end),
                    required,
                    taken,
                    vec![interval.id.clone()],
                )
            })
        })
        .collect()
}
