//! Daily rest between adjacent shifts.

use crate::config::RuleConfig;
use crate::models::{DetectedViolation, ViolationType, WorkInterval};

use super::build_violation;

/// Flags adjacent interval pairs separated by less than the minimum rest.
///
/// Intervals must belong to one user and be sorted by start. For every
/// adjacent pair, `gap = next.start - prev.end`; a gap shorter than
/// `min_rest_period_minutes` emits one `REST_PERIOD_VIOLATION` covering
/// `prev.end..next.start`.
///
/// Overlapping pairs are reported too. Their `actual` is the negative gap,
/// so the overlap adds to the shortfall, and the period runs from
/// `next.start` to `prev.end`.
pub fn detect_rest_periods(
    intervals: &[WorkInterval],
    config: &RuleConfig,
) -> Vec<DetectedViolation> {
    intervals
        .windows(2)
        .filter_map(|pair| {
            let (prev, next) = (&pair[0], &pair[1]);
            let gap = (next.start - prev.end).num_minutes();
            if gap >= config.min_rest_period_minutes {
                return None;
            }
            Some(build_violation(
                ViolationType::RestPeriodViolation,
                config,
                &prev.user_id,
                (prev.end, next.start),
                config.min_rest_period_minutes,
                gap,
                vec![prev.id.clone(), next.id.clone()],
            ))
        })
        .collect()
}
