//! Read-time compliance statistics.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};

use crate::engine::iso_week_start;
use crate::error::ComplianceResult;
use crate::models::{ComplianceStats, TenantId, Violation, ViolationFilter};
use crate::store::{Clock, ViolationRepository};

/// Rolls up the most recent violations of a tenant.
#[derive(Clone)]
pub struct StatsAggregator {
    violations: Arc<dyn ViolationRepository>,
    clock: Arc<dyn Clock>,
    sample_size: usize,
}

impl StatsAggregator {
    /// Creates an aggregator that examines up to `sample_size` violations.
    pub fn new(
        violations: Arc<dyn ViolationRepository>,
        clock: Arc<dyn Clock>,
        sample_size: usize,
    ) -> Self {
        Self {
            violations,
            clock,
            sample_size,
        }
    }

    /// Computes the rollup over the newest violations.
    pub async fn get_compliance_stats(
        &self,
        tenant: &TenantId,
    ) -> ComplianceResult<ComplianceStats> {
        let filter = ViolationFilter {
            limit: Some(self.sample_size),
            ..Default::default()
        };
        let (recent, _) = self.violations.query(tenant, &filter).await?;
        Ok(summarize(&recent, self.clock.now()))
    }
}

/// Buckets violations by `detected_at` relative to `now`, all in UTC.
///
/// "This week" starts on Monday 00:00; "this month" on the first day of
/// the month.
pub fn summarize(violations: &[Violation], now: DateTime<Utc>) -> ComplianceStats {
    let today = now.date_naive();
    let week_start = iso_week_start(now);

    let mut stats = ComplianceStats {
        sampled: violations.len(),
        ..Default::default()
    };
    for violation in violations {
        let detected = violation.detected_at;
        if detected.date_naive() == today {
            stats.today += 1;
        }
        if detected >= week_start && detected <= now {
            stats.this_week += 1;
        }
        if detected.year() == now.year() && detected.month() == now.month() {
            stats.this_month += 1;
        }
        if !violation.is_acknowledged() {
            stats.unacknowledged += 1;
        }
        *stats.by_severity.entry(violation.severity).or_insert(0) += 1;
        *stats.by_type.entry(violation.violation_type).or_insert(0) += 1;
    }
    stats
}
