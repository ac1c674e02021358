//! Read-time compliance statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Severity, ViolationType};

/// Rollup over the most recent violations of a tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStats {
    /// Number of violations examined.
    pub sampled: usize,
    /// Violations detected today (UTC).
    pub today: usize,
    /// Violations detected in the current ISO week.
    pub this_week: usize,
    /// Violations detected in the current calendar month.
    pub this_month: usize,
    /// Violations without acknowledgment.
    pub unacknowledged: usize,
    /// Counts per severity.
    pub by_severity: BTreeMap<Severity, usize>,
    /// Counts per violation type.
    pub by_type: BTreeMap<ViolationType, usize>,
}
