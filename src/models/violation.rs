//! Violation models.
//!
//! A [`DetectedViolation`] is what the rule engine emits; a [`Violation`] is
//! the persisted record carrying an id, detection time and the
//! acknowledgment pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::TenantId;

/// The compliance rule a violation breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    /// Minimum rest between two shifts was not respected.
    RestPeriodViolation,
    /// A single shift exceeded the maximum duration.
    ShiftDurationViolation,
    /// A long shift had no sufficient break recorded.
    BreakMissing,
    /// A week contained no sufficiently long rest block.
    WeeklyRestViolation,
    /// Total working time in a week exceeded the maximum.
    MaxWorkingTimeExceeded,
}

impl ViolationType {
    /// All violation types in their stable reporting order.
    pub const ALL: [ViolationType; 5] = [
        ViolationType::RestPeriodViolation,
        ViolationType::ShiftDurationViolation,
        ViolationType::BreakMissing,
        ViolationType::WeeklyRestViolation,
        ViolationType::MaxWorkingTimeExceeded,
    ];

    /// Returns the wire name of the violation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::RestPeriodViolation => "REST_PERIOD_VIOLATION",
            ViolationType::ShiftDurationViolation => "SHIFT_DURATION_VIOLATION",
            ViolationType::BreakMissing => "BREAK_MISSING",
            ViolationType::WeeklyRestViolation => "WEEKLY_REST_VIOLATION",
            ViolationType::MaxWorkingTimeExceeded => "MAX_WORKING_TIME_EXCEEDED",
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a violation's impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Breach that should be reviewed.
    Warning,
    /// Breach that must be addressed.
    Error,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 2] = [Severity::Warning, Severity::Error];

    /// Returns the wire name of the severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold, observed value and evidence for a violation.
///
/// `expected` and `actual` are expressed in minutes for every rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationDetails {
    /// The configured threshold.
    pub expected: i64,
    /// The observed value.
    pub actual: i64,
    /// Ids of the work intervals examined for this violation.
    pub affected_entries: Vec<String>,
}

impl ViolationDetails {
    /// Returns how far the observed value is from the threshold, in minutes.
    pub fn magnitude_minutes(&self) -> i64 {
        (self.expected - self.actual).abs()
    }
}

/// A violation emitted by the rule engine, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedViolation {
    /// The user the violation belongs to.
    pub user_id: String,
    /// The rule that was breached.
    pub violation_type: ViolationType,
    /// The severity derived from the rule configuration.
    pub severity: Severity,
    /// Start of the affected period.
    pub period_start: DateTime<Utc>,
    /// End of the affected period.
    pub period_end: DateTime<Utc>,
    /// Threshold, observed value and affected intervals.
    pub details: ViolationDetails,
}

impl DetectedViolation {
    /// Returns a deterministic key for storage-level deduplication.
    ///
    /// The key covers tenant, user, type and period, so re-detecting the same
    /// breach always yields the same fingerprint.
    pub fn fingerprint(&self, tenant: &TenantId) -> String {
        let mut hasher = Sha256::new();
        hasher.update(tenant.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.user_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.violation_type.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.period_start.to_rfc3339().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.period_end.to_rfc3339().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A persisted violation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Store-assigned identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The user the violation belongs to.
    pub user_id: String,
    /// The rule that was breached.
    pub violation_type: ViolationType,
    /// Severity at detection time.
    pub severity: Severity,
    /// When the violation was persisted.
    pub detected_at: DateTime<Utc>,
    /// Start of the affected period.
    pub period_start: DateTime<Utc>,
    /// End of the affected period.
    pub period_end: DateTime<Utc>,
    /// Rule set in force at detection time.
    pub rule_set: String,
    /// Threshold, observed value and affected intervals.
    pub details: ViolationDetails,
    /// When the violation was acknowledged, if it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Who acknowledged the violation, if anyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
}

impl Violation {
    /// Returns true if the acknowledgment pair is set.
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }
}

/// Filters for listing violations.
///
/// The date range applies to `period_start` (inclusive on both ends).
/// Results are ordered by `detected_at` descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationFilter {
    /// Only violations of this user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Only violations of this type.
    #[serde(default)]
    pub violation_type: Option<ViolationType>,
    /// Only violations of this severity.
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Only violations whose period starts at or after this instant.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Only violations whose period starts at or before this instant.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Only acknowledged (`true`) or unacknowledged (`false`) violations.
    #[serde(default)]
    pub acknowledged: Option<bool>,
    /// Maximum number of records to return; `None` returns every match.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of matching records to skip.
    #[serde(default)]
    pub offset: usize,
}

impl ViolationFilter {
    /// Returns true if the violation satisfies every criterion of the filter.
    pub fn matches(&self, violation: &Violation) -> bool {
        self.user_id
            .as_deref()
            .is_none_or(|user| violation.user_id == user)
            && self
                .violation_type
                .is_none_or(|kind| violation.violation_type == kind)
            && self.severity.is_none_or(|sev| violation.severity == sev)
            && self.from.is_none_or(|from| violation.period_start >= from)
            && self.to.is_none_or(|to| violation.period_start <= to)
            && self
                .acknowledged
                .is_none_or(|ack| violation.is_acknowledged() == ack)
    }
}
