//! Compliance report models.
//!
//! Reports are immutable: every generation call produces a new [`Report`]
//! whose `hash` is the SHA-256 of the exact artifact bytes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Severity, TenantId, Violation, ViolationType};

/// Artifact encoding of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// UTF-8 CSV with byte-order mark.
    Csv,
    /// Paginated PDF document.
    Pdf,
}

impl ReportFormat {
    /// File extension used for stored artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Pdf => "pdf",
        }
    }

    /// MIME type used for stored artifacts.
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv; charset=utf-8",
            ReportFormat::Pdf => "application/pdf",
        }
    }
}

/// Violation filters recorded with a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    /// Only violations of this user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Only violations of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_type: Option<ViolationType>,
    /// Only violations of this severity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Only acknowledged or unacknowledged violations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
}

/// Aggregated counts included in a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Number of violations in the report.
    pub total_violations: usize,
    /// Counts per violation type.
    pub by_type: BTreeMap<ViolationType, usize>,
    /// Counts per severity.
    pub by_severity: BTreeMap<Severity, usize>,
}

impl ReportSummary {
    /// Builds the summary for a set of violations.
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut summary = Self {
            total_violations: violations.len(),
            ..Default::default()
        };
        for violation in violations {
            *summary.by_type.entry(violation.violation_type).or_insert(0) += 1;
            *summary.by_severity.entry(violation.severity).or_insert(0) += 1;
        }
        summary
    }
}

/// Report metadata before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    /// Identifier chosen by the generator (also used in the storage path).
    pub id: String,
    /// Who requested the report.
    pub generated_by: String,
    /// When the report was rendered.
    pub generated_at: DateTime<Utc>,
    /// Start of the reported period.
    pub period_start: DateTime<Utc>,
    /// End of the reported period.
    pub period_end: DateTime<Utc>,
    /// Artifact encoding.
    pub format: ReportFormat,
    /// Rule set in force when the report was generated.
    pub rule_set: String,
    /// Filters applied to the violations.
    pub filters: ReportFilters,
    /// Aggregated counts.
    pub summary: ReportSummary,
    /// Location of the artifact in the blob store.
    pub storage_path: String,
    /// Lowercase hex SHA-256 of the artifact bytes.
    pub hash: String,
}

/// Persisted, immutable report metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Report identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Who requested the report.
    pub generated_by: String,
    /// When the report was rendered.
    pub generated_at: DateTime<Utc>,
    /// Start of the reported period.
    pub period_start: DateTime<Utc>,
    /// End of the reported period.
    pub period_end: DateTime<Utc>,
    /// Artifact encoding.
    pub format: ReportFormat,
    /// Rule set in force when the report was generated.
    pub rule_set: String,
    /// Filters applied to the violations.
    pub filters: ReportFilters,
    /// Aggregated counts.
    pub summary: ReportSummary,
    /// Location of the artifact in the blob store.
    pub storage_path: String,
    /// Lowercase hex SHA-256 of the artifact bytes.
    pub hash: String,
}

impl Report {
    /// Attaches a tenant to freshly generated metadata.
    pub fn from_new(tenant: &TenantId, new: NewReport) -> Self {
        Self {
            id: new.id,
            tenant_id: tenant.clone(),
            generated_by: new.generated_by,
            generated_at: new.generated_at,
            period_start: new.period_start,
            period_end: new.period_end,
            format: new.format,
            rule_set: new.rule_set,
            filters: new.filters,
            summary: new.summary,
            storage_path: new.storage_path,
            hash: new.hash,
        }
    }
}

/// Report metadata with a time-limited download reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDownload {
    /// The report metadata.
    pub report: Report,
    /// Download URL minted for this request.
    pub download_url: String,
    /// When the download URL stops working.
    pub expires_at: DateTime<Utc>,
}

/// Outcome of re-hashing a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportVerification {
    /// The verified report.
    pub report_id: String,
    /// Hash recorded at generation time.
    pub recorded_hash: String,
    /// Hash of the artifact as currently stored.
    pub computed_hash: String,
    /// True when both hashes agree.
    pub intact: bool,
}
