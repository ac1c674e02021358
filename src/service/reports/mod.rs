//! Compliance report generation.
//!
//! A report is an immutable snapshot: the filtered violations of a period
//! are encoded as CSV or PDF, the exact bytes are hashed with SHA-256 and
//! stored in the blob store, and only then is the metadata record written.
//! Later tampering with the artifact is detected by [`ReportGenerator::verify_report`].

mod csv_export;
mod hash;
mod pdf_export;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ComplianceError, ComplianceResult};
use crate::models::{
    AuditAction, NewReport, Report, ReportDownload, ReportFilters, ReportFormat, ReportSummary,
    ReportVerification, TenantId, Violation, ViolationFilter,
};
use crate::store::{BlobStore, Clock, ReportRepository, ViolationRepository};

use super::audit::AuditLogger;
use super::rule_config::RuleConfigStore;
use super::violations::validate_window;

pub use csv_export::{render_csv, BOM, ENTRY_SEPARATOR, HEADER};
pub use hash::sha256_hex;
pub use pdf_export::{render_pdf, PdfHeading};

/// Blob store prefix for report artifacts.
pub const STORAGE_PREFIX: &str = "compliance-reports";

/// Orders violations for report output.
///
/// Sorted by period start, user, type, period end and id, so equal
/// violation sets always render identically.
pub(crate) fn report_order(violations: &[Violation]) -> Vec<&Violation> {
    let mut rows: Vec<&Violation> = violations.iter().collect();
    rows.sort_by(|a, b| {
        (a.period_start, &a.user_id, a.violation_type, a.period_end, &a.id).cmp(&(
            b.period_start,
            &b.user_id,
            b.violation_type,
            b.period_end,
            &b.id,
        ))
    });
    rows
}

/// Renders, stores and verifies compliance reports.
#[derive(Clone)]
pub struct ReportGenerator {
    rules: RuleConfigStore,
    violations: Arc<dyn ViolationRepository>,
    reports: Arc<dyn ReportRepository>,
    blobs: Arc<dyn BlobStore>,
    audit: AuditLogger,
    clock: Arc<dyn Clock>,
    download_url_ttl: Duration,
}

impl ReportGenerator {
    /// Wires the generator to its collaborators.
    pub fn new(
        rules: RuleConfigStore,
        violations: Arc<dyn ViolationRepository>,
        reports: Arc<dyn ReportRepository>,
        blobs: Arc<dyn BlobStore>,
        audit: AuditLogger,
        clock: Arc<dyn Clock>,
        download_url_ttl: Duration,
    ) -> Self {
        Self {
            rules,
            violations,
            reports,
            blobs,
            audit,
            clock,
            download_url_ttl,
        }
    }

    /// Generates a report over the violations whose period starts in
    /// `[start, end]` and match `filters`.
    ///
    /// Every call creates a new report id. Encoding and blob failures are
    /// returned to the caller and leave no metadata behind; if the metadata
    /// write fails, the already stored artifact is deleted.
    pub async fn generate_report(
        &self,
        tenant: &TenantId,
        actor: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        format: ReportFormat,
        filters: &ReportFilters,
    ) -> ComplianceResult<Report> {
        if actor.trim().is_empty() {
            return Err(ComplianceError::validation("actor", "must not be empty"));
        }
        validate_window(start, end)?;

        let config = self.rules.get(tenant).await?;
        let query = ViolationFilter {
            user_id: filters.user_id.clone(),
            violation_type: filters.violation_type,
            severity: filters.severity,
            from: Some(start),
            to: Some(end),
            acknowledged: filters.acknowledged,
            limit: None,
            offset: 0,
        };
        let (violations, _) = self.violations.query(tenant, &query).await?;

        let id = Uuid::new_v4().to_string();
        let generated_at = self.clock.now();
        let summary = ReportSummary::from_violations(&violations);
        let bytes = match format {
            ReportFormat::Csv => render_csv(&violations)?,
            ReportFormat::Pdf => render_pdf(
                &PdfHeading {
                    period_start: start,
                    period_end: end,
                    rule_set: &config.rule_set,
                    generated_at,
                    generated_by: actor,
                },
                &summary,
                &violations,
            ),
        };
        let hash = sha256_hex(&bytes);
        let storage_path = format!("{}/{}/{}.{}", STORAGE_PREFIX, tenant, id, format.extension());
        let size = bytes.len();

        self.blobs
            .put(&storage_path, bytes, format.content_type())
            .await?;

        let new_report = NewReport {
            id: id.clone(),
            generated_by: actor.to_string(),
            generated_at,
            period_start: start,
            period_end: end,
            format,
            rule_set: config.rule_set.clone(),
            filters: filters.clone(),
            summary,
            storage_path: storage_path.clone(),
            hash,
        };
        let report = match self.reports.insert(tenant, new_report).await {
            Ok(report) => report,
            Err(err) => {
                warn!(
                    tenant = %tenant,
                    report_id = %id,
                    error = %err,
                    "Report metadata write failed, removing artifact"
                );
                if let Err(cleanup) = self.blobs.delete(&storage_path).await {
                    warn!(
                        tenant = %tenant,
                        report_id = %id,
                        path = %storage_path,
                        error = %cleanup,
                        "Failed to remove orphaned report artifact"
                    );
                }
                return Err(err);
            }
        };

        self.audit
            .record(
                tenant,
                AuditAction::ReportGenerated,
                actor,
                json!({
                    "reportId": report.id,
                    "format": report.format,
                    "periodStart": report.period_start,
                    "periodEnd": report.period_end,
                    "totalViolations": report.summary.total_violations,
                    "hash": report.hash,
                }),
            )
            .await?;

        info!(
            tenant = %tenant,
            report_id = %report.id,
            format = format.extension(),
            violations = report.summary.total_violations,
            bytes = size,
            "Compliance report generated"
        );
        Ok(report)
    }

    /// Returns report metadata with a freshly minted download URL.
    pub async fn get_report(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> ComplianceResult<Option<ReportDownload>> {
        let Some(report) = self.reports.get(tenant, id).await? else {
            return Ok(None);
        };
        let url = self
            .blobs
            .signed_url(&report.storage_path, self.download_url_ttl)
            .await?;
        Ok(Some(ReportDownload {
            report,
            download_url: url.url,
            expires_at: url.expires_at,
        }))
    }

    /// Recomputes the hash of a stored artifact and compares it with the
    /// recorded one.
    pub async fn verify_report(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> ComplianceResult<ReportVerification> {
        let report = self
            .reports
            .get(tenant, id)
            .await?
            .ok_or_else(|| ComplianceError::not_found("report", id))?;
        let bytes = self
            .blobs
            .get(&report.storage_path)
            .await?
            .ok_or_else(|| ComplianceError::not_found("artifact", report.storage_path.clone()))?;

        let computed_hash = sha256_hex(&bytes);
        let intact = computed_hash == report.hash;
        if !intact {
            warn!(
                tenant = %tenant,
                report_id = %report.id,
                "Report artifact does not match its recorded hash"
            );
        }
        Ok(ReportVerification {
            report_id: report.id,
            recorded_hash: report.hash,
            computed_hash,
            intact,
        })
    }
}
