//! The compliance service.
//!
//! [`ComplianceService`] is the surface the surrounding CRUD layer calls.
//! It wires the component services to the injected stores:
//!
//! - [`RuleConfigStore`]: per-tenant rule configuration
//! - [`ViolationService`]: compliance checks and violation records
//! - [`ReportGenerator`]: hash-verified CSV and PDF reports
//! - [`StatsAggregator`]: read-time rollups
//! - [`AuditLogger`]: the audit trail
//!
//! Time-account adjustments raised by a check run on a background worker
//! (see [`AdjustmentDispatcher`]).

mod adjustments;
mod audit;
pub mod reports;
mod rule_config;
mod stats;
mod violations;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::info;

use crate::config::{ComplianceSettings, RuleConfig, RuleOverrides, RuleSetCatalog};
use crate::error::{ComplianceError, ComplianceResult};
use crate::models::{
    AuditLogEntry, AuditLogQuery, ComplianceStats, Report, ReportDownload, ReportFilters,
    ReportFormat, ReportVerification, TenantId, Violation, ViolationFilter,
};
use crate::store::{
    AuditRepository, BlobStore, Clock, IntervalSource, ReportRepository, RuleConfigRepository,
    TimeAccountLedger, ViolationRepository,
};

pub use adjustments::{adjustment_for, AdjustmentDispatcher, AdjustmentFailure};
pub use audit::AuditLogger;
pub use reports::ReportGenerator;
pub use rule_config::{RuleConfigStore, SYSTEM_ACTOR};
pub use stats::{summarize, StatsAggregator};
pub use violations::{CheckTrigger, PageLimits, ViolationService};

/// The collaborators a [`ComplianceService`] runs against.
#[derive(Clone)]
pub struct ComplianceStores {
    /// Source of recorded work intervals.
    pub intervals: Arc<dyn IntervalSource>,
    /// Rule configuration per tenant.
    pub rule_configs: Arc<dyn RuleConfigRepository>,
    /// Violation records.
    pub violations: Arc<dyn ViolationRepository>,
    /// Audit trail.
    pub audit: Arc<dyn AuditRepository>,
    /// Report metadata.
    pub reports: Arc<dyn ReportRepository>,
    /// Report artifacts.
    pub blobs: Arc<dyn BlobStore>,
    /// Time-account subsystem.
    pub ledger: Arc<dyn TimeAccountLedger>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Entry point for every compliance operation.
///
/// Must be created inside a tokio runtime, which runs the adjustment worker.
pub struct ComplianceService {
    rules: RuleConfigStore,
    violations: ViolationService,
    reports: ReportGenerator,
    stats: StatsAggregator,
    audit: AuditLogger,
    adjustments: Arc<AdjustmentDispatcher>,
    settings: ComplianceSettings,
}

impl ComplianceService {
    /// Builds the service.
    ///
    /// Fails with [`ComplianceError::UnknownRuleSet`] if the configured
    /// default rule set is missing from `catalog`.
    pub fn new(
        stores: ComplianceStores,
        catalog: RuleSetCatalog,
        settings: ComplianceSettings,
    ) -> ComplianceResult<Self> {
        catalog.get(&settings.default_rule_set)?;

        let audit = AuditLogger::new(stores.audit.clone());
        let rules = RuleConfigStore::new(
            stores.rule_configs.clone(),
            Arc::new(catalog),
            audit.clone(),
            stores.clock.clone(),
            settings.default_rule_set.clone(),
        );
        let adjustments = Arc::new(AdjustmentDispatcher::spawn(
            stores.ledger.clone(),
            settings.adjustment_queue_capacity,
            settings.failure_channel_capacity,
        ));
        let violations = ViolationService::new(
            stores.intervals.clone(),
            stores.violations.clone(),
            rules.clone(),
            audit.clone(),
            adjustments.clone(),
            stores.clock.clone(),
            PageLimits {
                default_page_size: settings.default_page_size,
                max_page_size: settings.max_page_size,
            },
        );
        let reports = ReportGenerator::new(
            rules.clone(),
            stores.violations.clone(),
            stores.reports.clone(),
            stores.blobs.clone(),
            audit.clone(),
            stores.clock.clone(),
            settings.download_url_ttl(),
        );
        let stats = StatsAggregator::new(
            stores.violations.clone(),
            stores.clock.clone(),
            settings.stats_sample_size,
        );

        info!(
            default_rule_set = %settings.default_rule_set,
            rule_sets = rules.catalog().names().count(),
            "Compliance service ready"
        );
        Ok(Self {
            rules,
            violations,
            reports,
            stats,
            audit,
            adjustments,
            settings,
        })
    }

    /// Returns the settings the service was built with.
    pub fn settings(&self) -> &ComplianceSettings {
        &self.settings
    }

    /// Returns the tenant's rule configuration, seeding the default on first access.
    pub async fn get_compliance_rule(&self, tenant: &TenantId) -> ComplianceResult<RuleConfig> {
        self.rules.get(tenant).await
    }

    /// Switches the tenant to `rule_set` with `overrides` applied.
    pub async fn update_compliance_rule(
        &self,
        tenant: &TenantId,
        rule_set: &str,
        overrides: &RuleOverrides,
        actor: &str,
    ) -> ComplianceResult<RuleConfig> {
        self.rules.update(tenant, rule_set, overrides, actor).await
    }

    /// Checks the intervals starting in `[start, end]` and stores the violations found.
    pub async fn check_compliance(
        &self,
        tenant: &TenantId,
        user_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        trigger: CheckTrigger,
    ) -> ComplianceResult<Vec<Violation>> {
        self.violations
            .check_compliance(tenant, user_id, start, end, trigger)
            .await
    }

    /// Runs an automatic check for one user.
    pub async fn detect_violations(
        &self,
        tenant: &TenantId,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ComplianceResult<()> {
        self.violations
            .detect_violations(tenant, user_id, start, end)
            .await
    }

    /// Lists violations, newest first, with the total number of matches.
    pub async fn get_violations(
        &self,
        tenant: &TenantId,
        filter: &ViolationFilter,
    ) -> ComplianceResult<(Vec<Violation>, usize)> {
        self.violations.get_violations(tenant, filter).await
    }

    /// Returns a violation by id.
    pub async fn get_violation(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> ComplianceResult<Option<Violation>> {
        self.violations.get_violation(tenant, id).await
    }

    /// Sets or clears a violation's acknowledgment.
    pub async fn acknowledge_violation(
        &self,
        tenant: &TenantId,
        id: &str,
        actor: &str,
        acknowledged: bool,
    ) -> ComplianceResult<Violation> {
        self.violations
            .acknowledge_violation(tenant, id, actor, acknowledged)
            .await
    }

    /// Generates and stores a report.
    pub async fn generate_report(
        &self,
        tenant: &TenantId,
        actor: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        format: ReportFormat,
        filters: &ReportFilters,
    ) -> ComplianceResult<Report> {
        self.reports
            .generate_report(tenant, actor, start, end, format, filters)
            .await
    }

    /// Returns report metadata with a time-limited download URL.
    pub async fn get_report(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> ComplianceResult<Option<ReportDownload>> {
        self.reports.get_report(tenant, id).await
    }

    /// Checks a stored report artifact against its recorded hash.
    pub async fn verify_report(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> ComplianceResult<ReportVerification> {
        self.reports.verify_report(tenant, id).await
    }

    /// Reads the audit trail, newest first.
    ///
    /// A missing limit becomes the default page size; larger limits than
    /// the maximum page size are rejected.
    pub async fn get_audit_logs(
        &self,
        tenant: &TenantId,
        query: &AuditLogQuery,
    ) -> ComplianceResult<Vec<AuditLogEntry>> {
        let limit = query.limit.unwrap_or(self.settings.default_page_size);
        if limit == 0 || limit > self.settings.max_page_size {
            return Err(ComplianceError::validation(
                "limit",
                format!("must be between 1 and {}", self.settings.max_page_size),
            ));
        }
        let query = AuditLogQuery {
            limit: Some(limit),
            ..query.clone()
        };
        self.audit.query(tenant, &query).await
    }

    /// Computes violation statistics for the tenant.
    pub async fn get_compliance_stats(
        &self,
        tenant: &TenantId,
    ) -> ComplianceResult<ComplianceStats> {
        self.stats.get_compliance_stats(tenant).await
    }

    /// Takes the receiver of failed time-account adjustments. Only the first
    /// call returns it.
    pub fn adjustment_failures(&self) -> Option<mpsc::Receiver<AdjustmentFailure>> {
        self.adjustments.take_failures()
    }

    /// Waits until every adjustment queued so far has been processed.
    pub async fn flush_adjustments(&self) {
        self.adjustments.flush().await
    }
}
