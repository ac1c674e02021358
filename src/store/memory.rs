//! In-memory store implementations.
//!
//! These back the test-suite and embedded use. Each store keeps per-tenant
//! state behind a `parking_lot` lock and stamps ids (UUID v4) and write
//! times from the injected [`Clock`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::RuleConfig;
use crate::error::{ComplianceError, ComplianceResult};
use crate::models::{
    AdjustmentOutcome, AuditLogEntry, AuditLogQuery, DetectedViolation, NewAuditEntry, NewReport,
    Report, TenantId, TimeAccountAdjustment, Violation, ViolationFilter, WorkInterval,
};

use super::{
    Acknowledgement, AuditRepository, BlobStore, Clock, IntervalSource, ReportRepository,
    RuleConfigRepository, SignedUrl, TimeAccountLedger, ViolationRepository,
};

/// Work intervals held in memory.
#[derive(Debug, Default)]
pub struct MemoryIntervalSource {
    intervals: RwLock<HashMap<TenantId, Vec<WorkInterval>>>,
}

impl MemoryIntervalSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records intervals for a tenant.
    pub fn add(&self, tenant: &TenantId, intervals: impl IntoIterator<Item = WorkInterval>) {
        self.intervals
            .write()
            .entry(tenant.clone())
            .or_default()
            .extend(intervals);
    }
}

#[async_trait]
impl IntervalSource for MemoryIntervalSource {
    async fn list_intervals(
        &self,
        tenant: &TenantId,
        user_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ComplianceResult<Vec<WorkInterval>> {
        let guard = self.intervals.read();
        Ok(guard
            .get(tenant)
            .map(|intervals| {
                intervals
                    .iter()
                    .filter(|i| user_id.is_none_or(|user| i.user_id == user))
                    .filter(|i| i.start >= start && i.start <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Rule configurations held in memory.
#[derive(Debug, Default)]
pub struct MemoryRuleConfigRepository {
    configs: RwLock<HashMap<TenantId, RuleConfig>>,
}

impl MemoryRuleConfigRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleConfigRepository for MemoryRuleConfigRepository {
    async fn get(&self, tenant: &TenantId) -> ComplianceResult<Option<RuleConfig>> {
        Ok(self.configs.read().get(tenant).cloned())
    }

    async fn insert_if_absent(
        &self,
        tenant: &TenantId,
        config: RuleConfig,
    ) -> ComplianceResult<RuleConfig> {
        Ok(self
            .configs
            .write()
            .entry(tenant.clone())
            .or_insert(config)
            .clone())
    }

    async fn put(&self, tenant: &TenantId, config: RuleConfig) -> ComplianceResult<()> {
        self.configs.write().insert(tenant.clone(), config);
        Ok(())
    }
}

/// Violations held in memory, in insertion order per tenant.
pub struct MemoryViolationRepository {
    clock: Arc<dyn Clock>,
    violations: RwLock<HashMap<TenantId, Vec<Violation>>>,
}

impl MemoryViolationRepository {
    /// Creates an empty repository stamping `detected_at` from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            violations: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored violations for a tenant.
    pub fn len(&self, tenant: &TenantId) -> usize {
        self.violations.read().get(tenant).map_or(0, Vec::len)
    }

    /// Removes a violation outright. Only for seeding and tests.
    pub fn remove(&self, tenant: &TenantId, id: &str) -> Option<Violation> {
        let mut guard = self.violations.write();
        let list = guard.get_mut(tenant)?;
        let index = list.iter().position(|v| v.id == id)?;
        Some(list.remove(index))
    }
}

#[async_trait]
impl ViolationRepository for MemoryViolationRepository {
    async fn insert(
        &self,
        tenant: &TenantId,
        rule_set: &str,
        detected: DetectedViolation,
    ) -> ComplianceResult<Violation> {
        let violation = Violation {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant.clone(),
            user_id: detected.user_id,
            violation_type: detected.violation_type,
            severity: detected.severity,
            detected_at: self.clock.now(),
            period_start: detected.period_start,
            period_end: detected.period_end,
            rule_set: rule_set.to_string(),
            details: detected.details,
            acknowledged_at: None,
            acknowledged_by: None,
        };
        self.violations
            .write()
            .entry(tenant.clone())
            .or_default()
            .push(violation.clone());
        Ok(violation)
    }

    async fn get(&self, tenant: &TenantId, id: &str) -> ComplianceResult<Option<Violation>> {
        Ok(self
            .violations
            .read()
            .get(tenant)
            .and_then(|list| list.iter().find(|v| v.id == id).cloned()))
    }

    async fn acknowledge(
        &self,
        tenant: &TenantId,
        id: &str,
        change: Acknowledgement,
    ) -> ComplianceResult<Option<Violation>> {
        let mut guard = self.violations.write();
        let Some(violation) = guard
            .get_mut(tenant)
            .and_then(|list| list.iter_mut().find(|v| v.id == id))
        else {
            return Ok(None);
        };

        match change {
            Acknowledgement::Set { at, by } => {
                if !violation.is_acknowledged() {
                    violation.acknowledged_at = Some(at);
                    violation.acknowledged_by = Some(by);
                }
            }
            Acknowledgement::Clear => {
                violation.acknowledged_at = None;
                violation.acknowledged_by = None;
            }
        }
        Ok(Some(violation.clone()))
    }

    async fn query(
        &self,
        tenant: &TenantId,
        filter: &ViolationFilter,
    ) -> ComplianceResult<(Vec<Violation>, usize)> {
        let guard = self.violations.read();
        let mut matches: Vec<&Violation> = guard
            .get(tenant)
            .map(|list| list.iter().rev().filter(|v| filter.matches(v)).collect())
            .unwrap_or_default();
        // Stable sort keeps newest insertion first among equal timestamps.
        matches.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));

        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok((page, total))
    }
}

/// Audit entries held in memory. Entries are never changed or removed.
pub struct MemoryAuditRepository {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<TenantId, Vec<AuditLogEntry>>>,
}

impl MemoryAuditRepository {
    /// Creates an empty log stamping entries from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AuditRepository for MemoryAuditRepository {
    async fn append(
        &self,
        tenant: &TenantId,
        entry: NewAuditEntry,
    ) -> ComplianceResult<AuditLogEntry> {
        let stored = AuditLogEntry {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant.clone(),
            action: entry.action,
            actor_uid: entry.actor_uid,
            timestamp: self.clock.now(),
            details: entry.details,
        };
        self.entries
            .write()
            .entry(tenant.clone())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn query(
        &self,
        tenant: &TenantId,
        query: &AuditLogQuery,
    ) -> ComplianceResult<Vec<AuditLogEntry>> {
        let guard = self.entries.read();
        let mut matches: Vec<AuditLogEntry> = guard
            .get(tenant)
            .map(|list| list.iter().rev().filter(|e| query.matches(e)).cloned().collect())
            .unwrap_or_default();
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matches.truncate(query.limit.unwrap_or(usize::MAX));
        Ok(matches)
    }
}

/// Report metadata held in memory.
#[derive(Debug, Default)]
pub struct MemoryReportRepository {
    reports: RwLock<HashMap<TenantId, HashMap<String, Report>>>,
}

impl MemoryReportRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportRepository for MemoryReportRepository {
    async fn insert(&self, tenant: &TenantId, report: NewReport) -> ComplianceResult<Report> {
        let report = Report::from_new(tenant, report);
        let mut guard = self.reports.write();
        let reports = guard.entry(tenant.clone()).or_default();
        if reports.contains_key(&report.id) {
            return Err(ComplianceError::storage(format!(
                "report {} already exists",
                report.id
            )));
        }
        reports.insert(report.id.clone(), report.clone());
        Ok(report)
    }

    async fn get(&self, tenant: &TenantId, id: &str) -> ComplianceResult<Option<Report>> {
        Ok(self
            .reports
            .read()
            .get(tenant)
            .and_then(|reports| reports.get(id).cloned()))
    }
}

/// Artifacts held in memory; download URLs use the `memory://` scheme.
pub struct MemoryBlobStore {
    clock: Arc<dyn Clock>,
    blobs: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    /// Creates an empty store minting URL expiries from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if no artifact is stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Returns the content type recorded for an artifact.
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.blobs.read().get(path).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> ComplianceResult<()> {
        self.blobs
            .write()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, path: &str) -> ComplianceResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(path).map(|(bytes, _)| bytes.clone()))
    }

    async fn delete(&self, path: &str) -> ComplianceResult<()> {
        self.blobs.write().remove(path);
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> ComplianceResult<SignedUrl> {
        if !self.blobs.read().contains_key(path) {
            return Err(ComplianceError::not_found("artifact", path));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| ComplianceError::validation("ttl", e.to_string()))?;
        let expires_at = self.clock.now() + ttl;
        Ok(SignedUrl {
            url: format!("memory://{}?expires={}", path, expires_at.timestamp()),
            expires_at,
        })
    }
}

/// A time-account ledger that records adjustments in memory.
#[derive(Debug)]
pub struct MemoryTimeAccountLedger {
    enabled: bool,
    adjustments: Mutex<Vec<(TenantId, TimeAccountAdjustment)>>,
}

impl MemoryTimeAccountLedger {
    /// Creates a ledger with the time-account module enabled.
    pub fn new() -> Self {
        Self {
            enabled: true,
            adjustments: Mutex::new(Vec::new()),
        }
    }

    /// Creates a ledger reporting the module as not enabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            adjustments: Mutex::new(Vec::new()),
        }
    }

    /// Returns every booked adjustment.
    pub fn adjustments(&self) -> Vec<(TenantId, TimeAccountAdjustment)> {
        self.adjustments.lock().clone()
    }
}

impl Default for MemoryTimeAccountLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeAccountLedger for MemoryTimeAccountLedger {
    async fn add_adjustment(
        &self,
        tenant: &TenantId,
        adjustment: &TimeAccountAdjustment,
    ) -> ComplianceResult<AdjustmentOutcome> {
        if !self.enabled {
            return Ok(AdjustmentOutcome::ModuleDisabled);
        }
        self.adjustments
            .lock()
            .push((tenant.clone(), adjustment.clone()));
        Ok(AdjustmentOutcome::Recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Severity, ViolationDetails, ViolationType};
    use crate::store::ManualClock;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, hour, 0, 0).unwrap()
    }

    fn detected(user: &str) -> DetectedViolation {
        DetectedViolation {
            user_id: user.to_string(),
            violation_type: ViolationType::ShiftDurationViolation,
            severity: Severity::Warning,
            period_start: at(8),
            period_end: at(19),
            details: ViolationDetails {
                expected: 600,
                actual: 660,
                affected_entries: vec!["i1".to_string()],
            },
        }
    }

    #[tokio::test]
    async fn test_violation_insert_stamps_id_and_time() {
        let clock = Arc::new(ManualClock::new(at(20)));
        let repo = MemoryViolationRepository::new(clock);
        let tenant = TenantId::new("acme");

        let v = repo.insert(&tenant, "EU", detected("u1")).await.unwrap();

        assert!(!v.id.is_empty());
        assert_eq!(v.detected_at, at(20));
        assert_eq!(v.rule_set, "EU");
        assert_eq!(repo.get(&tenant, &v.id).await.unwrap(), Some(v));
    }

    #[tokio::test]
    async fn test_violations_are_tenant_scoped() {
        let repo = MemoryViolationRepository::new(Arc::new(ManualClock::new(at(20))));
        let acme = TenantId::new("acme");
        let other = TenantId::new("globex");

        let v = repo.insert(&acme, "EU", detected("u1")).await.unwrap();

        assert!(repo.get(&other, &v.id).await.unwrap().is_none());
        let (page, total) = repo.query(&other, &ViolationFilter::default()).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_query_orders_newest_first_and_paginates() {
        let clock = Arc::new(ManualClock::new(at(9)));
        let repo = MemoryViolationRepository::new(clock.clone());
        let tenant = TenantId::new("acme");

        let mut ids = Vec::new();
        for hour in 9..14 {
            clock.set(at(hour));
            ids.push(repo.insert(&tenant, "EU", detected("u1")).await.unwrap().id);
        }

        let filter = ViolationFilter {
            limit: Some(2),
            offset: 1,
            ..Default::default()
        };
        let (page, total) = repo.query(&tenant, &filter).await.unwrap();

        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, ids[3]);
        assert_eq!(page[1].id, ids[2]);
    }

    #[tokio::test]
    async fn test_acknowledge_keeps_first_values_and_can_clear() {
        let repo = MemoryViolationRepository::new(Arc::new(ManualClock::new(at(9))));
        let tenant = TenantId::new("acme");
        let v = repo.insert(&tenant, "EU", detected("u1")).await.unwrap();

        let first = Acknowledgement::Set {
            at: at(10),
            by: "alice".to_string(),
        };
        let second = Acknowledgement::Set {
            at: at(11),
            by: "bob".to_string(),
        };
        repo.acknowledge(&tenant, &v.id, first).await.unwrap();
        let after = repo.acknowledge(&tenant, &v.id, second).await.unwrap().unwrap();

        assert_eq!(after.acknowledged_at, Some(at(10)));
        assert_eq!(after.acknowledged_by.as_deref(), Some("alice"));

        let cleared = repo
            .acknowledge(&tenant, &v.id, Acknowledgement::Clear)
            .await
            .unwrap()
            .unwrap();
        assert!(!cleared.is_acknowledged());
        assert!(cleared.acknowledged_by.is_none());
    }

    #[tokio::test]
    async fn test_acknowledge_unknown_violation_returns_none() {
        let repo = MemoryViolationRepository::new(Arc::new(ManualClock::new(at(9))));
        let result = repo
            .acknowledge(&TenantId::new("acme"), "missing", Acknowledgement::Clear)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_existing_config() {
        let repo = MemoryRuleConfigRepository::new();
        let tenant = TenantId::new("acme");
        let mut first = crate::engine::test_support::eu_config();
        first.updated_by = "first".to_string();
        let mut second = first.clone();
        second.updated_by = "second".to_string();

        repo.insert_if_absent(&tenant, first).await.unwrap();
        let kept = repo.insert_if_absent(&tenant, second).await.unwrap();

        assert_eq!(kept.updated_by, "first");
    }

    #[tokio::test]
    async fn test_interval_source_filters_by_user_and_window() {
        let source = MemoryIntervalSource::new();
        let tenant = TenantId::new("acme");
        source.add(
            &tenant,
            vec![
                WorkInterval::new("a", "u1", at(8), at(12)),
                WorkInterval::new("b", "u2", at(9), at(12)),
                WorkInterval::new("c", "u1", at(14), at(18)),
            ],
        );

        let all = source.list_intervals(&tenant, None, at(0), at(10)).await.unwrap();
        let u1 = source
            .list_intervals(&tenant, Some("u1"), at(0), at(23))
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(u1.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_signed_url_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new(at(9)));
        let blobs = MemoryBlobStore::new(clock);
        blobs.put("r/1.csv", b"x".to_vec(), "text/csv").await.unwrap();

        let url = blobs
            .signed_url("r/1.csv", Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(url.expires_at, at(9) + chrono::Duration::minutes(10));
        assert!(url.url.starts_with("memory://r/1.csv"));
        assert!(
            blobs
                .signed_url("missing", Duration::from_secs(1))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_disabled_ledger_books_nothing() {
        let ledger = MemoryTimeAccountLedger::disabled();
        let adjustment = TimeAccountAdjustment {
            user_id: "u1".to_string(),
            year: 2026,
            month: 2,
            hours: rust_decimal::Decimal::ONE,
            reason: "test".to_string(),
            violation_id: "v1".to_string(),
            actor: "system".to_string(),
        };

        let outcome = ledger
            .add_adjustment(&TenantId::new("acme"), &adjustment)
            .await
            .unwrap();

        assert_eq!(outcome, AdjustmentOutcome::ModuleDisabled);
        assert!(ledger.adjustments().is_empty());
    }
}
