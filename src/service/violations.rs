//! Compliance checks and violation management.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine;
use crate::error::{ComplianceError, ComplianceResult};
use crate::models::{AuditAction, TenantId, Violation, ViolationFilter};
use crate::store::{Acknowledgement, Clock, IntervalSource, ViolationRepository};

use super::adjustments::AdjustmentDispatcher;
use super::audit::AuditLogger;
use super::rule_config::{RuleConfigStore, SYSTEM_ACTOR};

/// What started a compliance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckTrigger {
    /// A person asked for the check. Manual checks are audited.
    Manual {
        /// The requesting user.
        actor: String,
    },
    /// An event such as a clock-out started the check.
    Automatic,
}

impl CheckTrigger {
    /// Creates a manual trigger for `actor`.
    pub fn manual(actor: impl Into<String>) -> Self {
        CheckTrigger::Manual {
            actor: actor.into(),
        }
    }

    /// The actor attributed with side effects of the check.
    pub fn actor(&self) -> &str {
        match self {
            CheckTrigger::Manual { actor } => actor,
            CheckTrigger::Automatic => SYSTEM_ACTOR,
        }
    }
}

/// Page bounds for violation listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Limit applied when a query names none.
    pub default_page_size: usize,
    /// Largest limit a query may name.
    pub max_page_size: usize,
}

/// Runs compliance checks and manages the resulting violation records.
#[derive(Clone)]
pub struct ViolationService {
    intervals: Arc<dyn IntervalSource>,
    violations: Arc<dyn ViolationRepository>,
    rules: RuleConfigStore,
    audit: AuditLogger,
    adjustments: Arc<AdjustmentDispatcher>,
    clock: Arc<dyn Clock>,
    limits: PageLimits,
}

impl ViolationService {
    /// Wires the service to its collaborators.
    pub fn new(
        intervals: Arc<dyn IntervalSource>,
        violations: Arc<dyn ViolationRepository>,
        rules: RuleConfigStore,
        audit: AuditLogger,
        adjustments: Arc<AdjustmentDispatcher>,
        clock: Arc<dyn Clock>,
        limits: PageLimits,
    ) -> Self {
        Self {
            intervals,
            violations,
            rules,
            audit,
            adjustments,
            clock,
            limits,
        }
    }

    /// Evaluates the intervals starting in `[start, end]` and stores every
    /// violation found.
    ///
    /// Checks the given user only, or every user of the tenant when
    /// `user_id` is `None`. Each stored violation queues a time-account
    /// adjustment on the background worker; the check does not wait for it.
    /// Repeating a check over the same window stores the violations again.
    pub async fn check_compliance(
        &self,
        tenant: &TenantId,
        user_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        trigger: CheckTrigger,
    ) -> ComplianceResult<Vec<Violation>> {
        validate_window(start, end)?;
        if trigger.actor().trim().is_empty() {
            return Err(ComplianceError::validation("actor", "must not be empty"));
        }

        let correlation_id = Uuid::new_v4();
        let started = Instant::now();
        info!(
            correlation_id = %correlation_id,
            tenant = %tenant,
            user_id = user_id.unwrap_or("*"),
            %start,
            %end,
            "Running compliance check"
        );

        let config = self.rules.get(tenant).await?;
        let intervals = self
            .intervals
            .list_intervals(tenant, user_id, start, end)
            .await?;
        let detected = engine::evaluate(&intervals, &config);

        let mut stored = Vec::with_capacity(detected.len());
        for violation in detected {
            let violation = self
                .violations
                .insert(tenant, &config.rule_set, violation)
                .await?;
            self.adjustments
                .dispatch(tenant, &violation, trigger.actor());
            stored.push(violation);
        }

        // Violations are stored and bookings queued by now; audit failures are only logged.
        if let CheckTrigger::Manual { actor } = &trigger {
            let recorded = self
                .audit
                .record(
                    tenant,
                    AuditAction::ComplianceCheck,
                    actor,
                    json!({
                        "userId": user_id,
                        "periodStart": start,
                        "periodEnd": end,
                        "intervalsChecked": intervals.len(),
                        "violationsFound": stored.len(),
                        "correlationId": correlation_id.to_string(),
                    }),
                )
                .await;
            if let Err(e) = recorded {
                error!(
                    correlation_id = %correlation_id,
                    tenant = %tenant,
                    error = %e,
                    "Failed to audit compliance check"
                );
            }
        }

        info!(
            correlation_id = %correlation_id,
            tenant = %tenant,
            rule_set = %config.rule_set,
            intervals = intervals.len(),
            violations = stored.len(),
            duration_us = started.elapsed().as_micros(),
            "Compliance check completed"
        );
        Ok(stored)
    }

    /// Runs an automatic check for one user, e.g. after a clock-out.
    pub async fn detect_violations(
        &self,
        tenant: &TenantId,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ComplianceResult<()> {
        self.check_compliance(tenant, Some(user_id), start, end, CheckTrigger::Automatic)
            .await
            .map(|_| ())
    }

    /// Sets (`acknowledged = true`) or clears the acknowledgment of a violation.
    ///
    /// A violation that is already acknowledged keeps its original time and
    /// actor. Fails with [`ComplianceError::NotFound`] for unknown ids.
    pub async fn acknowledge_violation(
        &self,
        tenant: &TenantId,
        id: &str,
        actor: &str,
        acknowledged: bool,
    ) -> ComplianceResult<Violation> {
        if actor.trim().is_empty() {
            return Err(ComplianceError::validation("actor", "must not be empty"));
        }
        let change = if acknowledged {
            Acknowledgement::Set {
                at: self.clock.now(),
                by: actor.to_string(),
            }
        } else {
            Acknowledgement::Clear
        };

        let violation = self
            .violations
            .acknowledge(tenant, id, change)
            .await?
            .ok_or_else(|| ComplianceError::not_found("violation", id))?;

        self.audit
            .record(
                tenant,
                AuditAction::ViolationAcknowledged,
                actor,
                json!({
                    "violationId": violation.id,
                    "acknowledged": acknowledged,
                }),
            )
            .await?;

        info!(
            tenant = %tenant,
            violation_id = %violation.id,
            acknowledged,
            actor,
            "Violation acknowledgment updated"
        );
        Ok(violation)
    }

    /// Lists violations matching `filter`, newest first, with the total
    /// number of matches.
    ///
    /// A missing limit becomes the default page size; a limit of zero or
    /// above the maximum page size, or a reversed date range, is rejected.
    pub async fn get_violations(
        &self,
        tenant: &TenantId,
        filter: &ViolationFilter,
    ) -> ComplianceResult<(Vec<Violation>, usize)> {
        let limit = filter.limit.unwrap_or(self.limits.default_page_size);
        if limit == 0 || limit > self.limits.max_page_size {
            warn!(tenant = %tenant, limit, "Rejected violation page size");
            return Err(ComplianceError::validation(
                "limit",
                format!("must be between 1 and {}", self.limits.max_page_size),
            ));
        }
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(ComplianceError::validation("from", "must not be after to"));
            }
        }

        let filter = ViolationFilter {
            limit: Some(limit),
            ..filter.clone()
        };
        self.violations.query(tenant, &filter).await
    }

    /// Returns a violation by id.
    pub async fn get_violation(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> ComplianceResult<Option<Violation>> {
        self.violations.get(tenant, id).await
    }
}

/// Rejects windows whose end lies before their start.
pub(crate) fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> ComplianceResult<()> {
    if end < start {
        return Err(ComplianceError::validation(
            "end",
            "must not be before start",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetCatalog;
    use crate::models::{AuditLogQuery, Severity, ViolationType, WorkInterval};
    use crate::models::{AuditLogEntry, NewAuditEntry};
    use crate::store::{AuditRepository, ManualClock};
    use crate::store::memory::{
        MemoryAuditRepository, MemoryIntervalSource, MemoryRuleConfigRepository,
        MemoryTimeAccountLedger, MemoryViolationRepository,
    };
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct Fixture {
        service: ViolationService,
        source: Arc<MemoryIntervalSource>,
        violations: Arc<MemoryViolationRepository>,
        ledger: Arc<MemoryTimeAccountLedger>,
        adjustments: Arc<AdjustmentDispatcher>,
        audit: AuditLogger,
        clock: Arc<ManualClock>,
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, minute, 0).unwrap()
    }

    struct UnavailableAudit;

    #[async_trait]
    impl AuditRepository for UnavailableAudit {
        async fn append(
            &self,
            _tenant: &TenantId,
            _entry: NewAuditEntry,
        ) -> ComplianceResult<AuditLogEntry> {
            Err(ComplianceError::storage("audit store offline"))
        }

        async fn query(
            &self,
            _tenant: &TenantId,
            _query: &AuditLogQuery,
        ) -> ComplianceResult<Vec<AuditLogEntry>> {
            Ok(Vec::new())
        }
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(at(20, 12, 0)));
        fixture_with_audit(clock.clone(), Arc::new(MemoryAuditRepository::new(clock)))
    }

    fn fixture_with_audit(clock: Arc<ManualClock>, audit: Arc<dyn AuditRepository>) -> Fixture {
        let audit = AuditLogger::new(audit);
        let rules = RuleConfigStore::new(
            Arc::new(MemoryRuleConfigRepository::new()),
            Arc::new(RuleSetCatalog::builtin().unwrap()),
            audit.clone(),
            clock.clone(),
            "EU",
        );
        let source = Arc::new(MemoryIntervalSource::new());
        let ledger = Arc::new(MemoryTimeAccountLedger::new());
        let adjustments = Arc::new(AdjustmentDispatcher::spawn(ledger.clone(), 16, 16));
        let violations = Arc::new(MemoryViolationRepository::new(clock.clone()));
        let service = ViolationService::new(
            source.clone(),
            violations.clone(),
            rules,
            audit.clone(),
            adjustments.clone(),
            clock.clone(),
            PageLimits {
                default_page_size: 2,
                max_page_size: 5,
            },
        );
        Fixture {
            service,
            source,
            violations,
            ledger,
            adjustments,
            audit,
            clock,
        }
    }

    fn short_rest(source: &MemoryIntervalSource, tenant: &TenantId) {
        source.add(
            tenant,
            vec![
                WorkInterval::new("a", "u1", at(12, 9, 0), at(12, 17, 0))
                    .with_break(at(12, 12, 0), at(12, 12, 30)),
                WorkInterval::new("b", "u1", at(12, 17, 5), at(13, 1, 0))
                    .with_break(at(12, 20, 0), at(12, 20, 30)),
            ],
        );
    }

    #[tokio::test]
    async fn test_manual_check_stores_audits_and_books() {
        let f = fixture();
        let tenant = TenantId::new("acme");
        short_rest(&f.source, &tenant);

        let found = f
            .service
            .check_compliance(
                &tenant,
                None,
                at(12, 0, 0),
                at(18, 0, 0),
                CheckTrigger::manual("alice"),
            )
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].violation_type, ViolationType::RestPeriodViolation);
        assert_eq!(found[0].severity, Severity::Error);
        assert_eq!(found[0].detected_at, at(20, 12, 0));
        assert_eq!(found[0].rule_set, "EU");

        let audit = f.audit.query(&tenant, &AuditLogQuery::default()).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::ComplianceCheck);
        assert_eq!(audit[0].details["violationsFound"], 1);

        f.adjustments.flush().await;
        let booked = f.ledger.adjustments();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].1.violation_id, found[0].id);
        assert_eq!(booked[0].1.actor, "alice");
    }

    #[tokio::test]
    async fn test_failed_check_audit_keeps_stored_results() {
        let clock = Arc::new(ManualClock::new(at(20, 12, 0)));
        let f = fixture_with_audit(clock, Arc::new(UnavailableAudit));
        let tenant = TenantId::new("acme");
        short_rest(&f.source, &tenant);

        let found = f
            .service
            .check_compliance(
                &tenant,
                None,
                at(12, 0, 0),
                at(18, 0, 0),
                CheckTrigger::manual("alice"),
            )
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(f.violations.len(&tenant), 1);
        f.adjustments.flush().await;
        assert_eq!(f.ledger.adjustments().len(), 1);
    }

    #[tokio::test]
    async fn test_automatic_check_is_not_audited() {
        let f = fixture();
        let tenant = TenantId::new("acme");
        short_rest(&f.source, &tenant);

        f.service
            .detect_violations(&tenant, "u1", at(12, 0, 0), at(18, 0, 0))
            .await
            .unwrap();

        assert!(f.audit.query(&tenant, &AuditLogQuery::default()).await.unwrap().is_empty());
        let (stored, total) = f
            .service
            .get_violations(&tenant, &ViolationFilter::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(stored[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_repeated_checks_store_duplicates() {
        let f = fixture();
        let tenant = TenantId::new("acme");
        short_rest(&f.source, &tenant);

        for _ in 0..2 {
            f.service
                .check_compliance(
                    &tenant,
                    Some("u1"),
                    at(12, 0, 0),
                    at(18, 0, 0),
                    CheckTrigger::Automatic,
                )
                .await
                .unwrap();
        }

        let (_, total) = f
            .service
            .get_violations(&tenant, &ViolationFilter::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_reversed_window_is_rejected() {
        let f = fixture();
        let err = f
            .service
            .check_compliance(
                &TenantId::new("acme"),
                None,
                at(18, 0, 0),
                at(12, 0, 0),
                CheckTrigger::Automatic,
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_acknowledge_twice_keeps_first_pair() {
        let f = fixture();
        let tenant = TenantId::new("acme");
        short_rest(&f.source, &tenant);
        let found = f
            .service
            .check_compliance(&tenant, None, at(12, 0, 0), at(18, 0, 0), CheckTrigger::Automatic)
            .await
            .unwrap();
        let id = &found[0].id;

        let first = f.service.acknowledge_violation(&tenant, id, "alice", true).await.unwrap();
        f.clock.advance(chrono::Duration::hours(1));
        let second = f.service.acknowledge_violation(&tenant, id, "bob", true).await.unwrap();

        assert_eq!(first.acknowledged_at, Some(at(20, 12, 0)));
        assert_eq!(second.acknowledged_at, first.acknowledged_at);
        assert_eq!(second.acknowledged_by.as_deref(), Some("alice"));

        let cleared = f.service.acknowledge_violation(&tenant, id, "bob", false).await.unwrap();
        assert!(!cleared.is_acknowledged());

        let audit = f.audit.query(&tenant, &AuditLogQuery::default()).await.unwrap();
        assert_eq!(audit.len(), 3);
    }

    #[tokio::test]
    async fn test_acknowledge_unknown_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .acknowledge_violation(&TenantId::new("acme"), "missing", "alice", true)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_page_limits_are_enforced() {
        let f = fixture();
        let tenant = TenantId::new("acme");

        let too_big = ViolationFilter {
            limit: Some(6),
            ..Default::default()
        };
        let zero = ViolationFilter {
            limit: Some(0),
            ..Default::default()
        };
        let reversed = ViolationFilter {
            from: Some(at(15, 0, 0)),
            to: Some(at(14, 0, 0)),
            ..Default::default()
        };

        for filter in [too_big, zero, reversed] {
            assert!(f.service.get_violations(&tenant, &filter).await.unwrap_err().is_validation());
        }
    }

    #[tokio::test]
    async fn test_default_page_size_applies() {
        let f = fixture();
        let tenant = TenantId::new("acme");
        short_rest(&f.source, &tenant);
        for _ in 0..3 {
            f.service
                .check_compliance(
                    &tenant,
                    None,
                    at(12, 0, 0),
                    at(18, 0, 0),
                    CheckTrigger::Automatic,
                )
                .await
                .unwrap();
        }

        let (page, total) = f
            .service
            .get_violations(&tenant, &ViolationFilter::default())
            .await
            .unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(total, 3);
    }
}
