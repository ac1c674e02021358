//! Persistence and collaborator ports.
//!
//! Every component receives its stores as `Arc<dyn Trait>` so that durable
//! backends and the in-memory implementations in [`memory`] are
//! interchangeable. All stores are tenant-scoped. Stores stamp ids and
//! write timestamps from their [`Clock`] at write time.

mod clock;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::RuleConfig;
use crate::error::ComplianceResult;
use crate::models::{
    AdjustmentOutcome, AuditLogEntry, AuditLogQuery, DetectedViolation, NewAuditEntry, NewReport,
    Report, TenantId, TimeAccountAdjustment, Violation, ViolationFilter, WorkInterval,
};

pub use clock::{Clock, ManualClock, SystemClock};

/// Source of recorded work time, across clock-based and scheduled records.
#[async_trait]
pub trait IntervalSource: Send + Sync {
    /// Lists intervals starting inside `[start, end]`, for one user or all users.
    async fn list_intervals(
        &self,
        tenant: &TenantId,
        user_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ComplianceResult<Vec<WorkInterval>>;
}

/// Storage for the active rule configuration of each tenant.
#[async_trait]
pub trait RuleConfigRepository: Send + Sync {
    /// Returns the tenant's configuration, if one exists.
    async fn get(&self, tenant: &TenantId) -> ComplianceResult<Option<RuleConfig>>;

    /// Stores `config` unless the tenant already has one.
    ///
    /// Returns the configuration in force after the call.
    async fn insert_if_absent(
        &self,
        tenant: &TenantId,
        config: RuleConfig,
    ) -> ComplianceResult<RuleConfig>;

    /// Replaces the tenant's configuration.
    async fn put(&self, tenant: &TenantId, config: RuleConfig) -> ComplianceResult<()>;
}

/// Change to a violation's acknowledgment pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Set the pair. A violation that is already acknowledged keeps its
    /// original values.
    Set {
        /// Acknowledgment time.
        at: DateTime<Utc>,
        /// Acknowledging actor.
        by: String,
    },
    /// Clear the pair.
    Clear,
}

/// Storage for detected violations.
#[async_trait]
pub trait ViolationRepository: Send + Sync {
    /// Persists a detected violation, assigning id and `detected_at`.
    async fn insert(
        &self,
        tenant: &TenantId,
        rule_set: &str,
        detected: DetectedViolation,
    ) -> ComplianceResult<Violation>;

    /// Returns a violation by id.
    async fn get(&self, tenant: &TenantId, id: &str) -> ComplianceResult<Option<Violation>>;

    /// Applies an acknowledgment change; `None` if the violation does not exist.
    async fn acknowledge(
        &self,
        tenant: &TenantId,
        id: &str,
        change: Acknowledgement,
    ) -> ComplianceResult<Option<Violation>>;

    /// Returns one page of matching violations, newest `detected_at` first,
    /// and the total number of matches.
    async fn query(
        &self,
        tenant: &TenantId,
        filter: &ViolationFilter,
    ) -> ComplianceResult<(Vec<Violation>, usize)>;
}

/// Append-only storage for audit entries.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends an entry, assigning id and timestamp.
    async fn append(
        &self,
        tenant: &TenantId,
        entry: NewAuditEntry,
    ) -> ComplianceResult<AuditLogEntry>;

    /// Returns matching entries, newest first.
    async fn query(
        &self,
        tenant: &TenantId,
        query: &AuditLogQuery,
    ) -> ComplianceResult<Vec<AuditLogEntry>>;
}

/// Storage for report metadata.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Persists report metadata.
    async fn insert(&self, tenant: &TenantId, report: NewReport) -> ComplianceResult<Report>;

    /// Returns report metadata by id.
    async fn get(&self, tenant: &TenantId, id: &str) -> ComplianceResult<Option<Report>>;
}

/// A time-limited download reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    /// The download URL.
    pub url: String,
    /// When the URL stops working.
    pub expires_at: DateTime<Utc>,
}

/// Binary artifact storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes an artifact, replacing any existing one at `path`.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> ComplianceResult<()>;

    /// Reads an artifact.
    async fn get(&self, path: &str) -> ComplianceResult<Option<Vec<u8>>>;

    /// Deletes an artifact; deleting a missing artifact is not an error.
    async fn delete(&self, path: &str) -> ComplianceResult<()>;

    /// Mints a download URL valid for `ttl`.
    async fn signed_url(&self, path: &str, ttl: Duration) -> ComplianceResult<SignedUrl>;
}

/// The time-account subsystem that books compensating adjustments.
#[async_trait]
pub trait TimeAccountLedger: Send + Sync {
    /// Books an adjustment. Tenants without the module report
    /// [`AdjustmentOutcome::ModuleDisabled`].
    async fn add_adjustment(
        &self,
        tenant: &TenantId,
        adjustment: &TimeAccountAdjustment,
    ) -> ComplianceResult<AdjustmentOutcome>;
}
