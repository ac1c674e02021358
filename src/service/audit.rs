//! Audit logging.

use std::sync::Arc;

use tracing::debug;

use crate::error::ComplianceResult;
use crate::models::{AuditAction, AuditLogEntry, AuditLogQuery, NewAuditEntry, TenantId};
use crate::store::AuditRepository;

/// Writes and reads the tenant audit trail.
#[derive(Clone)]
pub struct AuditLogger {
    repo: Arc<dyn AuditRepository>,
}

impl AuditLogger {
    /// Creates a logger over the given repository.
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    /// Appends an entry for `action`.
    pub async fn record(
        &self,
        tenant: &TenantId,
        action: AuditAction,
        actor: &str,
        details: serde_json::Value,
    ) -> ComplianceResult<AuditLogEntry> {
        let entry = self
            .repo
            .append(tenant, NewAuditEntry::new(action, actor, details))
            .await?;
        debug!(
            tenant = %tenant,
            action = %action,
            actor = actor,
            audit_id = %entry.id,
            "Audit entry recorded"
        );
        Ok(entry)
    }

    /// Returns matching entries, newest first.
    pub async fn query(
        &self,
        tenant: &TenantId,
        query: &AuditLogQuery,
    ) -> ComplianceResult<Vec<AuditLogEntry>> {
        self.repo.query(tenant, query).await
    }
}
