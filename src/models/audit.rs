//! Audit log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TenantId;

/// Stable identifiers for audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A tenant's rule configuration was replaced.
    RuleSetChanged,
    /// A compliance check was run on request.
    ComplianceCheck,
    /// A violation's acknowledgment was set or cleared.
    ViolationAcknowledged,
    /// A compliance report was generated.
    ReportGenerated,
}

impl AuditAction {
    /// Returns the wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RuleSetChanged => "RULE_SET_CHANGED",
            AuditAction::ComplianceCheck => "COMPLIANCE_CHECK",
            AuditAction::ViolationAcknowledged => "VIOLATION_ACKNOWLEDGED",
            AuditAction::ReportGenerated => "REPORT_GENERATED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit entry as submitted by a service; the store stamps id and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub actor_uid: String,
    /// Action-specific payload.
    pub details: serde_json::Value,
}

impl NewAuditEntry {
    /// Creates a new audit entry payload.
    pub fn new(
        action: AuditAction,
        actor_uid: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            action,
            actor_uid: actor_uid.into(),
            details,
        }
    }
}

/// A persisted, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Store-assigned identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub actor_uid: String,
    /// When the store recorded it.
    pub timestamp: DateTime<Utc>,
    /// Action-specific payload.
    pub details: serde_json::Value,
}

/// Filters for reading the audit log. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    /// Only entries with this action.
    #[serde(default)]
    pub action: Option<AuditAction>,
    /// Only entries recorded for this actor.
    #[serde(default)]
    pub actor_uid: Option<String>,
    /// Only entries at or after this instant.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Only entries at or before this instant.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of entries to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl AuditLogQuery {
    /// Returns true if the entry satisfies every criterion of the query.
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.action.is_none_or(|action| entry.action == action)
            && self
                .actor_uid
                .as_deref()
                .is_none_or(|actor| entry.actor_uid == actor)
            && self.from.is_none_or(|from| entry.timestamp >= from)
            && self.to.is_none_or(|to| entry.timestamp <= to)
    }
}
