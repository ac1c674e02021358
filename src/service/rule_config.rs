//! Per-tenant rule configuration.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::config::{RuleConfig, RuleOverrides, RuleSetCatalog};
use crate::error::{ComplianceError, ComplianceResult};
use crate::models::{AuditAction, TenantId};
use crate::store::{Clock, RuleConfigRepository};

use super::audit::AuditLogger;

/// Actor recorded for configurations the service creates on its own.
pub const SYSTEM_ACTOR: &str = "system";

/// Reads and replaces the active [`RuleConfig`] of each tenant.
///
/// A tenant without a configuration receives the default rule set on first
/// read. Nothing is cached; every call goes to the repository.
#[derive(Clone)]
pub struct RuleConfigStore {
    repo: Arc<dyn RuleConfigRepository>,
    catalog: Arc<RuleSetCatalog>,
    audit: AuditLogger,
    clock: Arc<dyn Clock>,
    default_rule_set: String,
}

impl RuleConfigStore {
    /// Creates a store seeding new tenants with `default_rule_set`.
    pub fn new(
        repo: Arc<dyn RuleConfigRepository>,
        catalog: Arc<RuleSetCatalog>,
        audit: AuditLogger,
        clock: Arc<dyn Clock>,
        default_rule_set: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            catalog,
            audit,
            clock,
            default_rule_set: default_rule_set.into(),
        }
    }

    /// Returns the rule set catalog backing this store.
    pub fn catalog(&self) -> &RuleSetCatalog {
        &self.catalog
    }

    /// Returns the tenant's configuration, creating the default one if absent.
    pub async fn get(&self, tenant: &TenantId) -> ComplianceResult<RuleConfig> {
        if let Some(config) = self.repo.get(tenant).await? {
            return Ok(config);
        }

        let config = self.catalog.build_config(
            &self.default_rule_set,
            &RuleOverrides::default(),
            SYSTEM_ACTOR,
            self.clock.now(),
        )?;
        let config = self.repo.insert_if_absent(tenant, config).await?;
        info!(
            tenant = %tenant,
            rule_set = %config.rule_set,
            "Seeded default rule configuration"
        );
        Ok(config)
    }

    /// Replaces the tenant's configuration with `rule_set` plus `overrides`.
    ///
    /// Fails with [`ComplianceError::UnknownRuleSet`] for rule sets missing
    /// from the catalog and with a validation error for an empty actor or an
    /// unusable threshold. Nothing is written when validation fails.
    pub async fn update(
        &self,
        tenant: &TenantId,
        rule_set: &str,
        overrides: &RuleOverrides,
        actor: &str,
    ) -> ComplianceResult<RuleConfig> {
        if actor.trim().is_empty() {
            return Err(ComplianceError::validation("actor", "must not be empty"));
        }
        let config = self
            .catalog
            .build_config(rule_set, overrides, actor, self.clock.now())?;
        let previous = self.repo.get(tenant).await?.map(|c| c.rule_set);

        self.repo.put(tenant, config.clone()).await?;
        self.audit
            .record(
                tenant,
                AuditAction::RuleSetChanged,
                actor,
                json!({
                    "ruleSet": config.rule_set,
                    "previousRuleSet": previous,
                    "overrides": overrides,
                }),
            )
            .await?;

        info!(
            tenant = %tenant,
            rule_set = %config.rule_set,
            actor = actor,
            "Rule configuration updated"
        );
        Ok(config)
    }
}
