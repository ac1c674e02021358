//! Configuration types for compliance rule evaluation.
//!
//! [`RuleSetDefinition`] is a catalog entry deserialized from YAML;
//! [`RuleConfig`] is the concrete configuration in force for a tenant,
//! derived from a definition plus [`RuleOverrides`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, ComplianceResult};
use crate::models::{Severity, ViolationType};

/// Minutes in one week, the upper bound for every threshold.
const WEEK_MINUTES: i64 = 7 * 24 * 60;

/// A mandatory break tier.
///
/// A shift longer than `after_minutes` needs at least `min_break_minutes`
/// of recorded break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakRule {
    /// Worked duration above which the tier applies.
    pub after_minutes: i64,
    /// Minimum recorded break for the tier.
    pub min_break_minutes: i64,
}

/// Maps a violation's magnitude to a severity.
///
/// Magnitudes at or above `major_from_minutes` are classified as `major`,
/// everything below as `minor`. `minor` must not exceed `major`, which keeps
/// the mapping monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRule {
    /// Severity for small magnitudes.
    pub minor: Severity,
    /// Severity for large magnitudes.
    pub major: Severity,
    /// Magnitude in minutes at which `major` applies.
    pub major_from_minutes: i64,
}

impl Default for SeverityRule {
    fn default() -> Self {
        Self {
            minor: Severity::Warning,
            major: Severity::Error,
            major_from_minutes: 60,
        }
    }
}

impl SeverityRule {
    /// Classifies a magnitude in minutes.
    pub fn classify(&self, magnitude_minutes: i64) -> Severity {
        if magnitude_minutes >= self.major_from_minutes {
            self.major
        } else {
            self.minor
        }
    }
}

/// Per-violation-type severity rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityPolicy {
    rules: BTreeMap<ViolationType, SeverityRule>,
}

impl SeverityPolicy {
    /// Creates a policy from explicit rules.
    pub fn new(rules: BTreeMap<ViolationType, SeverityRule>) -> Self {
        Self { rules }
    }

    /// Returns the rule for a type, falling back to [`SeverityRule::default`].
    pub fn rule(&self, kind: ViolationType) -> SeverityRule {
        self.rules.get(&kind).copied().unwrap_or_default()
    }

    /// Classifies a violation of `kind` with the given magnitude.
    pub fn classify(&self, kind: ViolationType, magnitude_minutes: i64) -> Severity {
        self.rule(kind).classify(magnitude_minutes)
    }

    /// Returns a policy where `other`'s rules replace this policy's rules.
    pub fn merged_with(&self, other: &SeverityPolicy) -> SeverityPolicy {
        let mut rules = self.rules.clone();
        rules.extend(other.rules.iter().map(|(k, v)| (*k, *v)));
        SeverityPolicy { rules }
    }

    fn validate(&self) -> ComplianceResult<()> {
        for (kind, rule) in &self.rules {
            if rule.minor > rule.major {
                return Err(ComplianceError::validation(
                    format!("severity.{}", kind),
                    "minor severity must not exceed major severity",
                ));
            }
            if rule.major_from_minutes < 0 {
                return Err(ComplianceError::validation(
                    format!("severity.{}", kind),
                    "major_from_minutes must not be negative",
                ));
            }
        }
        Ok(())
    }
}

/// A named family of compliance thresholds from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleSetDefinition {
    /// Human-readable name of the rule set.
    pub name: String,
    /// URL of the legal source.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Maximum length of a single shift.
    pub max_shift_duration_minutes: i64,
    /// Minimum rest between two shifts.
    pub min_rest_period_minutes: i64,
    /// Mandatory break tiers.
    #[serde(default)]
    pub break_rules: Vec<BreakRule>,
    /// Minimum uninterrupted rest per week.
    pub min_weekly_rest_hours: i64,
    /// Maximum working time per ISO week.
    pub max_weekly_working_minutes: i64,
    /// Severity rules per violation type.
    #[serde(default)]
    pub severity: SeverityPolicy,
}

/// Optional tenant overrides applied on top of a rule set's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOverrides {
    /// Override for the maximum shift length.
    #[serde(default)]
    pub max_shift_duration_minutes: Option<i64>,
    /// Override for the minimum rest between shifts.
    #[serde(default)]
    pub min_rest_period_minutes: Option<i64>,
    /// Replacement break tiers.
    #[serde(default)]
    pub break_rules: Option<Vec<BreakRule>>,
    /// Override for the minimum weekly rest.
    #[serde(default)]
    pub min_weekly_rest_hours: Option<i64>,
    /// Override for the maximum weekly working time.
    #[serde(default)]
    pub max_weekly_working_minutes: Option<i64>,
    /// Severity rules replacing the rule set's rules per type.
    #[serde(default)]
    pub severity: Option<SeverityPolicy>,
}

/// The concrete configuration in force for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Catalog key of the rule set this configuration derives from.
    pub rule_set: String,
    /// Maximum length of a single shift.
    pub max_shift_duration_minutes: i64,
    /// Minimum rest between two shifts.
    pub min_rest_period_minutes: i64,
    /// Mandatory break tiers, sorted by `after_minutes`.
    pub break_rules: Vec<BreakRule>,
    /// Minimum uninterrupted rest per week.
    pub min_weekly_rest_hours: i64,
    /// Maximum working time per ISO week.
    pub max_weekly_working_minutes: i64,
    /// Severity rules per violation type.
    pub severity: SeverityPolicy,
    /// When the configuration was last written.
    pub updated_at: DateTime<Utc>,
    /// Who last wrote the configuration.
    pub updated_by: String,
}

impl RuleConfig {
    /// Builds a configuration from a catalog entry and overrides.
    ///
    /// Fails with a validation error if a resulting threshold is not positive
    /// or a severity rule is not monotonic.
    pub fn from_definition(
        rule_set: &str,
        definition: &RuleSetDefinition,
        overrides: &RuleOverrides,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> ComplianceResult<Self> {
        let mut break_rules = overrides
            .break_rules
            .clone()
            .unwrap_or_else(|| definition.break_rules.clone());
        break_rules.sort_by_key(|rule| rule.after_minutes);

        let severity = match &overrides.severity {
            Some(policy) => definition.severity.merged_with(policy),
            None => definition.severity.clone(),
        };

        let config = Self {
            rule_set: rule_set.to_string(),
            max_shift_duration_minutes: overrides
                .max_shift_duration_minutes
                .unwrap_or(definition.max_shift_duration_minutes),
            min_rest_period_minutes: overrides
                .min_rest_period_minutes
                .unwrap_or(definition.min_rest_period_minutes),
            break_rules,
            min_weekly_rest_hours: overrides
                .min_weekly_rest_hours
                .unwrap_or(definition.min_weekly_rest_hours),
            max_weekly_working_minutes: overrides
                .max_weekly_working_minutes
                .unwrap_or(definition.max_weekly_working_minutes),
            severity,
            updated_at,
            updated_by: updated_by.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every threshold is usable.
    pub fn validate(&self) -> ComplianceResult<()> {
        let positive = [
            ("maxShiftDurationMinutes", self.max_shift_duration_minutes),
            ("minRestPeriodMinutes", self.min_rest_period_minutes),
            ("minWeeklyRestHours", self.min_weekly_rest_hours),
            ("maxWeeklyWorkingMinutes", self.max_weekly_working_minutes),
        ];
        for (field, value) in positive {
            if value <= 0 {
                return Err(ComplianceError::validation(field, "must be positive"));
            }
        }
        let within_week = [
            ("maxShiftDurationMinutes", self.max_shift_duration_minutes, WEEK_MINUTES),
            ("minRestPeriodMinutes", self.min_rest_period_minutes, WEEK_MINUTES),
            ("minWeeklyRestHours", self.min_weekly_rest_hours, WEEK_MINUTES / 60),
            ("maxWeeklyWorkingMinutes", self.max_weekly_working_minutes, WEEK_MINUTES),
        ];
        for (field, value, limit) in within_week {
            if value > limit {
                return Err(ComplianceError::validation(field, "must fit into a week"));
            }
        }
        for rule in &self.break_rules {
            if rule.after_minutes < 0 || rule.min_break_minutes <= 0 {
                return Err(ComplianceError::validation(
                    "breakRules",
                    "tiers need a non-negative trigger and a positive break",
                ));
            }
        }
        self.severity.validate()
    }

    /// Returns the break required for a shift of `duration_minutes`, if any.
    ///
    /// The highest tier whose trigger is exceeded wins.
    pub fn required_break_minutes(&self, duration_minutes: i64) -> Option<i64> {
        self.break_rules
            .iter()
            .filter(|rule| duration_minutes > rule.after_minutes)
            .map(|rule| rule.min_break_minutes)
            .max()
    }

    /// Minimum weekly rest expressed in minutes.
    pub fn min_weekly_rest_minutes(&self) -> i64 {
        self.min_weekly_rest_hours * 60
    }
}
