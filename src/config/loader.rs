//! Rule set catalog loading.
//!
//! This module provides the [`RuleSetCatalog`] type, which holds every known
//! rule set and builds tenant configurations from them.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ComplianceError, ComplianceResult};

use super::types::{RuleConfig, RuleOverrides, RuleSetDefinition};

const BUILTIN_RULE_SETS: &str = include_str!("../../config/rule_sets.yaml");

/// Rule set catalog file structure.
#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    rule_sets: BTreeMap<String, RuleSetDefinition>,
}

/// The catalog of known rule sets.
///
/// Rule set keys are case-insensitive and stored uppercase.
///
/// # Example
///
/// ```
/// use labor_compliance::config::RuleSetCatalog;
///
/// let catalog = RuleSetCatalog::builtin().unwrap();
/// let eu = catalog.get("eu").unwrap();
/// assert_eq!(eu.min_rest_period_minutes, 660);
/// ```
#[derive(Debug, Clone)]
pub struct RuleSetCatalog {
    rule_sets: BTreeMap<String, RuleSetDefinition>,
}

impl RuleSetCatalog {
    /// Parses the rule sets shipped with the crate.
    pub fn builtin() -> ComplianceResult<Self> {
        Self::from_yaml_str("<builtin>/rule_sets.yaml", BUILTIN_RULE_SETS)
    }

    /// Loads every `*.yaml` catalog file in a directory.
    ///
    /// Later files (in file-name order) replace rule sets of earlier ones
    /// with the same key.
    pub fn load<P: AsRef<Path>>(dir: P) -> ComplianceResult<Self> {
        let dir = dir.as_ref();
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| ComplianceError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| ComplianceError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut rule_sets = BTreeMap::new();
        for path in paths {
            let path_str = path.display().to_string();
            let content =
                fs::read_to_string(&path).map_err(|_| ComplianceError::ConfigNotFound {
                    path: path_str.clone(),
                })?;
            rule_sets.extend(Self::from_yaml_str(&path_str, &content)?.rule_sets);
        }

        if rule_sets.is_empty() {
            return Err(ComplianceError::ConfigNotFound {
                path: format!("{} (no rule set files found)", dir_str),
            });
        }

        Ok(Self { rule_sets })
    }

    /// Parses a catalog from YAML text; `origin` is used in error messages.
    pub fn from_yaml_str(origin: &str, yaml: &str) -> ComplianceResult<Self> {
        let file: CatalogFile =
            serde_yaml::from_str(yaml).map_err(|e| ComplianceError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        let rule_sets = file
            .rule_sets
            .into_iter()
            .map(|(key, definition)| (key.to_uppercase(), definition))
            .collect();

        Ok(Self { rule_sets })
    }

    /// Gets a rule set by key.
    pub fn get(&self, rule_set: &str) -> ComplianceResult<&RuleSetDefinition> {
        self.rule_sets
            .get(&rule_set.to_uppercase())
            .ok_or_else(|| ComplianceError::UnknownRuleSet {
                name: rule_set.to_string(),
            })
    }

    /// Returns the keys of all known rule sets.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rule_sets.keys().map(String::as_str)
    }

    /// Builds the configuration for `rule_set` with `overrides` applied.
    pub fn build_config(
        &self,
        rule_set: &str,
        overrides: &RuleOverrides,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> ComplianceResult<RuleConfig> {
        let key = rule_set.to_uppercase();
        let definition = self.get(&key)?;
        RuleConfig::from_definition(&key, definition, overrides, updated_by, updated_at)
    }
}
