//! Configuration loading and management for the compliance engine.
//!
//! This module provides the rule set catalog (loaded from YAML), the
//! per-tenant [`RuleConfig`] type and the service settings.
//!
//! # Example
//!
//! ```
//! use labor_compliance::config::{RuleOverrides, RuleSetCatalog};
//! use chrono::Utc;
//!
//! let catalog = RuleSetCatalog::builtin().unwrap();
//! let config = catalog
//!     .build_config("EU", &RuleOverrides::default(), "system", Utc::now())
//!     .unwrap();
//! assert_eq!(config.max_weekly_working_minutes, 2880);
//! ```

mod loader;
mod settings;
mod types;

pub use loader::RuleSetCatalog;
pub use settings::{ComplianceSettings, SettingsLoader};
pub use types::{
    BreakRule, RuleConfig, RuleOverrides, RuleSetDefinition, SeverityPolicy, SeverityRule,
};
