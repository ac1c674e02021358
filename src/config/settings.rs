//! Service settings.
//!
//! [`ComplianceSettings`] bounds the read paths and sizes the background
//! adjustment queue. Every field has a default, so an empty YAML document is
//! a valid settings file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ComplianceError, ComplianceResult};

fn default_rule_set() -> String {
    "EU".to_string()
}

fn default_stats_sample_size() -> usize {
    1000
}

fn default_page_size() -> usize {
    50
}

fn default_max_page_size() -> usize {
    500
}

fn default_download_url_ttl_secs() -> u64 {
    900
}

fn default_adjustment_queue_capacity() -> usize {
    256
}

fn default_failure_channel_capacity() -> usize {
    64
}

/// Tunables for the compliance service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComplianceSettings {
    /// Rule set seeded for tenants without a configuration.
    #[serde(default = "default_rule_set")]
    pub default_rule_set: String,
    /// Number of recent violations examined by the stats rollup.
    #[serde(default = "default_stats_sample_size")]
    pub stats_sample_size: usize,
    /// Page size used when a violation query has no limit.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Largest page a violation query may request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Lifetime of report download URLs, in seconds.
    #[serde(default = "default_download_url_ttl_secs")]
    pub download_url_ttl_secs: u64,
    /// Capacity of the time-account adjustment queue.
    #[serde(default = "default_adjustment_queue_capacity")]
    pub adjustment_queue_capacity: usize,
    /// Capacity of the adjustment failure channel.
    #[serde(default = "default_failure_channel_capacity")]
    pub failure_channel_capacity: usize,
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self {
            default_rule_set: default_rule_set(),
            stats_sample_size: default_stats_sample_size(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            download_url_ttl_secs: default_download_url_ttl_secs(),
            adjustment_queue_capacity: default_adjustment_queue_capacity(),
            failure_channel_capacity: default_failure_channel_capacity(),
        }
    }
}

impl ComplianceSettings {
    /// Lifetime of report download URLs.
    pub fn download_url_ttl(&self) -> Duration {
        Duration::from_secs(self.download_url_ttl_secs)
    }

    fn validate(&self, origin: &str) -> ComplianceResult<()> {
        let sizes = [
            ("stats_sample_size", self.stats_sample_size),
            ("default_page_size", self.default_page_size),
            ("max_page_size", self.max_page_size),
            ("adjustment_queue_capacity", self.adjustment_queue_capacity),
            ("failure_channel_capacity", self.failure_channel_capacity),
        ];
        for (field, value) in sizes {
            if value == 0 {
                return Err(ComplianceError::ConfigParseError {
                    path: origin.to_string(),
                    message: format!("{} must be greater than zero", field),
                });
            }
        }
        if self.default_page_size > self.max_page_size {
            return Err(ComplianceError::ConfigParseError {
                path: origin.to_string(),
                message: "default_page_size must not exceed max_page_size".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads [`ComplianceSettings`] from YAML.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Loads and validates settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ComplianceResult<ComplianceSettings> {
        let path_str = path.as_ref().display().to_string();
        let content =
            fs::read_to_string(path.as_ref()).map_err(|_| ComplianceError::ConfigNotFound {
                path: path_str.clone(),
            })?;
        Self::from_yaml_str(&path_str, &content)
    }

    /// Parses and validates settings from YAML text.
    pub fn from_yaml_str(origin: &str, yaml: &str) -> ComplianceResult<ComplianceSettings> {
        let settings: ComplianceSettings = if yaml.trim().is_empty() {
            ComplianceSettings::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| ComplianceError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?
        };
        settings.validate(origin)?;
        Ok(settings)
    }
}
