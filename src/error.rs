//! Error types for the compliance engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions surfaced by rule configuration, violation
//! management and report generation.

use thiserror::Error;

/// The main error type for the compliance engine.
///
/// Validation failures and missing records are distinct variants so callers
/// can map them to different responses.
///
/// # Example
///
/// ```
/// use labor_compliance::error::ComplianceError;
///
/// let error = ComplianceError::UnknownRuleSet {
///     name: "XX".to_string(),
/// };
/// assert_eq!(error.to_string(), "Unknown rule set: XX");
/// assert!(error.is_validation());
/// ```
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// The requested rule set is not part of the catalog.
    #[error("Unknown rule set: {name}")]
    UnknownRuleSet {
        /// The rule set name that was requested.
        name: String,
    },

    /// An input failed validation.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A record does not exist for the tenant.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The record kind (e.g., "violation", "report").
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A backing store rejected or failed an operation.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },

    /// A report or record could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// A description of the serialization failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl ComplianceError {
    /// Builds a [`ComplianceError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds a [`ComplianceError::NotFound`] error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Builds a [`ComplianceError::Storage`] error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnknownRuleSet { .. } | Self::Validation { .. })
    }

    /// Returns true when a requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<csv::Error> for ComplianceError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ComplianceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// A type alias for Results that return ComplianceError.
pub type ComplianceResult<T> = Result<T, ComplianceError>;
