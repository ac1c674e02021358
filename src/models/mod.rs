//! Core data models for the compliance engine.
//!
//! This module contains the domain models shared by the rule engine, the
//! stores and the report generator.

mod adjustment;
mod audit;
mod interval;
mod report;
mod stats;
mod tenant;
mod violation;

pub use adjustment::{AdjustmentOutcome, TimeAccountAdjustment};
pub use audit::{AuditAction, AuditLogEntry, AuditLogQuery, NewAuditEntry};
pub use interval::{BreakPeriod, WorkInterval};
pub use report::{
    NewReport, Report, ReportDownload, ReportFilters, ReportFormat, ReportSummary,
    ReportVerification,
};
pub use stats::ComplianceStats;
pub use tenant::TenantId;
pub use violation::{
    DetectedViolation, Severity, Violation, ViolationDetails, ViolationFilter, ViolationType,
};
