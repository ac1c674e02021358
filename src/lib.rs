//! Labor-Time Compliance Engine
//!
//! This crate evaluates recorded working time against configurable labor-law
//! rule sets (e.g. `EU`, `DE`, `UK`), stores the resulting violations with an
//! acknowledgment workflow and an audit trail, and produces hash-verified CSV
//! and PDF compliance reports.
//!
//! The rule engine in [`engine`] is pure. Everything stateful goes through the
//! store traits in [`store`] and is orchestrated by
//! [`service::ComplianceService`].

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
