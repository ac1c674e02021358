//! Time-account adjustment models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A compensating booking on a user's time account, raised by a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAccountAdjustment {
    /// The account owner.
    pub user_id: String,
    /// Booking year.
    pub year: i32,
    /// Booking month (1-12).
    pub month: u32,
    /// Hours booked, rounded to two decimal places.
    pub hours: Decimal,
    /// Human-readable booking reason.
    pub reason: String,
    /// The violation that raised the booking.
    pub violation_id: String,
    /// Who the booking is attributed to.
    pub actor: String,
}

/// Result of submitting an adjustment to the time-account ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentOutcome {
    /// The ledger booked the adjustment.
    Recorded,
    /// The tenant has no time-account module; nothing was booked.
    ModuleDisabled,
}
