//! Work interval model and related types.
//!
//! This module defines the [`WorkInterval`] and [`BreakPeriod`] structs for
//! representing recorded working time. Intervals come from an external
//! source (clock-in records or schedules) and are never mutated here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a break recorded inside a work interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    /// The start time of the break.
    pub start: DateTime<Utc>,
    /// The end time of the break.
    pub end: DateTime<Utc>,
}

impl BreakPeriod {
    /// Returns the duration of the break in minutes, never negative.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }
}

/// A single user-attributed span of worked time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkInterval {
    /// Unique identifier of the interval at its source.
    pub id: String,
    /// The user who worked the interval.
    pub user_id: String,
    /// The start time of the interval.
    pub start: DateTime<Utc>,
    /// The end time of the interval.
    pub end: DateTime<Utc>,
    /// Worked duration in minutes as reported by the source.
    pub duration_minutes: i64,
    /// Breaks recorded inside the interval.
    #[serde(default)]
    pub breaks: Vec<BreakPeriod>,
}

impl WorkInterval {
    /// Creates an interval without breaks, deriving the duration from the bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use labor_compliance::models::WorkInterval;
    ///
    /// let interval = WorkInterval::new(
    ///     "int_001",
    ///     "user_1",
    ///     Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap(),
    ///     Utc.with_ymd_and_hms(2026, 1, 15, 17, 0, 0).unwrap(),
    /// );
    /// assert_eq!(interval.duration_minutes, 480);
    /// ```
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
            breaks: Vec::new(),
        }
    }

    /// Adds a recorded break to the interval.
    pub fn with_break(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.breaks.push(BreakPeriod { start, end });
        self
    }

    /// Returns the total recorded break time in minutes.
    pub fn break_minutes(&self) -> i64 {
        self.breaks.iter().map(BreakPeriod::duration_minutes).sum()
    }
}
