//! Background time-account adjustments.
//!
//! Every persisted violation raises a compensating booking on the user's
//! time account. Bookings run on a single worker task fed by a bounded
//! queue, so a slow or failing ledger never blocks a compliance check:
//!
//! - a full queue drops the job and logs a warning
//! - a ledger error is logged and published on the failure channel
//! - a tenant without the time-account module is a no-op
//!
//! There are no retries.

use std::sync::Arc;

use chrono::Datelike;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::models::{AdjustmentOutcome, TenantId, TimeAccountAdjustment, Violation};
use crate::store::TimeAccountLedger;

/// A booking the ledger rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentFailure {
    /// Tenant of the violation.
    pub tenant_id: TenantId,
    /// The violation that raised the booking.
    pub violation_id: String,
    /// The account owner.
    pub user_id: String,
    /// The ledger's error message.
    pub error: String,
}

enum Job {
    Book {
        tenant: TenantId,
        adjustment: TimeAccountAdjustment,
    },
    Flush(oneshot::Sender<()>),
}

/// Builds the booking for a violation.
///
/// Hours are the violation's magnitude (`|expected - actual|` minutes)
/// divided by 60, rounded to two places. The booking month is the month of
/// the violation's period start. Returns `None` when there is nothing to
/// book.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use labor_compliance::models::{
///     Severity, TenantId, Violation, ViolationDetails, ViolationType,
/// };
/// use labor_compliance::service::adjustment_for;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let violation = Violation {
///     id: "v1".to_string(),
///     tenant_id: TenantId::new("acme"),
///     user_id: "u1".to_string(),
///     violation_type: ViolationType::RestPeriodViolation,
///     severity: Severity::Error,
///     detected_at: Utc.with_ymd_and_hms(2026, 1, 13, 2, 0, 0).unwrap(),
///     period_start: Utc.with_ymd_and_hms(2026, 1, 12, 17, 0, 0).unwrap(),
///     period_end: Utc.with_ymd_and_hms(2026, 1, 12, 17, 5, 0).unwrap(),
///     rule_set: "EU".to_string(),
///     details: ViolationDetails {
///         expected: 660,
///         actual: 5,
///         affected_entries: vec!["a".to_string(), "b".to_string()],
///     },
///     acknowledged_at: None,
///     acknowledged_by: None,
/// };
///
/// let adjustment = adjustment_for(&violation, "system").unwrap();
/// assert_eq!(adjustment.hours, Decimal::from_str("10.92").unwrap());
/// assert_eq!((adjustment.year, adjustment.month), (2026, 1));
/// ```
pub fn adjustment_for(violation: &Violation, actor: &str) -> Option<TimeAccountAdjustment> {
    let minutes = violation.details.magnitude_minutes();
    if minutes == 0 {
        return None;
    }
    let hours = (Decimal::from(minutes) / Decimal::from(60)).round_dp(2);

    Some(TimeAccountAdjustment {
        user_id: violation.user_id.clone(),
        year: violation.period_start.year(),
        month: violation.period_start.month(),
        hours,
        reason: format!("Compliance violation: {}", violation.violation_type),
        violation_id: violation.id.clone(),
        actor: actor.to_string(),
    })
}

/// Hands adjustments to the background worker.
///
/// Must be created inside a tokio runtime. The worker stops once the
/// dispatcher is dropped and the queue is drained.
pub struct AdjustmentDispatcher {
    queue: mpsc::Sender<Job>,
    failures: Mutex<Option<mpsc::Receiver<AdjustmentFailure>>>,
}

impl AdjustmentDispatcher {
    /// Spawns the worker over `ledger`.
    pub fn spawn(
        ledger: Arc<dyn TimeAccountLedger>,
        queue_capacity: usize,
        failure_capacity: usize,
    ) -> Self {
        let (queue, jobs) = mpsc::channel(queue_capacity.max(1));
        let (failure_tx, failure_rx) = mpsc::channel(failure_capacity.max(1));
        tokio::spawn(run_worker(ledger, jobs, failure_tx));

        Self {
            queue,
            failures: Mutex::new(Some(failure_rx)),
        }
    }

    /// Queues the booking for `violation` without waiting.
    ///
    /// Returns `false` if nothing was queued, either because the violation
    /// has no magnitude or because the queue is full or closed.
    pub fn dispatch(&self, tenant: &TenantId, violation: &Violation, actor: &str) -> bool {
        let Some(adjustment) = adjustment_for(violation, actor) else {
            return false;
        };
        let job = Job::Book {
            tenant: tenant.clone(),
            adjustment,
        };
        match self.queue.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    tenant = %tenant,
                    violation_id = %violation.id,
                    "Adjustment queue full, dropping time-account adjustment"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(
                    tenant = %tenant,
                    violation_id = %violation.id,
                    "Adjustment worker stopped, dropping time-account adjustment"
                );
                false
            }
        }
    }

    /// Waits until every job queued before this call has been processed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.queue.send(Job::Flush(done)).await.is_ok() {
            let _ = wait.await;
        }
    }

    /// Takes the receiving end of the failure channel. Only the first call
    /// returns it.
    pub fn take_failures(&self) -> Option<mpsc::Receiver<AdjustmentFailure>> {
        self.failures.lock().take()
    }
}

async fn run_worker(
    ledger: Arc<dyn TimeAccountLedger>,
    mut jobs: mpsc::Receiver<Job>,
    failures: mpsc::Sender<AdjustmentFailure>,
) {
    while let Some(job) = jobs.recv().await {
        let (tenant, adjustment) = match job {
            Job::Book { tenant, adjustment } => (tenant, adjustment),
            Job::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };

        match ledger.add_adjustment(&tenant, &adjustment).await {
            Ok(AdjustmentOutcome::Recorded) => debug!(
                tenant = %tenant,
                violation_id = %adjustment.violation_id,
                hours = %adjustment.hours,
                "Time-account adjustment recorded"
            ),
            Ok(AdjustmentOutcome::ModuleDisabled) => debug!(
                tenant = %tenant,
                violation_id = %adjustment.violation_id,
                "Time-account module disabled, adjustment skipped"
            ),
            Err(err) => {
                warn!(
                    tenant = %tenant,
                    violation_id = %adjustment.violation_id,
                    error = %err,
                    "Time-account adjustment failed"
                );
                let failure = AdjustmentFailure {
                    tenant_id: tenant,
                    violation_id: adjustment.violation_id,
                    user_id: adjustment.user_id,
                    error: err.to_string(),
                };
                if failures.try_send(failure).is_err() {
                    warn!("Adjustment failure channel full or closed, failure not published");
                }
            }
        }
    }
}
