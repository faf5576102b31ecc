// [libs/domain/models/src/usage_event.rs]
//! UsageEvent: a raw usage record moving through the snapshot status
//! machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageEventStatus {
    Accepted,
    Enriched,
    UnmatchedMeter,
    UnmatchedSubscription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: i64,
    pub tenant_id: i64,
    pub customer_id: i64,
    pub meter_code: String,
    pub meter_id: Option<i64>,
    pub subscription_id: Option<i64>,
    pub subscription_item_id: Option<i64>,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub status: UsageEventStatus,
    pub snapshot_at: Option<DateTime<Utc>>,
    /// Retry bookkeeping for `recovery_sweep`.
    pub attempt_count: i32,
    pub next_attempt_at: Option<DateTime<Utc>>,
}

/// The outcome of one snapshot-worker resolution attempt.
pub enum SnapshotOutcome {
    Enriched { meter_id: i64, subscription_id: i64, subscription_item_id: Option<i64> },
    UnmatchedMeter,
    UnmatchedSubscription,
}

impl UsageEvent {
    pub fn apply_snapshot(&mut self, outcome: SnapshotOutcome, at: DateTime<Utc>) {
        match outcome {
            SnapshotOutcome::Enriched { meter_id, subscription_id, subscription_item_id } => {
                self.meter_id = Some(meter_id);
                self.subscription_id = Some(subscription_id);
                self.subscription_item_id = subscription_item_id;
                self.status = UsageEventStatus::Enriched;
            }
            SnapshotOutcome::UnmatchedMeter => {
                self.status = UsageEventStatus::UnmatchedMeter;
            }
            SnapshotOutcome::UnmatchedSubscription => {
                self.status = UsageEventStatus::UnmatchedSubscription;
            }
        }
        self.snapshot_at = Some(at);
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.status, UsageEventStatus::Accepted)
    }

    /// Records a failed resolution attempt with exponential backoff,
    /// capped at one hour between attempts.
    pub fn record_failure(&mut self, at: DateTime<Utc>, backoff_base_secs: i64) {
        self.attempt_count += 1;
        let backoff_secs = backoff_base_secs.saturating_mul(1i64 << self.attempt_count.min(16)).min(3600);
        self.next_attempt_at = Some(at + chrono::Duration::seconds(backoff_secs));
    }

    /// Whether this event has exhausted `max_attempts` and is parked dead,
    /// visible to `recovery_sweep`.
    pub fn is_dead(&self, max_attempts: i32) -> bool {
        self.attempt_count >= max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn event() -> UsageEvent {
        UsageEvent {
            id: 1,
            tenant_id: 1,
            customer_id: 1,
            meter_code: "api_calls".into(),
            meter_id: None,
            subscription_id: None,
            subscription_item_id: None,
            value: 1.0,
            recorded_at: ts(2026, 1, 1),
            idempotency_key: None,
            status: UsageEventStatus::Accepted,
            snapshot_at: None,
            attempt_count: 0,
            next_attempt_at: None,
        }
    }

    #[test]
    fn record_failure_backs_off_and_is_dead_past_max_attempts() {
        let mut e = event();
        e.record_failure(ts(2026, 1, 1), 2);
        assert_eq!(e.attempt_count, 1);
        assert!(e.next_attempt_at.unwrap() > ts(2026, 1, 1));
        assert!(!e.is_dead(8));
        for _ in 0..7 {
            e.record_failure(ts(2026, 1, 1), 2);
        }
        assert_eq!(e.attempt_count, 8);
        assert!(e.is_dead(8));
    }
}
