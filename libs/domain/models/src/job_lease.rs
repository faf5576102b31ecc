// [libs/domain/models/src/job_lease.rs]
//! JobLease: TTL + heartbeat mutual exclusion for singleton jobs that have
//! no natural row to lock (`ensure_cycles`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BillingError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLease {
    pub job_name: String,
    pub instance_id: String,
    pub acquired_at: DateTime<Utc>,
    pub heartbeat_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl JobLease {
    pub fn new(job_name: impl Into<String>, instance_id: impl Into<String>, now: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            job_name: job_name.into(),
            instance_id: instance_id.into(),
            acquired_at: now,
            heartbeat_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Renews the lease for `holder`; fails if another instance now holds it
    /// or the previous lease already expired out from under us.
    pub fn renew(&mut self, holder: &str, now: DateTime<Utc>, ttl: chrono::Duration) -> Result<(), BillingError> {
        if self.instance_id != holder || self.is_expired(now) {
            return Err(BillingError::LeaseLost(self.job_name.clone()));
        }
        self.heartbeat_at = now;
        self.expires_at = now + ttl;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn renew_fails_for_a_different_holder() {
        let mut lease = JobLease::new("ensure_cycles", "node-a", ts(2026, 1, 1, 0), chrono::Duration::minutes(5));
        assert!(matches!(
            lease.renew("node-b", ts(2026, 1, 1, 0), chrono::Duration::minutes(5)),
            Err(BillingError::LeaseLost(_))
        ));
    }

    #[test]
    fn renew_fails_once_expired() {
        let mut lease = JobLease::new("ensure_cycles", "node-a", ts(2026, 1, 1, 0), chrono::Duration::minutes(5));
        assert!(lease.renew("node-a", ts(2026, 1, 1, 6), chrono::Duration::minutes(5)).is_err());
    }

    #[test]
    fn renew_extends_expiry_for_the_holder() {
        let mut lease = JobLease::new("ensure_cycles", "node-a", ts(2026, 1, 1, 0), chrono::Duration::minutes(5));
        lease.renew("node-a", ts(2026, 1, 1, 0), chrono::Duration::minutes(5)).unwrap();
        assert_eq!(lease.expires_at, ts(2026, 1, 1, 0) + chrono::Duration::minutes(5));
    }
}
