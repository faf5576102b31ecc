// [libs/domain/models/src/subscription.rs]
//! Subscription entity and its status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BillingError;
use crate::window::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Draft,
    Active,
    Paused,
    Canceled,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingCycleType {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub tenant_id: i64,
    pub customer_id: i64,
    pub status: SubscriptionStatus,
    pub start_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub billing_cycle_type: BillingCycleType,
    pub plan_changed_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// `[startAt, endedAt ∨ canceledAt)` — the subscription-lifecycle window
    /// the rating engine intersects against.
    pub fn lifecycle_window(&self) -> Window {
        let end = self.ended_at.or(self.canceled_at);
        Window::new(self.start_at, end)
    }

    /// Draft → Active, gated on the caller having already attached ≥1 item
    /// with a priceId and a customer existing; those gates are checked by
    /// the caller (they require joins this crate's pure entity can't see).
    pub fn activate(&mut self, has_billable_item: bool) -> Result<(), BillingError> {
        if self.status != SubscriptionStatus::Draft {
            return Err(BillingError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: "Active".into(),
            });
        }
        if !has_billable_item {
            return Err(BillingError::NoSubscriptionItems);
        }
        self.status = SubscriptionStatus::Active;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), BillingError> {
        self.require(SubscriptionStatus::Active, SubscriptionStatus::Paused)?;
        self.status = SubscriptionStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), BillingError> {
        self.require(SubscriptionStatus::Paused, SubscriptionStatus::Active)?;
        self.status = SubscriptionStatus::Active;
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), BillingError> {
        if !matches!(self.status, SubscriptionStatus::Active | SubscriptionStatus::Paused) {
            return Err(BillingError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: "Canceled".into(),
            });
        }
        self.status = SubscriptionStatus::Canceled;
        self.canceled_at = Some(at);
        Ok(())
    }

    /// Ended requires zero non-Closed cycles and zero invoices outside
    /// {Finalized, Void}; the caller supplies those facts since this type
    /// has no visibility into other tables.
    pub fn end(
        &mut self,
        at: DateTime<Utc>,
        open_cycles: usize,
        unfinalized_invoices: usize,
    ) -> Result<(), BillingError> {
        if self.status != SubscriptionStatus::Canceled {
            return Err(BillingError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: "Ended".into(),
            });
        }
        if open_cycles > 0 {
            return Err(BillingError::InvalidSubscriptionStatus(
                "cannot end subscription: non-Closed billing cycles remain".into(),
            ));
        }
        if unfinalized_invoices > 0 {
            return Err(BillingError::InvalidSubscriptionStatus(
                "cannot end subscription: unfinalized invoices remain".into(),
            ));
        }
        self.status = SubscriptionStatus::Ended;
        self.ended_at = Some(at);
        Ok(())
    }

    fn require(&mut self, expected: SubscriptionStatus, to: SubscriptionStatus) -> Result<(), BillingError> {
        if self.status != expected {
            return Err(BillingError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: format!("{to:?}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn draft() -> Subscription {
        Subscription {
            id: 1,
            tenant_id: 1,
            customer_id: 1,
            status: SubscriptionStatus::Draft,
            start_at: ts(2026, 1, 1),
            ended_at: None,
            canceled_at: None,
            billing_cycle_type: BillingCycleType::Monthly,
            plan_changed_at: None,
        }
    }

    #[test]
    fn activate_requires_billable_item() {
        let mut sub = draft();
        assert!(matches!(sub.activate(false), Err(BillingError::NoSubscriptionItems)));
        assert!(sub.activate(true).is_ok());
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn end_rejects_open_cycles_and_unfinalized_invoices() {
        let mut sub = draft();
        sub.activate(true).unwrap();
        sub.cancel(ts(2026, 3, 1)).unwrap();
        assert!(matches!(
            sub.end(ts(2026, 3, 2), 1, 0),
            Err(BillingError::InvalidSubscriptionStatus(_))
        ));
        assert!(matches!(
            sub.end(ts(2026, 3, 2), 0, 1),
            Err(BillingError::InvalidSubscriptionStatus(_))
        ));
        assert!(sub.end(ts(2026, 3, 2), 0, 0).is_ok());
        assert_eq!(sub.status, SubscriptionStatus::Ended);
    }

    #[test]
    fn lifecycle_window_prefers_ended_over_canceled() {
        let mut sub = draft();
        sub.canceled_at = Some(ts(2026, 2, 1));
        sub.ended_at = Some(ts(2026, 2, 5));
        assert_eq!(sub.lifecycle_window().end, Some(ts(2026, 2, 5)));
    }
}
