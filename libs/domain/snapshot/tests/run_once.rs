// [libs/domain/snapshot/tests/run_once.rs]
//! Exercises the three resolution outcomes (enriched, unmatched meter,
//! unmatched subscription) against in-memory fakes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use billing_core_clock::FixedClock;
use billing_domain_models::ports::{MeterRepository, PortResult, SubscriptionRepository, UsageEventRepository};
use billing_domain_models::*;
use billing_domain_snapshot::UsageSnapshotWorker;
use chrono::{DateTime, TimeZone, Utc};

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

struct FakeMeters(Vec<Meter>);

#[async_trait]
impl MeterRepository for FakeMeters {
    async fn find_by_code(&self, tenant_id: i64, code: &str) -> PortResult<Option<Meter>> {
        Ok(self.0.iter().find(|m| m.tenant_id == tenant_id && m.code == code).cloned())
    }
}

struct FakeSubscriptions(Vec<Subscription>);

#[async_trait]
impl SubscriptionRepository for FakeSubscriptions {
    async fn find(&self, id: i64) -> PortResult<Option<Subscription>> {
        Ok(self.0.iter().find(|s| s.id == id).cloned())
    }
    async fn find_active_for_customer_at(&self, tenant_id: i64, customer_id: i64, at: DateTime<Utc>) -> PortResult<Option<Subscription>> {
        Ok(self
            .0
            .iter()
            .find(|s| s.tenant_id == tenant_id && s.customer_id == customer_id && s.lifecycle_window().contains_instant(at))
            .cloned())
    }
    async fn list_active(&self, _tenant_id: i64) -> PortResult<Vec<Subscription>> {
        Ok(vec![])
    }
    async fn list_pending_cancellation(&self) -> PortResult<Vec<Subscription>> {
        Ok(vec![])
    }
    async fn items(&self, _subscription_id: i64) -> PortResult<Vec<SubscriptionItem>> {
        Ok(vec![])
    }
    async fn find_item_binding(&self, _subscription_id: i64, _meter_id: i64, _at: DateTime<Utc>) -> PortResult<Option<SubscriptionItem>> {
        Ok(None)
    }
    async fn entitlements_effective_in(&self, _subscription_id: i64, _from: DateTime<Utc>, _to: DateTime<Utc>) -> PortResult<Vec<SubscriptionEntitlement>> {
        Ok(vec![])
    }
    async fn save(&self, _subscription: &Subscription) -> PortResult<()> {
        Ok(())
    }
}

struct FakeUsage(Mutex<Vec<UsageEvent>>);

#[async_trait]
impl UsageEventRepository for FakeUsage {
    async fn claim_accepted(&self, _now: DateTime<Utc>, _claim_ttl: chrono::Duration, limit: i64) -> PortResult<Vec<UsageEvent>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.is_accepted())
            .take(limit as usize)
            .cloned()
            .collect())
    }
    async fn sum_enriched_in_window(&self, _tenant_id: i64, _subscription_id: i64, _meter_id: i64, _from: DateTime<Utc>, _to: DateTime<Utc>) -> PortResult<f64> {
        Ok(0.0)
    }
    async fn save(&self, event: &UsageEvent) -> PortResult<()> {
        let mut guard = self.0.lock().unwrap();
        if let Some(existing) = guard.iter_mut().find(|e| e.id == event.id) {
            *existing = event.clone();
        }
        Ok(())
    }
    async fn insert_idempotent(&self, event: UsageEvent) -> PortResult<UsageEvent> {
        Ok(event)
    }
}

fn event(id: i64, meter_code: &str, customer_id: i64, recorded_at: DateTime<Utc>) -> UsageEvent {
    UsageEvent {
        id,
        tenant_id: 1,
        customer_id,
        meter_code: meter_code.into(),
        meter_id: None,
        subscription_id: None,
        subscription_item_id: None,
        value: 1.0,
        recorded_at,
        idempotency_key: None,
        status: UsageEventStatus::Accepted,
        snapshot_at: None,
        attempt_count: 0,
        next_attempt_at: None,
    }
}

#[tokio::test]
async fn resolves_the_three_outcomes_in_one_batch() {
    let meters = FakeMeters(vec![Meter { id: 9, tenant_id: 1, code: "api-calls".into(), aggregation: Aggregation::Sum, unit: "calls".into(), archived: false }]);
    let subscription = Subscription {
        id: 1,
        tenant_id: 1,
        customer_id: 1,
        status: SubscriptionStatus::Active,
        start_at: ts(2026, 1, 1),
        ended_at: None,
        canceled_at: None,
        billing_cycle_type: BillingCycleType::Monthly,
        plan_changed_at: None,
    };
    let subscriptions = FakeSubscriptions(vec![subscription]);

    let events = vec![
        event(1, "api-calls", 1, ts(2026, 1, 10)),      // enriched
        event(2, "unknown-meter", 1, ts(2026, 1, 10)),   // unmatched meter
        event(3, "api-calls", 999, ts(2026, 1, 10)),     // unmatched subscription
    ];
    let usage = Arc::new(FakeUsage(Mutex::new(events)));

    let worker = UsageSnapshotWorker::new(
        usage.clone(),
        Arc::new(meters),
        Arc::new(subscriptions),
        Arc::new(FixedClock::new(ts(2026, 1, 11))),
    );

    let report = worker.run_once(10).await.unwrap();
    assert_eq!(report.picked_up, 3);
    assert_eq!(report.enriched, 1);
    assert_eq!(report.unmatched_meter, 1);
    assert_eq!(report.unmatched_subscription, 1);
    assert_eq!(report.row_errors, 0);

    let stored = usage.0.lock().unwrap().clone();
    let enriched = stored.iter().find(|e| e.id == 1).unwrap();
    assert_eq!(enriched.status, UsageEventStatus::Enriched);
    assert_eq!(enriched.meter_id, Some(9));
    assert_eq!(enriched.subscription_id, Some(1));

    let unmatched_meter = stored.iter().find(|e| e.id == 2).unwrap();
    assert_eq!(unmatched_meter.status, UsageEventStatus::UnmatchedMeter);

    let unmatched_sub = stored.iter().find(|e| e.id == 3).unwrap();
    assert_eq!(unmatched_sub.status, UsageEventStatus::UnmatchedSubscription);
}
