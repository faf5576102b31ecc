// [libs/domain/rating/tests/scenarios.rs]
//! Scenario tests pinning a set of concrete proration numbers, using
//! in-memory fakes for every repository port. No database involved.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use billing_core_ids::IdGenerator;
use billing_domain_models::ports::{
    CycleRepository, PortResult, PriceRepository, RatingResultRepository, SubscriptionRepository, UsageEventRepository,
};
use billing_domain_models::*;
use billing_domain_rating::RatingEngine;
use chrono::{DateTime, TimeZone, Utc};

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

struct FakeCycles(Mutex<Vec<BillingCycle>>);

#[async_trait]
impl CycleRepository for FakeCycles {
    async fn find(&self, id: i64) -> PortResult<Option<BillingCycle>> {
        Ok(self.0.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }
    async fn find_latest_for_subscription(&self, subscription_id: i64) -> PortResult<Option<BillingCycle>> {
        Ok(self.0.lock().unwrap().iter().filter(|c| c.subscription_id == subscription_id).last().cloned())
    }
    async fn count_non_closed(&self, subscription_id: i64) -> PortResult<usize> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.subscription_id == subscription_id && c.status != CycleStatus::Closed)
            .count())
    }
    async fn claim_open_due(&self, _now: DateTime<Utc>, _limit: i64) -> PortResult<Vec<BillingCycle>> {
        Ok(vec![])
    }
    async fn claim_closing_for_rating(&self, _now: DateTime<Utc>, _claim_ttl: chrono::Duration, _limit: i64) -> PortResult<Vec<BillingCycle>> {
        Ok(self.0.lock().unwrap().iter().filter(|c| c.status == CycleStatus::Closing).cloned().collect())
    }
    async fn ensure(&self, cycle: &BillingCycle) -> PortResult<bool> {
        let mut guard = self.0.lock().unwrap();
        if guard.iter().any(|c| c.subscription_id == cycle.subscription_id && c.period_start == cycle.period_start && c.period_end == cycle.period_end) {
            return Ok(false);
        }
        guard.push(cycle.clone());
        Ok(true)
    }
    async fn save(&self, cycle: &BillingCycle) -> PortResult<()> {
        let mut guard = self.0.lock().unwrap();
        if let Some(existing) = guard.iter_mut().find(|c| c.id == cycle.id) {
            *existing = cycle.clone();
        }
        Ok(())
    }
}

struct FakeSubscriptions {
    subscriptions: Mutex<Vec<Subscription>>,
    items: Mutex<Vec<SubscriptionItem>>,
    entitlements: Mutex<Vec<SubscriptionEntitlement>>,
}

#[async_trait]
impl SubscriptionRepository for FakeSubscriptions {
    async fn find(&self, id: i64) -> PortResult<Option<Subscription>> {
        Ok(self.subscriptions.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }
    async fn find_active_for_customer_at(&self, _tenant_id: i64, _customer_id: i64, _at: DateTime<Utc>) -> PortResult<Option<Subscription>> {
        Ok(None)
    }
    async fn list_active(&self, _tenant_id: i64) -> PortResult<Vec<Subscription>> {
        Ok(vec![])
    }
    async fn list_pending_cancellation(&self) -> PortResult<Vec<Subscription>> {
        Ok(vec![])
    }
    async fn items(&self, subscription_id: i64) -> PortResult<Vec<SubscriptionItem>> {
        Ok(self.items.lock().unwrap().iter().filter(|i| i.subscription_id == subscription_id).cloned().collect())
    }
    async fn find_item_binding(&self, _subscription_id: i64, _meter_id: i64, _at: DateTime<Utc>) -> PortResult<Option<SubscriptionItem>> {
        Ok(None)
    }
    async fn entitlements_effective_in(&self, subscription_id: i64, from: DateTime<Utc>, to: DateTime<Utc>) -> PortResult<Vec<SubscriptionEntitlement>> {
        let window = Window::closed(from, to);
        Ok(self
            .entitlements
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.subscription_id == subscription_id && e.overlaps(&window))
            .cloned()
            .collect())
    }
    async fn save(&self, subscription: &Subscription) -> PortResult<()> {
        let mut guard = self.subscriptions.lock().unwrap();
        if let Some(existing) = guard.iter_mut().find(|s| s.id == subscription.id) {
            *existing = subscription.clone();
        }
        Ok(())
    }
}

struct FakePrices {
    amounts: Mutex<Vec<PriceAmount>>,
    product_by_price: Mutex<HashMap<i64, i64>>,
}

#[async_trait]
impl PriceRepository for FakePrices {
    async fn amounts_for_price(&self, price_id: i64) -> PortResult<Vec<PriceAmount>> {
        Ok(self.amounts.lock().unwrap().iter().filter(|a| a.price_id == price_id).cloned().collect())
    }
    async fn product_id_for_price(&self, price_id: i64) -> PortResult<i64> {
        Ok(*self.product_by_price.lock().unwrap().get(&price_id).unwrap_or(&0))
    }
}

struct FakeUsage(Mutex<Vec<UsageEvent>>);

#[async_trait]
impl UsageEventRepository for FakeUsage {
    async fn claim_accepted(&self, _now: DateTime<Utc>, _claim_ttl: chrono::Duration, _limit: i64) -> PortResult<Vec<UsageEvent>> {
        Ok(vec![])
    }
    async fn sum_enriched_in_window(&self, _tenant_id: i64, subscription_id: i64, meter_id: i64, from: DateTime<Utc>, to: DateTime<Utc>) -> PortResult<f64> {
        let window = Window::closed(from, to);
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.subscription_id == Some(subscription_id)
                    && e.meter_id == Some(meter_id)
                    && e.status == UsageEventStatus::Enriched
                    && window.contains_instant(e.recorded_at)
            })
            .map(|e| e.value)
            .sum())
    }
    async fn save(&self, _event: &UsageEvent) -> PortResult<()> {
        Ok(())
    }
    async fn insert_idempotent(&self, event: UsageEvent) -> PortResult<UsageEvent> {
        Ok(event)
    }
}

#[derive(Default)]
struct FakeResults(Mutex<Vec<RatingResult>>);

#[async_trait]
impl RatingResultRepository for FakeResults {
    async fn replace_all(&self, billing_cycle_id: i64, results: &[RatingResult]) -> PortResult<()> {
        let mut guard = self.0.lock().unwrap();
        guard.retain(|r| r.billing_cycle_id != billing_cycle_id);
        for result in results {
            if !guard.iter().any(|r| r.checksum == result.checksum) {
                guard.push(result.clone());
            }
        }
        Ok(())
    }
    async fn list_for_cycle(&self, billing_cycle_id: i64) -> PortResult<Vec<RatingResult>> {
        Ok(self.0.lock().unwrap().iter().filter(|r| r.billing_cycle_id == billing_cycle_id).cloned().collect())
    }
}

fn flat_amount(price_id: i64, from: DateTime<Utc>, to: Option<DateTime<Utc>>, cents: i64) -> PriceAmount {
    PriceAmount {
        id: price_id * 1000,
        price_id,
        meter_id: None,
        currency: Currency::code("USD"),
        unit_amount_cents: cents,
        minimum_cents: None,
        maximum_cents: None,
        effective_from: from,
        effective_to: to,
    }
}

struct Harness {
    engine: RatingEngine,
    cycle_id: i64,
}

fn build_engine(
    cycles: Vec<BillingCycle>,
    subscriptions: Vec<Subscription>,
    items: Vec<SubscriptionItem>,
    entitlements: Vec<SubscriptionEntitlement>,
    amounts: Vec<PriceAmount>,
    product_by_price: HashMap<i64, i64>,
    usage: Vec<UsageEvent>,
) -> (RatingEngine, Arc<FakeResults>) {
    let results = Arc::new(FakeResults::default());
    let engine = RatingEngine::new(
        Arc::new(FakeCycles(Mutex::new(cycles))),
        Arc::new(FakeSubscriptions {
            subscriptions: Mutex::new(subscriptions),
            items: Mutex::new(items),
            entitlements: Mutex::new(entitlements),
        }),
        Arc::new(FakePrices { amounts: Mutex::new(amounts), product_by_price: Mutex::new(product_by_price) }),
        Arc::new(FakeUsage(Mutex::new(usage))),
        results.clone(),
        Arc::new(IdGenerator::new(1)),
    );
    (engine, results)
}

fn base_subscription(id: i64, start_at: DateTime<Utc>) -> Subscription {
    Subscription {
        id,
        tenant_id: 1,
        customer_id: 1,
        status: SubscriptionStatus::Active,
        start_at,
        ended_at: None,
        canceled_at: None,
        billing_cycle_type: BillingCycleType::Monthly,
        plan_changed_at: None,
    }
}

#[tokio::test]
async fn plan_change_emits_two_rows_with_distinct_checksums() {
    let cycle = BillingCycle { id: 1, subscription_id: 1, period_start: ts(2026, 1, 1), period_end: ts(2026, 2, 1), status: CycleStatus::Closing, rated_at: None };
    let subscription = base_subscription(1, ts(2025, 1, 1));
    let item_a = SubscriptionItem {
        id: 1,
        subscription_id: 1,
        price_id: 10,
        price_code: "plan-a".into(),
        meter_code: None,
        billing_mode: BillingMode::Flat,
        billing_threshold: None,
        meter_id: None,
        quantity: 1,
        effective_from: None,
        effective_to: None,
    };
    let item_b = SubscriptionItem { id: 2, price_id: 20, price_code: "plan-b".into(), ..item_a.clone() };
    let entitlement_a = SubscriptionEntitlement {
        id: 1,
        subscription_id: 1,
        product_id: 100,
        feature_code: "plan-a".into(),
        feature_type: FeatureType::Boolean,
        meter_id: None,
        effective_from: ts(2025, 1, 1),
        effective_to: Some(ts(2026, 1, 16)),
    };
    let entitlement_b = SubscriptionEntitlement {
        id: 2,
        subscription_id: 1,
        product_id: 200,
        feature_code: "plan-b".into(),
        feature_type: FeatureType::Boolean,
        meter_id: None,
        effective_from: ts(2026, 1, 16),
        effective_to: None,
    };
    let amount_a = flat_amount(10, ts(2020, 1, 1), None, 10_000);
    let amount_b = flat_amount(20, ts(2020, 1, 1), None, 15_000);
    let mut product_by_price = HashMap::new();
    product_by_price.insert(10, 100);
    product_by_price.insert(20, 200);

    let (engine, results) = build_engine(
        vec![cycle],
        vec![subscription],
        vec![item_a, item_b],
        vec![entitlement_a, entitlement_b],
        vec![amount_a, amount_b],
        product_by_price,
        vec![],
    );

    let rows = engine.run_rating(1).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_ne!(rows[0].checksum, rows[1].checksum);

    let a = rows.iter().find(|r| r.price_id == 10).unwrap();
    let b = rows.iter().find(|r| r.price_id == 20).unwrap();
    assert!((a.amount_cents - 4839).abs() <= 1);
    assert!((b.amount_cents - 7742).abs() <= 1);

    assert_eq!(results.list_for_cycle(1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn metered_item_excludes_usage_before_subscription_start() {
    let cycle = BillingCycle { id: 1, subscription_id: 1, period_start: ts(2026, 1, 1), period_end: ts(2026, 2, 1), status: CycleStatus::Closing, rated_at: None };
    let subscription = base_subscription(1, ts(2026, 1, 16));
    let item = SubscriptionItem {
        id: 1,
        subscription_id: 1,
        price_id: 10,
        price_code: "api-calls".into(),
        meter_code: Some("api-calls".into()),
        billing_mode: BillingMode::Metered,
        billing_threshold: None,
        meter_id: Some(9),
        quantity: 1,
        effective_from: None,
        effective_to: None,
    };
    let entitlement = SubscriptionEntitlement {
        id: 1,
        subscription_id: 1,
        product_id: 100,
        feature_code: "api-calls".into(),
        feature_type: FeatureType::Metered,
        meter_id: Some(9),
        effective_from: ts(2025, 1, 1),
        effective_to: None,
    };
    let amount = flat_amount(10, ts(2020, 1, 1), None, 100);
    let usage = vec![
        UsageEvent {
            id: 1,
            tenant_id: 1,
            customer_id: 1,
            meter_code: "api-calls".into(),
            meter_id: Some(9),
            subscription_id: Some(1),
            subscription_item_id: Some(1),
            value: 10.0,
            recorded_at: ts(2026, 1, 10),
            idempotency_key: None,
            status: UsageEventStatus::Enriched,
            snapshot_at: Some(ts(2026, 1, 10)),
            attempt_count: 0,
            next_attempt_at: None,
        },
        UsageEvent {
            id: 2,
            tenant_id: 1,
            customer_id: 1,
            meter_code: "api-calls".into(),
            meter_id: Some(9),
            subscription_id: Some(1),
            subscription_item_id: Some(1),
            value: 5.0,
            recorded_at: ts(2026, 1, 20),
            idempotency_key: None,
            status: UsageEventStatus::Enriched,
            snapshot_at: Some(ts(2026, 1, 20)),
            attempt_count: 0,
            next_attempt_at: None,
        },
    ];

    let (engine, _) = build_engine(vec![cycle], vec![subscription], vec![item], vec![entitlement], vec![amount], HashMap::new(), usage);

    let rows = engine.run_rating(1).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 5.0);
    assert_eq!(rows[0].amount_cents, 500);
    assert_eq!(rows[0].period_start, ts(2026, 1, 16));
}

#[tokio::test]
async fn rerun_is_idempotent() {
    let cycle = BillingCycle { id: 1, subscription_id: 1, period_start: ts(2026, 1, 1), period_end: ts(2026, 2, 1), status: CycleStatus::Closing, rated_at: None };
    let subscription = base_subscription(1, ts(2025, 1, 1));
    let item = SubscriptionItem {
        id: 1,
        subscription_id: 1,
        price_id: 10,
        price_code: "plan".into(),
        meter_code: None,
        billing_mode: BillingMode::Flat,
        billing_threshold: None,
        meter_id: None,
        quantity: 1,
        effective_from: None,
        effective_to: None,
    };
    let entitlement = SubscriptionEntitlement {
        id: 1,
        subscription_id: 1,
        product_id: 100,
        feature_code: "plan".into(),
        feature_type: FeatureType::Boolean,
        meter_id: None,
        effective_from: ts(2025, 1, 1),
        effective_to: None,
    };
    let amount = flat_amount(10, ts(2020, 1, 1), None, 10_000);
    let mut product_by_price = HashMap::new();
    product_by_price.insert(10, 100);

    let (engine, _) = build_engine(vec![cycle], vec![subscription], vec![item], vec![entitlement], vec![amount], product_by_price, vec![]);

    let first = engine.run_rating(1).await.unwrap();
    let second = engine.run_rating(1).await.unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].checksum, second[0].checksum);
    assert_eq!(first[0].amount_cents, second[0].amount_cents);
}
