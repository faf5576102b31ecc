// [libs/domain/models/src/ports.rs]
//! Repository port traits. Domain and application crates depend only on
//! these; `libs/infra/db` supplies the sqlx-backed implementations. Keeping
//! I/O behind traits here is what lets `rating`/`snapshot` stay pure and
//! unit-testable against in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cycle::BillingCycle;
use crate::entitlement::SubscriptionEntitlement;
use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::job_lease::JobLease;
use crate::meter::Meter;
use crate::price::PriceAmount;
use crate::rating_result::RatingResult;
use crate::subscription::Subscription;
use crate::subscription_item::SubscriptionItem;
use crate::usage_event::UsageEvent;

pub type PortResult<T> = Result<T, BillingError>;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find(&self, id: i64) -> PortResult<Option<Subscription>>;
    async fn find_active_for_customer_at(
        &self,
        tenant_id: i64,
        customer_id: i64,
        at: DateTime<Utc>,
    ) -> PortResult<Option<Subscription>>;
    async fn list_active(&self, tenant_id: i64) -> PortResult<Vec<Subscription>>;
    /// Cross-tenant page of `Active` subscriptions ordered by id, for
    /// `ensure_cycles`, which runs under a singleton lease rather than
    /// per-tenant row locks. Default no-op for ports that don't back a
    /// multi-tenant store.
    async fn list_active_all(&self, _limit: i64, _after_id: i64) -> PortResult<Vec<Subscription>> {
        Ok(Vec::new())
    }
    async fn list_pending_cancellation(&self) -> PortResult<Vec<Subscription>>;
    async fn items(&self, subscription_id: i64) -> PortResult<Vec<SubscriptionItem>>;
    async fn find_item_binding(
        &self,
        subscription_id: i64,
        meter_id: i64,
        at: DateTime<Utc>,
    ) -> PortResult<Option<SubscriptionItem>>;
    async fn entitlements_effective_in(
        &self,
        subscription_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PortResult<Vec<SubscriptionEntitlement>>;
    async fn save(&self, subscription: &Subscription) -> PortResult<()>;
}

#[async_trait]
pub trait CycleRepository: Send + Sync {
    async fn find(&self, id: i64) -> PortResult<Option<BillingCycle>>;
    async fn find_latest_for_subscription(&self, subscription_id: i64) -> PortResult<Option<BillingCycle>>;
    async fn count_non_closed(&self, subscription_id: i64) -> PortResult<usize>;
    /// Atomically claims up to `limit` `Open` cycles whose period has elapsed
    /// and transitions them straight to `Closing` in the same statement, so
    /// the `FOR UPDATE SKIP LOCKED` claim and the status mutation can never
    /// be observed apart by a second caller.
    async fn claim_open_due(&self, now: DateTime<Utc>, limit: i64) -> PortResult<Vec<BillingCycle>>;
    /// Atomically claims up to `limit` unrated `Closing` cycles for the
    /// rating job. A claimed cycle's `rating_claimed_at` is set to `now`
    /// rather than its status being changed, since rating itself can still
    /// fail; a claim older than `claim_ttl` is treated as abandoned and is
    /// eligible to be reclaimed, the same lease-expiry idea `JobLease` uses
    /// at the job level, applied per row here.
    async fn claim_closing_for_rating(&self, now: DateTime<Utc>, claim_ttl: chrono::Duration, limit: i64) -> PortResult<Vec<BillingCycle>>;
    /// Atomically claims and transitions `Closing` cycles whose rating has
    /// committed (`rated_at` set) straight to `Closed`.
    async fn claim_closing_rated_for_close(&self, _limit: i64) -> PortResult<Vec<BillingCycle>> {
        Ok(Vec::new())
    }
    /// `Closed` cycles with no invoice yet, for the `invoice` job. Read-only:
    /// the uniqueness of `invoices.billing_cycle_id` is what keeps two
    /// schedulers from double-invoicing the same cycle, not this read.
    async fn list_closed_uninvoiced(&self, _limit: i64) -> PortResult<Vec<BillingCycle>> {
        Ok(Vec::new())
    }
    /// Inserts a cycle only if its `(subscription_id, period_start, period_end)`
    /// fingerprint is new; returns `false` when it already existed.
    async fn ensure(&self, cycle: &BillingCycle) -> PortResult<bool>;
    async fn save(&self, cycle: &BillingCycle) -> PortResult<()>;
}

#[async_trait]
pub trait UsageEventRepository: Send + Sync {
    /// Atomically claims up to `limit` `Accepted` events whose backoff
    /// window (if any) has elapsed, stamping `claimed_at` in the same
    /// statement as the `FOR UPDATE SKIP LOCKED` read. `save` always clears
    /// `claimed_at`, so a claim only outlives processing if the worker dies
    /// before saving; a claim older than `claim_ttl` is reclaimable.
    async fn claim_accepted(&self, now: DateTime<Utc>, claim_ttl: chrono::Duration, limit: i64) -> PortResult<Vec<UsageEvent>>;
    async fn sum_enriched_in_window(
        &self,
        tenant_id: i64,
        subscription_id: i64,
        meter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PortResult<f64>;
    async fn save(&self, event: &UsageEvent) -> PortResult<()>;
    /// Returns the pre-existing row on a `(tenant, idempotency_key)` collision
    /// instead of raising an error.
    async fn insert_idempotent(&self, event: UsageEvent) -> PortResult<UsageEvent>;
    /// Events with outstanding retry bookkeeping whose backoff window has
    /// elapsed, for `recovery_sweep` to re-queue.
    async fn list_recovery_candidates(&self, _limit: i64) -> PortResult<Vec<UsageEvent>> {
        Ok(Vec::new())
    }
}

#[async_trait]
pub trait PriceRepository: Send + Sync {
    async fn amounts_for_price(&self, price_id: i64) -> PortResult<Vec<PriceAmount>>;
    async fn product_id_for_price(&self, price_id: i64) -> PortResult<i64>;
}

#[async_trait]
pub trait MeterRepository: Send + Sync {
    async fn find_by_code(&self, tenant_id: i64, code: &str) -> PortResult<Option<Meter>>;
}

#[async_trait]
pub trait RatingResultRepository: Send + Sync {
    /// Deletes the cycle's prior rows and inserts `results` in one
    /// transaction, so a rating run that fails partway never leaves the
    /// cycle with a mix of old and new rows — and a successful run is the
    /// only thing callers ever observe committed.
    async fn replace_all(&self, billing_cycle_id: i64, results: &[RatingResult]) -> PortResult<()>;
    async fn list_for_cycle(&self, billing_cycle_id: i64) -> PortResult<Vec<RatingResult>>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn count_unfinalized(&self, subscription_id: i64) -> PortResult<usize>;
    async fn find_for_cycle(&self, billing_cycle_id: i64) -> PortResult<Option<Invoice>>;
    async fn save(&self, invoice: &Invoice) -> PortResult<()>;
}

#[async_trait]
pub trait JobLeaseRepository: Send + Sync {
    /// Acquires the lease for `job_name` if unheld or expired; returns
    /// `None` if another live holder exists.
    async fn try_acquire(&self, job_name: &str, instance_id: &str, now: DateTime<Utc>, ttl: chrono::Duration) -> PortResult<Option<JobLease>>;
    async fn renew(&self, lease: &JobLease) -> PortResult<()>;
    async fn release(&self, job_name: &str, instance_id: &str) -> PortResult<()>;
}
