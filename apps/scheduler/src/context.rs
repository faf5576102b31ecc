// [apps/scheduler/src/context.rs]
//! Wires repositories, the rating engine, and the snapshot worker onto one
//! Postgres pool. Every field is an `Arc`, so `AppContext` is cheap to clone
//! into each job's ticker task.

use std::sync::Arc;

use billing_core_clock::{system_clock, Clock};
use billing_core_ids::IdGenerator;
use billing_domain_models::ports::{CycleRepository, InvoiceRepository, JobLeaseRepository, MeterRepository, PriceRepository, RatingResultRepository, SubscriptionRepository, UsageEventRepository};
use billing_domain_rating::RatingEngine;
use billing_domain_snapshot::UsageSnapshotWorker;
use billing_infra_db::{PgCycleRepository, PgInvoiceRepository, PgJobLeaseRepository, PgMeterRepository, PgPriceRepository, PgRatingResultRepository, PgSubscriptionRepository, PgUsageEventRepository};
use billing_shared_telemetry::JobMetrics;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppContext {
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub cycles: Arc<dyn CycleRepository>,
    pub usage: Arc<dyn UsageEventRepository>,
    pub prices: Arc<dyn PriceRepository>,
    pub meters: Arc<dyn MeterRepository>,
    pub results: Arc<dyn RatingResultRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub leases: Arc<dyn JobLeaseRepository>,
    pub rating_engine: Arc<RatingEngine>,
    pub snapshot_worker: Arc<UsageSnapshotWorker>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<IdGenerator>,
    pub metrics: Arc<JobMetrics>,
    pub instance_id: String,
}

impl AppContext {
    pub fn new(pool: PgPool, node_id: u16, instance_id: String) -> Self {
        let subscriptions: Arc<dyn SubscriptionRepository> = Arc::new(PgSubscriptionRepository::new(pool.clone()));
        let cycles: Arc<dyn CycleRepository> = Arc::new(PgCycleRepository::new(pool.clone()));
        let usage: Arc<dyn UsageEventRepository> = Arc::new(PgUsageEventRepository::new(pool.clone()));
        let prices: Arc<dyn PriceRepository> = Arc::new(PgPriceRepository::new(pool.clone()));
        let meters: Arc<dyn MeterRepository> = Arc::new(PgMeterRepository::new(pool.clone()));
        let results: Arc<dyn RatingResultRepository> = Arc::new(PgRatingResultRepository::new(pool.clone()));
        let invoices: Arc<dyn InvoiceRepository> = Arc::new(PgInvoiceRepository::new(pool.clone()));
        let leases: Arc<dyn JobLeaseRepository> = Arc::new(PgJobLeaseRepository::new(pool.clone()));
        let ids = Arc::new(IdGenerator::new(node_id));
        let clock = system_clock();

        let rating_engine = Arc::new(RatingEngine::new(cycles.clone(), subscriptions.clone(), prices.clone(), usage.clone(), results.clone(), ids.clone()));
        let snapshot_worker = Arc::new(UsageSnapshotWorker::new(usage.clone(), meters.clone(), subscriptions.clone(), clock.clone()));

        Self {
            subscriptions,
            cycles,
            usage,
            prices,
            meters,
            results,
            invoices,
            leases,
            rating_engine,
            snapshot_worker,
            clock,
            ids,
            metrics: Arc::new(JobMetrics::new()),
            instance_id,
        }
    }
}
