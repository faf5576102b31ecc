// [libs/domain/snapshot/src/worker.rs]
//! `RunOnce`: the Usage Snapshot Worker's one operation. Moves
//! up to `batch_size` `Accepted` events to `Enriched` or an unmatched
//! terminal state, each in its own short transaction at the infra layer.

use std::sync::Arc;

use billing_core_clock::Clock;
use billing_domain_models::ports::{MeterRepository, SubscriptionRepository, UsageEventRepository};
use billing_domain_models::{BillingError, SnapshotOutcome, UsageEvent};

/// Per-batch tallies, republished as backlog gauges at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotBatchReport {
    pub picked_up: usize,
    pub enriched: usize,
    pub unmatched_meter: usize,
    pub unmatched_subscription: usize,
    pub row_errors: usize,
}

/// Backoff base between resolution retries; `recovery_sweep` also uses the
/// same base so visibility and actual retry timing stay in sync.
const RETRY_BACKOFF_BASE_SECS: i64 = 2;

/// How long a `claim_accepted` claim survives before another worker may
/// reclaim the row — covers a worker dying mid-batch between the claim and
/// the eventual `save`.
const CLAIM_TTL: chrono::Duration = chrono::Duration::minutes(5);

pub struct UsageSnapshotWorker {
    usage: Arc<dyn UsageEventRepository>,
    meters: Arc<dyn MeterRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl UsageSnapshotWorker {
    pub fn new(
        usage: Arc<dyn UsageEventRepository>,
        meters: Arc<dyn MeterRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { usage, meters, subscriptions, clock }
    }

    #[tracing::instrument(skip(self), fields(batch_size))]
    pub async fn run_once(&self, batch_size: i64) -> Result<SnapshotBatchReport, BillingError> {
        let events = self.usage.claim_accepted(self.clock.now(), CLAIM_TTL, batch_size).await?;
        let mut report = SnapshotBatchReport { picked_up: events.len(), ..Default::default() };

        for mut event in events {
            match self.resolve_one(&event).await {
                Ok(outcome) => {
                    match &outcome {
                        SnapshotOutcome::Enriched { .. } => report.enriched += 1,
                        SnapshotOutcome::UnmatchedMeter => report.unmatched_meter += 1,
                        SnapshotOutcome::UnmatchedSubscription => report.unmatched_subscription += 1,
                    }
                    event.apply_snapshot(outcome, self.clock.now());
                    if let Err(err) = self.usage.save(&event).await {
                        tracing::warn!(event_id = event.id, error = %err, "failed to persist snapshot resolution, skipping");
                        report.row_errors += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(event_id = event.id, error = %err, "row-level resolution error, scheduling retry");
                    event.record_failure(self.clock.now(), RETRY_BACKOFF_BASE_SECS);
                    if let Err(save_err) = self.usage.save(&event).await {
                        tracing::warn!(event_id = event.id, error = %save_err, "failed to persist retry bookkeeping");
                    }
                    report.row_errors += 1;
                }
            }
        }

        tracing::info!(?report, "snapshot batch completed");
        Ok(report)
    }

    async fn resolve_one(&self, event: &UsageEvent) -> Result<SnapshotOutcome, BillingError> {
        let Some(meter) = self.meters.find_by_code(event.tenant_id, &event.meter_code).await? else {
            return Ok(SnapshotOutcome::UnmatchedMeter);
        };

        let Some(subscription) = self
            .subscriptions
            .find_active_for_customer_at(event.tenant_id, event.customer_id, event.recorded_at)
            .await?
        else {
            return Ok(SnapshotOutcome::UnmatchedSubscription);
        };

        let item = self
            .subscriptions
            .find_item_binding(subscription.id, meter.id, event.recorded_at)
            .await?;

        Ok(SnapshotOutcome::Enriched {
            meter_id: meter.id,
            subscription_id: subscription.id,
            subscription_item_id: item.map(|i| i.id),
        })
    }
}
