// [apps/scheduler/src/jobs/end_canceled_subs.rs]
//! `end_canceled_subs`: finalizes subscriptions marked for cancellation,
//! `Canceled -> Ended`, gated on zero non-`Closed` cycles
//! and zero unfinalized invoices remaining.

use async_trait::async_trait;

use crate::context::AppContext;
use crate::jobs::{Job, JobStats};

pub struct EndCanceledSubs {
    ctx: AppContext,
}

impl EndCanceledSubs {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Job for EndCanceledSubs {
    fn name(&self) -> &'static str {
        "end_canceled_subs"
    }

    async fn run_once(&self, _batch_size: i64) -> anyhow::Result<JobStats> {
        let now = self.ctx.clock.now();
        let pending = self.ctx.subscriptions.list_pending_cancellation().await?;
        let mut processed = 0usize;

        for mut sub in pending {
            let open_cycles = self.ctx.cycles.count_non_closed(sub.id).await?;
            let unfinalized_invoices = self.ctx.invoices.count_unfinalized(sub.id).await?;

            match sub.end(now, open_cycles, unfinalized_invoices) {
                Ok(()) => {
                    if let Err(err) = self.ctx.subscriptions.save(&sub).await {
                        tracing::warn!(subscription_id = sub.id, error = %err, "failed to persist subscription end, skipping");
                        continue;
                    }
                    processed += 1;
                    tracing::info!(subscription_id = sub.id, "subscription ended");
                }
                Err(err) => {
                    tracing::debug!(subscription_id = sub.id, error = %err, "subscription not yet eligible to end");
                }
            }
        }

        Ok(JobStats::one(processed))
    }
}
