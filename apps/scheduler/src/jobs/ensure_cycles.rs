// [apps/scheduler/src/jobs/ensure_cycles.rs]
//! `ensure_cycles`: opens the next billing cycle for each Active
//! subscription once its anchor day arrives. Runs under a
//! singleton `JobLease` rather than per-row locks — there is no natural row
//! to lock before the cycle exists. Pages through every subscription with
//! `list_active_all`'s keyset cursor within one tick, since leaving any page
//! unvisited would mean some subscriptions never get a cycle opened.

use async_trait::async_trait;
use billing_domain_models::{next_period_bounds, BillingCycle, CycleStatus, SubscriptionStatus};
use chrono::Duration;

use crate::context::AppContext;
use crate::jobs::{Job, JobStats};

const LEASE_TTL: Duration = Duration::minutes(5);

pub struct EnsureCycles {
    ctx: AppContext,
}

impl EnsureCycles {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Job for EnsureCycles {
    fn name(&self) -> &'static str {
        "ensure_cycles"
    }

    async fn run_once(&self, batch_size: i64) -> anyhow::Result<JobStats> {
        let now = self.ctx.clock.now();
        let Some(_lease) = self.ctx.leases.try_acquire("ensure_cycles", &self.ctx.instance_id, now, LEASE_TTL).await? else {
            tracing::debug!("ensure_cycles lease held elsewhere, skipping tick");
            return Ok(JobStats::default());
        };

        let mut processed = 0usize;
        let mut after_id = 0i64;

        loop {
            let subscriptions = self.ctx.subscriptions.list_active_all(batch_size, after_id).await?;
            let page_len = subscriptions.len();
            let Some(last) = subscriptions.last() else { break };
            after_id = last.id;

            for sub in subscriptions {
                if sub.status != SubscriptionStatus::Active {
                    continue;
                }
                let latest = self.ctx.cycles.find_latest_for_subscription(sub.id).await?;
                let (period_start, period_end) = match &latest {
                    None => next_period_bounds(sub.billing_cycle_type, sub.start_at),
                    Some(cycle) if cycle.status == CycleStatus::Closed => next_period_bounds(sub.billing_cycle_type, cycle.period_end),
                    Some(_) => continue,
                };
                if period_start > now {
                    continue;
                }

                let cycle = BillingCycle {
                    id: self.ctx.ids.next_id(),
                    subscription_id: sub.id,
                    period_start,
                    period_end,
                    status: CycleStatus::Open,
                    rated_at: None,
                };
                if self.ctx.cycles.ensure(&cycle).await? {
                    processed += 1;
                    tracing::info!(subscription_id = sub.id, cycle_id = cycle.id, "opened billing cycle");
                }
            }

            if (page_len as i64) < batch_size {
                break;
            }
        }

        self.ctx.leases.release("ensure_cycles", &self.ctx.instance_id).await?;
        Ok(JobStats::one(processed))
    }
}
