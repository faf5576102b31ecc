// [apps/scheduler/src/jobs/close_cycles.rs]
//! `close_cycles`: `Open -> Closing` once `now >= periodEnd`. `claim_open_due`
//! claims and flips each cycle's status in the same statement, so concurrent
//! schedulers never race on the same row.

use async_trait::async_trait;

use crate::context::AppContext;
use crate::jobs::{Job, JobStats};

pub struct CloseCycles {
    ctx: AppContext,
}

impl CloseCycles {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Job for CloseCycles {
    fn name(&self) -> &'static str {
        "close_cycles"
    }

    async fn run_once(&self, batch_size: i64) -> anyhow::Result<JobStats> {
        let now = self.ctx.clock.now();
        let closed = self.ctx.cycles.claim_open_due(now, batch_size).await?;

        for cycle in &closed {
            tracing::info!(cycle_id = cycle.id, "cycle closed");
        }

        Ok(JobStats::one(closed.len()))
    }
}
