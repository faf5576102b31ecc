// [apps/scheduler/src/jobs/close_after_rating.rs]
//! `close_after_rating`: `Closing -> Closed` once rating has committed,
//! claimed separately from the `rating` job so a process
//! that rates a cycle and then dies before closing it leaves the transition
//! for the next tick rather than losing it. `claim_closing_rated_for_close`
//! claims and flips status in the same statement.

use async_trait::async_trait;

use crate::context::AppContext;
use crate::jobs::{Job, JobStats};

pub struct CloseAfterRating {
    ctx: AppContext,
}

impl CloseAfterRating {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Job for CloseAfterRating {
    fn name(&self) -> &'static str {
        "close_after_rating"
    }

    async fn run_once(&self, batch_size: i64) -> anyhow::Result<JobStats> {
        let closed = self.ctx.cycles.claim_closing_rated_for_close(batch_size).await?;

        for cycle in &closed {
            tracing::info!(cycle_id = cycle.id, "cycle closed after rating");
        }

        Ok(JobStats::one(closed.len()))
    }
}
