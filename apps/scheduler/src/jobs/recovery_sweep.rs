// [apps/scheduler/src/jobs/recovery_sweep.rs]
//! `recovery_sweep`: surfaces usage events parked past `next_attempt_at`
//! with retry bookkeeping outstanding. Events whose backoff
//! window has elapsed are already eligible for `usage_snapshot` to pick
//! back up on its own next tick; this job's distinct job is visibility —
//! it republishes a dead-letter gauge for events that have exhausted
//! `max_attempts`, since those will otherwise sit silently forever.

use async_trait::async_trait;

use crate::context::AppContext;
use crate::jobs::{Job, JobStats};

pub struct RecoverySweep {
    ctx: AppContext,
    max_attempts: i32,
}

impl RecoverySweep {
    pub fn new(ctx: AppContext, max_attempts: i32) -> Self {
        Self { ctx, max_attempts }
    }
}

#[async_trait]
impl Job for RecoverySweep {
    fn name(&self) -> &'static str {
        "recovery_sweep"
    }

    async fn run_once(&self, batch_size: i64) -> anyhow::Result<JobStats> {
        let candidates = self.ctx.usage.list_recovery_candidates(batch_size).await?;
        let mut dead = 0usize;

        for event in &candidates {
            if event.is_dead(self.max_attempts) {
                dead += 1;
                tracing::warn!(
                    event_id = event.id,
                    attempt_count = event.attempt_count,
                    max_attempts = self.max_attempts,
                    "usage event exhausted retry attempts, parked for manual review"
                );
            }
        }

        self.ctx.metrics.set_gauge("recovery_dead_events", dead as i64);
        self.ctx.metrics.set_gauge("recovery_pending_events", (candidates.len() - dead) as i64);

        Ok(JobStats::one(candidates.len()))
    }
}
