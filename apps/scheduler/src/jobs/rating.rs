// [apps/scheduler/src/jobs/rating.rs]
//! `rating`: invokes the Rating Engine for every `Closing` cycle. A failure
//! on one cycle is logged and the batch continues; the cycle simply stays
//! `Closing` and is retried next tick. Cycles are claimed via
//! `rating_claimed_at` rather than a status change, since rating itself can
//! fail partway — a claim older than `RATING_CLAIM_TTL` is treated as an
//! abandoned attempt and is reclaimable.

use async_trait::async_trait;
use chrono::Duration;

use crate::context::AppContext;
use crate::jobs::{Job, JobStats};

const RATING_CLAIM_TTL: Duration = Duration::minutes(5);

pub struct Rating {
    ctx: AppContext,
}

impl Rating {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Job for Rating {
    fn name(&self) -> &'static str {
        "rating"
    }

    async fn run_once(&self, batch_size: i64) -> anyhow::Result<JobStats> {
        let now = self.ctx.clock.now();
        let closing = self.ctx.cycles.claim_closing_for_rating(now, RATING_CLAIM_TTL, batch_size).await?;
        let mut processed = 0usize;

        for mut cycle in closing {
            match self.ctx.rating_engine.run_rating(cycle.id).await {
                Ok(rows) => {
                    cycle.mark_rated(now);
                    if let Err(err) = self.ctx.cycles.save(&cycle).await {
                        tracing::warn!(cycle_id = cycle.id, error = %err, "failed to persist rated_at, will retry next tick");
                        continue;
                    }
                    tracing::info!(cycle_id = cycle.id, rows = rows.len(), "rated cycle");
                    processed += 1;
                }
                Err(err) => {
                    tracing::warn!(cycle_id = cycle.id, error = %err, "rating failed for cycle, will retry next tick");
                }
            }
        }

        Ok(JobStats::one(processed))
    }
}
