// [apps/scheduler/src/jobs/usage_snapshot.rs]
//! `usage_snapshot`: drives the Usage Snapshot Worker's `RunOnce` and
//! republishes backlog gauges for the `/metrics` endpoint.

use async_trait::async_trait;

use crate::context::AppContext;
use crate::jobs::{Job, JobStats};

pub struct UsageSnapshot {
    ctx: AppContext,
}

impl UsageSnapshot {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Job for UsageSnapshot {
    fn name(&self) -> &'static str {
        "usage_snapshot"
    }

    async fn run_once(&self, batch_size: i64) -> anyhow::Result<JobStats> {
        let report = self.ctx.snapshot_worker.run_once(batch_size).await?;

        self.ctx.metrics.set_gauge("usage_events_unmatched_meter", report.unmatched_meter as i64);
        self.ctx.metrics.set_gauge("usage_events_unmatched_subscription", report.unmatched_subscription as i64);
        self.ctx.metrics.set_gauge("usage_events_row_errors", report.row_errors as i64);

        Ok(JobStats::one(report.picked_up))
    }
}
