// [apps/scheduler/src/jobs/mod.rs]
//! The fixed job catalog. Each job implements `Job`; `runner.rs`
//! drives one ticker loop per enabled job, all sharing one `AppContext`.

pub mod close_after_rating;
pub mod close_cycles;
pub mod end_canceled_subs;
pub mod ensure_cycles;
pub mod invoice;
pub mod rating;
pub mod recovery_sweep;
pub mod usage_snapshot;

use async_trait::async_trait;

/// Tally of a single job iteration, folded into the job metrics registry
/// by `runner.rs` after every tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct JobStats {
    pub processed: usize,
}

impl JobStats {
    pub fn one(processed: usize) -> Self {
        Self { processed }
    }
}

#[async_trait]
pub trait Job: Send + Sync {
    /// Stable name, also the `ENABLED_JOBS` token and the `job` label on
    /// emitted metrics.
    fn name(&self) -> &'static str;

    /// Runs one bounded batch. Row-level failures are handled inside the
    /// implementation and counted in the returned stats; this only returns
    /// `Err` for failures that make the whole batch meaningless (lease
    /// lost, DB connection down).
    async fn run_once(&self, batch_size: i64) -> anyhow::Result<JobStats>;
}

pub fn catalog(ctx: &crate::context::AppContext, max_attempts: i32) -> Vec<Box<dyn Job>> {
    vec![
        Box::new(ensure_cycles::EnsureCycles::new(ctx.clone())),
        Box::new(usage_snapshot::UsageSnapshot::new(ctx.clone())),
        Box::new(close_cycles::CloseCycles::new(ctx.clone())),
        Box::new(rating::Rating::new(ctx.clone())),
        Box::new(close_after_rating::CloseAfterRating::new(ctx.clone())),
        Box::new(invoice::InvoiceJob::new(ctx.clone())),
        Box::new(end_canceled_subs::EndCanceledSubs::new(ctx.clone())),
        Box::new(recovery_sweep::RecoverySweep::new(ctx.clone(), max_attempts)),
    ]
}
