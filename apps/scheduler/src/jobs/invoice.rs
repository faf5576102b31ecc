// [apps/scheduler/src/jobs/invoice.rs]
//! `invoice`: builds a finalized invoice from each closed, rated cycle that
//! doesn't have one yet. Delivery and payment are external
//! collaborators; this job only materializes the
//! row those collaborators act on, finalized immediately since nothing
//! downstream of this pipeline can still revise the rated amounts.

use async_trait::async_trait;
use billing_domain_models::{Invoice, InvoiceStatus};

use crate::context::AppContext;
use crate::jobs::{Job, JobStats};

pub struct InvoiceJob {
    ctx: AppContext,
}

impl InvoiceJob {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Job for InvoiceJob {
    fn name(&self) -> &'static str {
        "invoice"
    }

    async fn run_once(&self, batch_size: i64) -> anyhow::Result<JobStats> {
        let cycles = self.ctx.cycles.list_closed_uninvoiced(batch_size).await?;
        let mut processed = 0usize;

        for cycle in cycles {
            let rows = self.ctx.results.list_for_cycle(cycle.id).await?;
            let Some(currency) = rows.first().map(|r| r.currency) else {
                tracing::debug!(cycle_id = cycle.id, "no rating rows, skipping invoice for now");
                continue;
            };
            let total_cents: i64 = rows.iter().map(|r| r.amount_cents).sum();
            let now = self.ctx.clock.now();

            let invoice = Invoice {
                id: self.ctx.ids.next_id(),
                subscription_id: cycle.subscription_id,
                billing_cycle_id: cycle.id,
                status: InvoiceStatus::Finalized,
                total_cents,
                currency,
                finalized_at: Some(now),
            };
            self.ctx.invoices.save(&invoice).await?;
            processed += 1;
            tracing::info!(cycle_id = cycle.id, invoice_id = invoice.id, total_cents, "invoice drafted");
        }

        Ok(JobStats::one(processed))
    }
}
