// [libs/infra/db/src/repositories/invoice_repository.rs]
//! Postgres-backed `InvoiceRepository`. Invoice finalization itself is an
//! external collaborator's job; this repository only
//! supplies the facts the `Subscription.end` gate needs. `save` conflicts on
//! `ux_invoices_cycle` rather than the invoice id: the `invoice` job always
//! mints a fresh id, so a same-id conflict never fires, but two schedulers
//! racing the same cycle both mint distinct ids and would otherwise both
//! insert — the cycle uniqueness is what actually prevents the duplicate.

use async_trait::async_trait;
use billing_domain_models::ports::{InvoiceRepository, PortResult};
use billing_domain_models::{BillingError, Currency, Invoice};
use sqlx::{PgPool, Row};

use crate::mapping::{invoice_status_from_str, invoice_status_to_str};

pub struct PgInvoiceRepository {
    pool: PgPool,
}

impl PgInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> BillingError {
    crate::errors::DbError::Query(e).into()
}

#[async_trait]
impl InvoiceRepository for PgInvoiceRepository {
    async fn count_unfinalized(&self, subscription_id: i64) -> PortResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE subscription_id = $1 AND status NOT IN ('finalized', 'void')")
            .bind(subscription_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as usize)
    }

    async fn find_for_cycle(&self, billing_cycle_id: i64) -> PortResult<Option<Invoice>> {
        let row = sqlx::query("SELECT * FROM invoices WHERE billing_cycle_id = $1")
            .bind(billing_cycle_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        let Some(row) = row else { return Ok(None) };
        let currency: String = row.try_get("currency").map_err(db_err)?;
        Ok(Some(Invoice {
            id: row.try_get("id").map_err(db_err)?,
            subscription_id: row.try_get("subscription_id").map_err(db_err)?,
            billing_cycle_id: row.try_get("billing_cycle_id").map_err(db_err)?,
            status: invoice_status_from_str(row.try_get("status").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
            total_cents: row.try_get("total_cents").map_err(db_err)?,
            currency: Currency::code(&currency),
            finalized_at: row.try_get("finalized_at").map_err(db_err)?,
        }))
    }

    async fn save(&self, invoice: &Invoice) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO invoices (id, subscription_id, billing_cycle_id, status, total_cents, currency, finalized_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (billing_cycle_id) DO NOTHING",
        )
        .bind(invoice.id)
        .bind(invoice.subscription_id)
        .bind(invoice.billing_cycle_id)
        .bind(invoice_status_to_str(invoice.status))
        .bind(invoice.total_cents)
        .bind(invoice.currency.as_str())
        .bind(invoice.finalized_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
