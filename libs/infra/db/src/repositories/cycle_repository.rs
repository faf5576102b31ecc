// [libs/infra/db/src/repositories/cycle_repository.rs]
//! Postgres-backed `CycleRepository`. `ensure` relies on the unique index
//! over `(subscription_id, period_start, period_end)` for the cycle
//! fingerprint. `claim_open_due` and `claim_closing_rated_for_close` claim
//! and transition a cycle in one `WITH ... FOR UPDATE SKIP LOCKED ... UPDATE
//! ... RETURNING` statement, so no second caller can ever observe the row
//! between the claim and the mutation. `claim_closing_for_rating` claims the
//! same way but stamps `rating_claimed_at` instead of flipping status, since
//! rating can still fail after the claim; a stale claim past `claim_ttl` is
//! reclaimable, mirroring `JobLease`'s TTL idea at row granularity.
//! `list_closed_uninvoiced` takes no lock at all — `ux_invoices_cycle`
//! is what keeps two schedulers from double-invoicing the same cycle.

use async_trait::async_trait;
use billing_domain_models::ports::{CycleRepository, PortResult};
use billing_domain_models::{BillingCycle, BillingError};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::mapping::{cycle_status_from_str, cycle_status_to_str};

pub struct PgCycleRepository {
    pool: PgPool,
}

impl PgCycleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> BillingError {
    crate::errors::DbError::Query(e).into()
}

fn row_to_cycle(row: &sqlx::postgres::PgRow) -> Result<BillingCycle, BillingError> {
    Ok(BillingCycle {
        id: row.try_get("id").map_err(db_err)?,
        subscription_id: row.try_get("subscription_id").map_err(db_err)?,
        period_start: row.try_get("period_start").map_err(db_err)?,
        period_end: row.try_get("period_end").map_err(db_err)?,
        status: cycle_status_from_str(row.try_get("status").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
        rated_at: row.try_get("rated_at").map_err(db_err)?,
    })
}

#[async_trait]
impl CycleRepository for PgCycleRepository {
    async fn find(&self, id: i64) -> PortResult<Option<BillingCycle>> {
        let row = sqlx::query("SELECT * FROM billing_cycles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_cycle).transpose()
    }

    async fn find_latest_for_subscription(&self, subscription_id: i64) -> PortResult<Option<BillingCycle>> {
        let row = sqlx::query("SELECT * FROM billing_cycles WHERE subscription_id = $1 ORDER BY period_start DESC LIMIT 1")
            .bind(subscription_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_cycle).transpose()
    }

    async fn count_non_closed(&self, subscription_id: i64) -> PortResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM billing_cycles WHERE subscription_id = $1 AND status <> 'closed'")
            .bind(subscription_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as usize)
    }

    async fn claim_open_due(&self, now: DateTime<Utc>, limit: i64) -> PortResult<Vec<BillingCycle>> {
        let rows = sqlx::query(
            "WITH claimed AS ( \
                 SELECT id FROM billing_cycles WHERE status = 'open' AND period_end <= $1 \
                 ORDER BY period_end ASC LIMIT $2 FOR UPDATE SKIP LOCKED \
             ) \
             UPDATE billing_cycles AS bc SET status = 'closing' \
             FROM claimed WHERE bc.id = claimed.id RETURNING bc.*",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_cycle).collect()
    }

    async fn claim_closing_for_rating(&self, now: DateTime<Utc>, claim_ttl: chrono::Duration, limit: i64) -> PortResult<Vec<BillingCycle>> {
        let stale_before = now - claim_ttl;
        let rows = sqlx::query(
            "WITH claimed AS ( \
                 SELECT id FROM billing_cycles \
                 WHERE status = 'closing' AND rated_at IS NULL \
                   AND (rating_claimed_at IS NULL OR rating_claimed_at < $1) \
                 ORDER BY period_end ASC LIMIT $2 FOR UPDATE SKIP LOCKED \
             ) \
             UPDATE billing_cycles AS bc SET rating_claimed_at = $3 \
             FROM claimed WHERE bc.id = claimed.id RETURNING bc.*",
        )
        .bind(stale_before)
        .bind(limit)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_cycle).collect()
    }

    async fn claim_closing_rated_for_close(&self, limit: i64) -> PortResult<Vec<BillingCycle>> {
        let rows = sqlx::query(
            "WITH claimed AS ( \
                 SELECT id FROM billing_cycles WHERE status = 'closing' AND rated_at IS NOT NULL \
                 ORDER BY period_end ASC LIMIT $1 FOR UPDATE SKIP LOCKED \
             ) \
             UPDATE billing_cycles AS bc SET status = 'closed' \
             FROM claimed WHERE bc.id = claimed.id RETURNING bc.*",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_cycle).collect()
    }

    async fn list_closed_uninvoiced(&self, limit: i64) -> PortResult<Vec<BillingCycle>> {
        let rows = sqlx::query(
            "SELECT bc.* FROM billing_cycles bc \
             WHERE bc.status = 'closed' AND NOT EXISTS (SELECT 1 FROM invoices i WHERE i.billing_cycle_id = bc.id) \
             ORDER BY bc.period_end ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_cycle).collect()
    }

    async fn ensure(&self, cycle: &BillingCycle) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO billing_cycles (id, subscription_id, period_start, period_end, status, rated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (subscription_id, period_start, period_end) DO NOTHING",
        )
        .bind(cycle.id)
        .bind(cycle.subscription_id)
        .bind(cycle.period_start)
        .bind(cycle.period_end)
        .bind(cycle_status_to_str(cycle.status))
        .bind(cycle.rated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn save(&self, cycle: &BillingCycle) -> PortResult<()> {
        sqlx::query("UPDATE billing_cycles SET status = $2, rated_at = $3, rating_claimed_at = NULL WHERE id = $1")
            .bind(cycle.id)
            .bind(cycle_status_to_str(cycle.status))
            .bind(cycle.rated_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
