// [libs/infra/db/src/repositories/usage_event_repository.rs]
//! Postgres-backed `UsageEventRepository`. `insert_idempotent` relies on
//! `ux_usage_events_idempotency` and returns the pre-existing row on a
//! unique-violation instead of raising an error. `claim_accepted` claims and
//! stamps `claimed_at` in one `FOR UPDATE SKIP LOCKED` statement; `save`
//! always clears it, so a claim only outlives a worker that died before
//! saving, and a claim older than `claim_ttl` is reclaimable.
//! `list_recovery_candidates` takes no lock — it only reports backlog, it
//! never mutates a row.

use async_trait::async_trait;
use billing_domain_models::ports::{PortResult, UsageEventRepository};
use billing_domain_models::{BillingError, UsageEvent};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::mapping::{usage_event_status_from_str, usage_event_status_to_str};

pub struct PgUsageEventRepository {
    pool: PgPool,
}

impl PgUsageEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> BillingError {
    crate::errors::DbError::Query(e).into()
}

fn row_to_event(row: &sqlx::postgres::PgRow) -> Result<UsageEvent, BillingError> {
    Ok(UsageEvent {
        id: row.try_get("id").map_err(db_err)?,
        tenant_id: row.try_get("tenant_id").map_err(db_err)?,
        customer_id: row.try_get("customer_id").map_err(db_err)?,
        meter_code: row.try_get("meter_code").map_err(db_err)?,
        meter_id: row.try_get("meter_id").map_err(db_err)?,
        subscription_id: row.try_get("subscription_id").map_err(db_err)?,
        subscription_item_id: row.try_get("subscription_item_id").map_err(db_err)?,
        value: row.try_get("value").map_err(db_err)?,
        recorded_at: row.try_get("recorded_at").map_err(db_err)?,
        idempotency_key: row.try_get("idempotency_key").map_err(db_err)?,
        status: usage_event_status_from_str(row.try_get("status").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
        snapshot_at: row.try_get("snapshot_at").map_err(db_err)?,
        attempt_count: row.try_get("attempt_count").map_err(db_err)?,
        next_attempt_at: row.try_get("next_attempt_at").map_err(db_err)?,
    })
}

#[async_trait]
impl UsageEventRepository for PgUsageEventRepository {
    async fn claim_accepted(&self, now: DateTime<Utc>, claim_ttl: chrono::Duration, limit: i64) -> PortResult<Vec<UsageEvent>> {
        let stale_before = now - claim_ttl;
        let rows = sqlx::query(
            "WITH claimed AS ( \
                 SELECT id FROM usage_events \
                 WHERE status = 'accepted' \
                   AND (next_attempt_at IS NULL OR next_attempt_at <= $1) \
                   AND (claimed_at IS NULL OR claimed_at < $2) \
                 ORDER BY recorded_at ASC LIMIT $3 FOR UPDATE SKIP LOCKED \
             ) \
             UPDATE usage_events AS ue SET claimed_at = $1 \
             FROM claimed WHERE ue.id = claimed.id RETURNING ue.*",
        )
        .bind(now)
        .bind(stale_before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_event).collect()
    }

    async fn list_recovery_candidates(&self, limit: i64) -> PortResult<Vec<UsageEvent>> {
        let rows = sqlx::query(
            "SELECT * FROM usage_events WHERE status = 'accepted' AND attempt_count > 0 \
               AND next_attempt_at IS NOT NULL AND next_attempt_at <= now() \
             ORDER BY next_attempt_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_event).collect()
    }

    async fn sum_enriched_in_window(
        &self,
        tenant_id: i64,
        subscription_id: i64,
        meter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PortResult<f64> {
        let sum: Option<f64> = sqlx::query_scalar(
            "SELECT SUM(value) FROM usage_events \
             WHERE tenant_id = $1 AND subscription_id = $2 AND meter_id = $3 AND status = 'enriched' \
               AND recorded_at >= $4 AND recorded_at < $5",
        )
        .bind(tenant_id)
        .bind(subscription_id)
        .bind(meter_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(sum.unwrap_or(0.0))
    }

    async fn save(&self, event: &UsageEvent) -> PortResult<()> {
        sqlx::query(
            "UPDATE usage_events SET meter_id = $2, subscription_id = $3, subscription_item_id = $4, status = $5, \
               snapshot_at = $6, attempt_count = $7, next_attempt_at = $8, claimed_at = NULL \
             WHERE id = $1",
        )
        .bind(event.id)
        .bind(event.meter_id)
        .bind(event.subscription_id)
        .bind(event.subscription_item_id)
        .bind(usage_event_status_to_str(event.status))
        .bind(event.snapshot_at)
        .bind(event.attempt_count)
        .bind(event.next_attempt_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_idempotent(&self, event: UsageEvent) -> PortResult<UsageEvent> {
        let inserted = sqlx::query(
            "INSERT INTO usage_events \
               (id, tenant_id, customer_id, meter_code, meter_id, subscription_id, subscription_item_id, value, recorded_at, \
                idempotency_key, status, snapshot_at, attempt_count, next_attempt_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (tenant_id, idempotency_key) WHERE idempotency_key IS NOT NULL DO NOTHING",
        )
        .bind(event.id)
        .bind(event.tenant_id)
        .bind(event.customer_id)
        .bind(&event.meter_code)
        .bind(event.meter_id)
        .bind(event.subscription_id)
        .bind(event.subscription_item_id)
        .bind(event.value)
        .bind(event.recorded_at)
        .bind(&event.idempotency_key)
        .bind(usage_event_status_to_str(event.status))
        .bind(event.snapshot_at)
        .bind(event.attempt_count)
        .bind(event.next_attempt_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if inserted.rows_affected() > 0 {
            return Ok(event);
        }

        // Collision on (tenant, idempotency_key): return the row already on file.
        let Some(key) = event.idempotency_key.as_deref() else {
            return Ok(event);
        };
        let row = sqlx::query("SELECT * FROM usage_events WHERE tenant_id = $1 AND idempotency_key = $2")
            .bind(event.tenant_id)
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row_to_event(&row)
    }
}
