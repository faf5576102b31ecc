// [libs/infra/db/src/repositories/rating_result_repository.rs]
//! Postgres-backed `RatingResultRepository`. `replace_all` deletes a cycle's
//! prior rows and inserts the new set inside one `pool.begin()` transaction,
//! so a rating run that fails partway never leaves a mix of old and new
//! rows committed; each insert still carries `ON CONFLICT(checksum) DO
//! NOTHING` in case a re-run recomputes a row byte-for-byte identical to one
//! already seen.

use async_trait::async_trait;
use billing_domain_models::ports::{PortResult, RatingResultRepository};
use billing_domain_models::{BillingError, Currency, RatingResult};
use sqlx::{PgPool, Row};

use crate::mapping::{rating_source_from_str, rating_source_to_str};

pub struct PgRatingResultRepository {
    pool: PgPool,
}

impl PgRatingResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> BillingError {
    crate::errors::DbError::Query(e).into()
}

#[async_trait]
impl RatingResultRepository for PgRatingResultRepository {
    async fn replace_all(&self, billing_cycle_id: i64, results: &[RatingResult]) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM rating_results WHERE billing_cycle_id = $1")
            .bind(billing_cycle_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for result in results {
            sqlx::query(
                "INSERT INTO rating_results \
                   (id, billing_cycle_id, subscription_id, price_id, meter_id, feature_code, quantity, unit_price_cents, amount_cents, currency, period_start, period_end, source, checksum) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
                 ON CONFLICT (checksum) DO NOTHING",
            )
            .bind(result.id)
            .bind(result.billing_cycle_id)
            .bind(result.subscription_id)
            .bind(result.price_id)
            .bind(result.meter_id)
            .bind(&result.feature_code)
            .bind(result.quantity)
            .bind(result.unit_price_cents)
            .bind(result.amount_cents)
            .bind(result.currency.as_str())
            .bind(result.period_start)
            .bind(result.period_end)
            .bind(rating_source_to_str(result.source))
            .bind(&result.checksum)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list_for_cycle(&self, billing_cycle_id: i64) -> PortResult<Vec<RatingResult>> {
        let rows = sqlx::query("SELECT * FROM rating_results WHERE billing_cycle_id = $1")
            .bind(billing_cycle_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| {
                let currency: String = row.try_get("currency").map_err(db_err)?;
                Ok(RatingResult {
                    id: row.try_get("id").map_err(db_err)?,
                    billing_cycle_id: row.try_get("billing_cycle_id").map_err(db_err)?,
                    subscription_id: row.try_get("subscription_id").map_err(db_err)?,
                    price_id: row.try_get("price_id").map_err(db_err)?,
                    meter_id: row.try_get("meter_id").map_err(db_err)?,
                    feature_code: row.try_get("feature_code").map_err(db_err)?,
                    quantity: row.try_get("quantity").map_err(db_err)?,
                    unit_price_cents: row.try_get("unit_price_cents").map_err(db_err)?,
                    amount_cents: row.try_get("amount_cents").map_err(db_err)?,
                    currency: Currency::code(&currency),
                    period_start: row.try_get("period_start").map_err(db_err)?,
                    period_end: row.try_get("period_end").map_err(db_err)?,
                    source: rating_source_from_str(row.try_get("source").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
                    checksum: row.try_get("checksum").map_err(db_err)?,
                })
            })
            .collect()
    }
}
