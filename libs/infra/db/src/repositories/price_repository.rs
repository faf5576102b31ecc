// [libs/infra/db/src/repositories/price_repository.rs]
//! Postgres-backed `PriceRepository` and `MeterRepository`.

use async_trait::async_trait;
use billing_domain_models::ports::{MeterRepository, PortResult, PriceRepository};
use billing_domain_models::{Aggregation, BillingError, Currency, Meter, PriceAmount};
use sqlx::{PgPool, Row};

pub struct PgPriceRepository {
    pool: PgPool,
}

impl PgPriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> BillingError {
    crate::errors::DbError::Query(e).into()
}

#[async_trait]
impl PriceRepository for PgPriceRepository {
    async fn amounts_for_price(&self, price_id: i64) -> PortResult<Vec<PriceAmount>> {
        let rows = sqlx::query("SELECT * FROM price_amounts WHERE price_id = $1")
            .bind(price_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| {
                let currency: String = row.try_get("currency").map_err(db_err)?;
                Ok(PriceAmount {
                    id: row.try_get("id").map_err(db_err)?,
                    price_id: row.try_get("price_id").map_err(db_err)?,
                    meter_id: row.try_get("meter_id").map_err(db_err)?,
                    currency: Currency::code(&currency),
                    unit_amount_cents: row.try_get("unit_amount_cents").map_err(db_err)?,
                    minimum_cents: row.try_get("minimum_cents").map_err(db_err)?,
                    maximum_cents: row.try_get("maximum_cents").map_err(db_err)?,
                    effective_from: row.try_get("effective_from").map_err(db_err)?,
                    effective_to: row.try_get("effective_to").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn product_id_for_price(&self, price_id: i64) -> PortResult<i64> {
        let product_id: i64 = sqlx::query_scalar("SELECT product_id FROM prices WHERE id = $1")
            .bind(price_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(product_id)
    }
}

pub struct PgMeterRepository {
    pool: PgPool,
}

impl PgMeterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeterRepository for PgMeterRepository {
    async fn find_by_code(&self, tenant_id: i64, code: &str) -> PortResult<Option<Meter>> {
        let row = sqlx::query("SELECT * FROM meters WHERE tenant_id = $1 AND code = $2")
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        let Some(row) = row else { return Ok(None) };
        let aggregation: String = row.try_get("aggregation").map_err(db_err)?;
        Ok(Some(Meter {
            id: row.try_get("id").map_err(db_err)?,
            tenant_id: row.try_get("tenant_id").map_err(db_err)?,
            code: row.try_get("code").map_err(db_err)?,
            aggregation: match aggregation.as_str() {
                "sum" => Aggregation::Sum,
                other => return Err(crate::errors::DbError::Mapping(format!("unknown aggregation: {other}")).into()),
            },
            unit: row.try_get("unit").map_err(db_err)?,
            archived: row.try_get("archived").map_err(db_err)?,
        }))
    }
}
