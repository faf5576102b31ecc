// [libs/infra/db/src/repositories/subscription_repository.rs]
//! Postgres-backed `SubscriptionRepository`.

use async_trait::async_trait;
use billing_domain_models::ports::{PortResult, SubscriptionRepository};
use billing_domain_models::{BillingError, Subscription, SubscriptionEntitlement, SubscriptionItem};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::mapping::{
    billing_cycle_type_from_str, billing_cycle_type_to_str, billing_mode_from_str, feature_type_from_str, subscription_status_from_str,
    subscription_status_to_str,
};

pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Result<Subscription, BillingError> {
    Ok(Subscription {
        id: row.try_get("id").map_err(db_err)?,
        tenant_id: row.try_get("tenant_id").map_err(db_err)?,
        customer_id: row.try_get("customer_id").map_err(db_err)?,
        status: subscription_status_from_str(row.try_get("status").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
        start_at: row.try_get("start_at").map_err(db_err)?,
        ended_at: row.try_get("ended_at").map_err(db_err)?,
        canceled_at: row.try_get("canceled_at").map_err(db_err)?,
        billing_cycle_type: billing_cycle_type_from_str(row.try_get("billing_cycle_type").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
        plan_changed_at: row.try_get("plan_changed_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> BillingError {
    crate::errors::DbError::Query(e).into()
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find(&self, id: i64) -> PortResult<Option<Subscription>> {
        let row = sqlx::query("SELECT * FROM subscriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_subscription).transpose()
    }

    async fn find_active_for_customer_at(&self, tenant_id: i64, customer_id: i64, at: DateTime<Utc>) -> PortResult<Option<Subscription>> {
        let row = sqlx::query(
            "SELECT * FROM subscriptions \
             WHERE tenant_id = $1 AND customer_id = $2 AND start_at <= $3 \
               AND (ended_at IS NULL OR ended_at > $3) AND (canceled_at IS NULL OR canceled_at > $3) \
             ORDER BY start_at DESC LIMIT 1",
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(row_to_subscription).transpose()
    }

    async fn list_active(&self, tenant_id: i64) -> PortResult<Vec<Subscription>> {
        let rows = sqlx::query("SELECT * FROM subscriptions WHERE tenant_id = $1 AND status = 'active'")
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_subscription).collect()
    }

    async fn list_active_all(&self, limit: i64, after_id: i64) -> PortResult<Vec<Subscription>> {
        let rows = sqlx::query("SELECT * FROM subscriptions WHERE status = 'active' AND id > $1 ORDER BY id ASC LIMIT $2")
            .bind(after_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_subscription).collect()
    }

    async fn list_pending_cancellation(&self) -> PortResult<Vec<Subscription>> {
        let rows = sqlx::query("SELECT * FROM subscriptions WHERE status = 'canceled'")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_subscription).collect()
    }

    async fn items(&self, subscription_id: i64) -> PortResult<Vec<SubscriptionItem>> {
        let rows = sqlx::query("SELECT * FROM subscription_items WHERE subscription_id = $1")
            .bind(subscription_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| {
                Ok(SubscriptionItem {
                    id: row.try_get("id").map_err(db_err)?,
                    subscription_id: row.try_get("subscription_id").map_err(db_err)?,
                    price_id: row.try_get("price_id").map_err(db_err)?,
                    price_code: row.try_get("price_code").map_err(db_err)?,
                    meter_code: row.try_get("meter_code").map_err(db_err)?,
                    billing_mode: billing_mode_from_str(row.try_get("billing_mode").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
                    billing_threshold: row.try_get("billing_threshold").map_err(db_err)?,
                    meter_id: row.try_get("meter_id").map_err(db_err)?,
                    quantity: row.try_get("quantity").map_err(db_err)?,
                    effective_from: row.try_get("effective_from").map_err(db_err)?,
                    effective_to: row.try_get("effective_to").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn find_item_binding(&self, subscription_id: i64, meter_id: i64, at: DateTime<Utc>) -> PortResult<Option<SubscriptionItem>> {
        let row = sqlx::query(
            "SELECT * FROM subscription_items \
             WHERE subscription_id = $1 AND meter_id = $2 \
               AND (effective_from IS NULL OR effective_from <= $3) \
               AND (effective_to IS NULL OR effective_to > $3) \
             ORDER BY effective_from DESC NULLS LAST LIMIT 1",
        )
        .bind(subscription_id)
        .bind(meter_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(SubscriptionItem {
            id: row.try_get("id").map_err(db_err)?,
            subscription_id: row.try_get("subscription_id").map_err(db_err)?,
            price_id: row.try_get("price_id").map_err(db_err)?,
            price_code: row.try_get("price_code").map_err(db_err)?,
            meter_code: row.try_get("meter_code").map_err(db_err)?,
            billing_mode: billing_mode_from_str(row.try_get("billing_mode").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
            billing_threshold: row.try_get("billing_threshold").map_err(db_err)?,
            meter_id: row.try_get("meter_id").map_err(db_err)?,
            quantity: row.try_get("quantity").map_err(db_err)?,
            effective_from: row.try_get("effective_from").map_err(db_err)?,
            effective_to: row.try_get("effective_to").map_err(db_err)?,
        }))
    }

    async fn entitlements_effective_in(&self, subscription_id: i64, from: DateTime<Utc>, to: DateTime<Utc>) -> PortResult<Vec<SubscriptionEntitlement>> {
        let rows = sqlx::query(
            "SELECT * FROM subscription_entitlements \
             WHERE subscription_id = $1 AND effective_from < $3 AND (effective_to IS NULL OR effective_to > $2)",
        )
        .bind(subscription_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(|row| {
                Ok(SubscriptionEntitlement {
                    id: row.try_get("id").map_err(db_err)?,
                    subscription_id: row.try_get("subscription_id").map_err(db_err)?,
                    product_id: row.try_get("product_id").map_err(db_err)?,
                    feature_code: row.try_get("feature_code").map_err(db_err)?,
                    feature_type: feature_type_from_str(row.try_get("feature_type").map_err(db_err)?).map_err(crate::errors::DbError::into)?,
                    meter_id: row.try_get("meter_id").map_err(db_err)?,
                    effective_from: row.try_get("effective_from").map_err(db_err)?,
                    effective_to: row.try_get("effective_to").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn save(&self, subscription: &Subscription) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO subscriptions (id, tenant_id, customer_id, status, start_at, ended_at, canceled_at, billing_cycle_type, plan_changed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, ended_at = EXCLUDED.ended_at, \
               canceled_at = EXCLUDED.canceled_at, plan_changed_at = EXCLUDED.plan_changed_at",
        )
        .bind(subscription.id)
        .bind(subscription.tenant_id)
        .bind(subscription.customer_id)
        .bind(subscription_status_to_str(subscription.status))
        .bind(subscription.start_at)
        .bind(subscription.ended_at)
        .bind(subscription.canceled_at)
        .bind(billing_cycle_type_to_str(subscription.billing_cycle_type))
        .bind(subscription.plan_changed_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
