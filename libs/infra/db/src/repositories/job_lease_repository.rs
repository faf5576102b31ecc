// [libs/infra/db/src/repositories/job_lease_repository.rs]
//! Postgres-backed `JobLeaseRepository`: TTL + heartbeat mutual exclusion
//! for singleton jobs.

use async_trait::async_trait;
use billing_domain_models::ports::{JobLeaseRepository, PortResult};
use billing_domain_models::{BillingError, JobLease};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PgJobLeaseRepository {
    pool: PgPool,
}

impl PgJobLeaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> BillingError {
    crate::errors::DbError::Query(e).into()
}

#[async_trait]
impl JobLeaseRepository for PgJobLeaseRepository {
    async fn try_acquire(&self, job_name: &str, instance_id: &str, now: DateTime<Utc>, ttl: chrono::Duration) -> PortResult<Option<JobLease>> {
        let expires_at = now + ttl;
        let claimed = sqlx::query(
            "INSERT INTO job_leases (job_name, instance_id, acquired_at, heartbeat_at, expires_at) \
             VALUES ($1, $2, $3, $3, $4) \
             ON CONFLICT (job_name) DO UPDATE SET instance_id = EXCLUDED.instance_id, acquired_at = EXCLUDED.acquired_at, \
               heartbeat_at = EXCLUDED.heartbeat_at, expires_at = EXCLUDED.expires_at \
             WHERE job_leases.expires_at <= $3",
        )
        .bind(job_name)
        .bind(instance_id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if claimed.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(JobLease {
            job_name: job_name.to_string(),
            instance_id: instance_id.to_string(),
            acquired_at: now,
            heartbeat_at: now,
            expires_at,
        }))
    }

    async fn renew(&self, lease: &JobLease) -> PortResult<()> {
        let renewed = sqlx::query(
            "UPDATE job_leases SET heartbeat_at = $3, expires_at = $4 \
             WHERE job_name = $1 AND instance_id = $2",
        )
        .bind(&lease.job_name)
        .bind(&lease.instance_id)
        .bind(lease.heartbeat_at)
        .bind(lease.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if renewed.rows_affected() == 0 {
            return Err(BillingError::LeaseLost(lease.job_name.clone()));
        }
        Ok(())
    }

    async fn release(&self, job_name: &str, instance_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM job_leases WHERE job_name = $1 AND instance_id = $2")
            .bind(job_name)
            .bind(instance_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
