// [libs/infra/db/src/errors.rs]
//! Infra-level error catalog. `DbError` maps onto `BillingError` at the
//! repository boundary; unique-violation (SQLSTATE 23505) is detected here
//! and translated by callers into idempotent success rather than surfaced
//! as a query failure.

use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("[DB_CONN] database connection failed: {0}")]
    Connection(String),

    #[error("[DB_CONFIG] missing or malformed configuration: {0}")]
    Configuration(String),

    #[error("[DB_QUERY] {0}")]
    Query(#[from] sqlx::Error),

    #[error("[DB_MAPPING] failed to map row to domain type: {0}")]
    Mapping(String),

    #[error("[DB_MIGRATE] {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// True when the underlying error is a Postgres unique-violation
    /// (SQLSTATE 23505). Callers use this to turn a duplicate insert into
    /// an idempotent success instead of propagating a query error.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Query(sqlx::Error::Database(db_err)) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
            _ => false,
        }
    }
}

impl From<DbError> for billing_domain_models::BillingError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::Query(sqlx::Error::PoolTimedOut) | DbError::Query(sqlx::Error::Io(_)) => {
                billing_domain_models::BillingError::Transient(err.to_string())
            }
            _ if err.is_unique_violation() => billing_domain_models::BillingError::Conflict,
            _ => billing_domain_models::BillingError::Transient(err.to_string()),
        }
    }
}
