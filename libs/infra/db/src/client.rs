// [libs/infra/db/src/client.rs]
//! Pool construction and migration runner.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};

use crate::errors::DbError;

#[instrument(skip(database_url))]
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, DbError> {
    if database_url.is_empty() {
        return Err(DbError::Configuration("DATABASE_URL is empty".into()));
    }
    info!(max_connections, "connecting to postgres");
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
