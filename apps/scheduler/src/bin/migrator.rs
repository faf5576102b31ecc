// [apps/scheduler/src/bin/migrator.rs]
//! Standalone migration runner, invoked separately from the scheduler
//! process (deploy step, local setup) so schema changes aren't gated on
//! the scheduler's own startup path.

use billing_shared_telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing("billing-migrator");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = billing_infra_db::connect(&database_url, 5).await?;

    tracing::info!("applying pending migrations");
    billing_infra_db::run_migrations(&pool).await?;
    tracing::info!("migrations applied");

    Ok(())
}
