// [apps/scheduler/src/main.rs]
//! Process entry point: loads configuration, connects to Postgres, wires
//! the job catalog onto one `AppContext`, and runs the ticker fleet until
//! a termination signal arrives.

use std::sync::Arc;

use billing_scheduler::config::SchedulerConfig;
use billing_scheduler::context::AppContext;
use billing_scheduler::{health, jobs, runner};
use billing_shared_telemetry::init_tracing;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Arc::new(SchedulerConfig::load());
    init_tracing("billing-scheduler");

    tracing::info!(
        run_interval_secs = cfg.run_interval_secs,
        batch_size = cfg.batch_size,
        health_port = cfg.health_port,
        "starting billing scheduler"
    );

    let pool = billing_infra_db::connect(&cfg.database_url, cfg.database_max_connections).await?;
    billing_infra_db::run_migrations(&pool).await?;

    let instance_id = std::env::var("HOSTNAME").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());
    let node_id: u16 = std::env::var("SCHEDULER_NODE_ID").ok().and_then(|v| v.parse().ok()).unwrap_or(1);
    let ctx = AppContext::new(pool, node_id, instance_id);

    let enabled_jobs: Vec<_> = jobs::catalog(&ctx, cfg.max_attempts)
        .into_iter()
        .filter(|job| cfg.is_job_enabled(job.name()))
        .collect();

    tracing::info!(jobs = ?enabled_jobs.iter().map(|j| j.name()).collect::<Vec<_>>(), "job catalog assembled");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = runner::spawn_all(enabled_jobs, cfg.clone(), ctx.metrics.clone(), shutdown_rx);

    let health_listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.health_port)).await?;
    let health_router = health::router(ctx.metrics.clone());
    let health_server = tokio::spawn(async move {
        if let Err(err) = axum::serve(health_listener, health_router).await {
            tracing::error!(error = %err, "health server terminated unexpectedly");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, draining job loops");
    let _ = shutdown_tx.send(true);

    runner::drain(handles, cfg.drain_timeout()).await;
    health_server.abort();

    tracing::info!("billing scheduler shut down cleanly");
    Ok(())
}
