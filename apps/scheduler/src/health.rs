// [apps/scheduler/src/health.rs]
//! Minimal HTTP surface for orchestration probes: `/healthz` for liveness,
//! `/metrics` rendering the job metrics registry in Prometheus text
//! exposition format. No business routes live here; this process has no
//! public API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use billing_shared_telemetry::JobMetrics;

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

async fn metrics(State(metrics): State<Arc<JobMetrics>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        metrics.render(),
    )
}

pub fn router(job_metrics: Arc<JobMetrics>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(job_metrics)
}
