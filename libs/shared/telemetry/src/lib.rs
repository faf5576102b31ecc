// [libs/shared/telemetry/src/lib.rs]
//! Structured logging init and a minimal in-process job metrics registry.

pub mod metrics;

use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber. Compact formatting in debug
/// builds, single-line JSON in release, both driven by `RUST_LOG` (falling
/// back to `info` when unset).
pub fn init_tracing(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if cfg!(debug_assertions) {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .compact()
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .flatten_event(true)
            .with_target(false)
            .init();
    }

    tracing::info!(service = service_name, "telemetry initialized");
}

pub use metrics::JobMetrics;
