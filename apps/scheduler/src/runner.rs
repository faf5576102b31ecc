// [apps/scheduler/src/runner.rs]
//! Drives one ticker loop per enabled job, all independent and sharing
//! only the `AppContext` and job metrics registry. A watch channel signals
//! shutdown; each loop finishes its current `run_once` (bounded by
//! `run_timeout`) before observing the signal, and the whole fleet is
//! given `drain_timeout` to wind down before the process exits anyway.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::time::{interval, timeout};

use crate::config::SchedulerConfig;
use crate::jobs::Job;
use billing_shared_telemetry::JobMetrics;

pub struct JobHandle {
    pub name: &'static str,
    task: tokio::task::JoinHandle<()>,
}

/// Spawns one ticker task per job in `jobs`, returning a handle per task.
/// `jobs` should already be filtered to the enabled set.
pub fn spawn_all(
    jobs: Vec<Box<dyn Job>>,
    cfg: Arc<SchedulerConfig>,
    metrics: Arc<JobMetrics>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JobHandle> {
    jobs.into_iter()
        .map(|job| {
            let name = job.name();
            let cfg = cfg.clone();
            let metrics = metrics.clone();
            let mut shutdown = shutdown.clone();
            let task = tokio::spawn(async move {
                let mut ticker = interval(cfg.run_interval());
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            run_tick(job.as_ref(), &cfg, &metrics).await;
                        }
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                tracing::info!(job = name, "shutdown observed, loop exiting");
                                break;
                            }
                        }
                    }
                }
            });
            JobHandle { name, task }
        })
        .collect()
}

async fn run_tick(job: &dyn Job, cfg: &SchedulerConfig, metrics: &JobMetrics) {
    let name = job.name();
    let started = Instant::now();

    let outcome = timeout(cfg.run_timeout(), job.run_once(cfg.batch_size)).await;
    let elapsed_ms = started.elapsed().as_millis() as i64;

    match outcome {
        Ok(Ok(stats)) => {
            metrics.record_success(name, elapsed_ms);
            tracing::debug!(job = name, processed = stats.processed, elapsed_ms, "job tick completed");
        }
        Ok(Err(err)) => {
            metrics.record_failure(name, elapsed_ms);
            tracing::error!(job = name, error = %err, elapsed_ms, "job tick failed");
        }
        Err(_) => {
            metrics.record_failure(name, elapsed_ms);
            tracing::error!(job = name, elapsed_ms, "job tick exceeded run_timeout");
        }
    }
}

/// Waits for every task to finish, up to `drain_timeout`. Tasks still
/// running past the deadline are abandoned; the process exits regardless.
pub async fn drain(handles: Vec<JobHandle>, drain_timeout: std::time::Duration) {
    let names: Vec<&'static str> = handles.iter().map(|h| h.name).collect();
    let joins = futures::future::join_all(handles.into_iter().map(|h| h.task));

    match timeout(drain_timeout, joins).await {
        Ok(_) => tracing::info!("all job loops drained cleanly"),
        Err(_) => tracing::warn!(jobs = ?names, "drain timeout elapsed, exiting with loops still in flight"),
    }
}
