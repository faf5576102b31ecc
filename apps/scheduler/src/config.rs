// [apps/scheduler/src/config.rs]
//! Process configuration, loaded once at startup from environment variables
//! (optionally via a `.env` file in debug builds). No dynamic reload: this is
//! a batch/worker process, restarted to pick up new configuration.

use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "billing-scheduler", about = "Billing Job Scheduler")]
pub struct SchedulerConfig {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Comma-separated job names this process runs; empty means all jobs.
    #[arg(long, env = "ENABLED_JOBS", default_value = "")]
    pub enabled_jobs: String,

    /// Ticker period for each job loop, in seconds.
    #[arg(long, env = "SCHEDULER_RUN_INTERVAL", default_value_t = 60)]
    pub run_interval_secs: u64,

    /// Rows claimed per job iteration.
    #[arg(long, env = "SCHEDULER_BATCH_SIZE", default_value_t = 50)]
    pub batch_size: i64,

    /// Max wait for in-flight batches to finish at shutdown, in seconds.
    #[arg(long, env = "DRAIN_TIMEOUT", default_value_t = 30)]
    pub drain_timeout_secs: u64,

    /// Max wall-clock time a single job run is allowed, in seconds.
    #[arg(long, env = "RUN_TIMEOUT", default_value_t = 5)]
    pub run_timeout_secs: u64,

    /// Max wall-clock time a single row mutation is allowed, in milliseconds.
    #[arg(long, env = "ROW_TIMEOUT", default_value_t = 300)]
    pub row_timeout_ms: u64,

    /// Attempts before a work item is parked dead for `recovery_sweep`.
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = 8)]
    pub max_attempts: i32,

    /// Port the `/healthz` and `/metrics` HTTP endpoints listen on.
    #[arg(long, env = "HEALTH_PORT", default_value_t = 8080)]
    pub health_port: u16,

    /// Max connections in the Postgres pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub database_max_connections: u32,
}

impl SchedulerConfig {
    pub fn load() -> Self {
        if cfg!(debug_assertions) {
            let _ = dotenvy::dotenv();
        }
        SchedulerConfig::parse()
    }

    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn row_timeout(&self) -> Duration {
        Duration::from_millis(self.row_timeout_ms)
    }

    /// Returns `true` when `job_name` should run in this process.
    pub fn is_job_enabled(&self, job_name: &str) -> bool {
        if self.enabled_jobs.trim().is_empty() {
            return true;
        }
        self.enabled_jobs.split(',').map(str::trim).any(|j| j == job_name)
    }
}
