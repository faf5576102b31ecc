// [libs/shared/telemetry/src/metrics.rs]
//! Dependency-free job metrics: atomic counters/gauges rendered as Prometheus
//! text exposition for the scheduler's `/metrics` endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct JobCounters {
    success: AtomicU64,
    failure: AtomicU64,
    last_run_ms: AtomicI64,
}

/// Registry of per-job success/failure counts and last-run durations, plus a
/// set of named backlog gauges (e.g. usage events by status). Cheap to clone
/// via `Arc` at the call site; internally all mutation is lock-free except
/// for first-touch registration of a new job or gauge name.
#[derive(Debug, Default)]
pub struct JobMetrics {
    jobs: RwLock<HashMap<String, JobCounters>>,
    gauges: RwLock<HashMap<String, AtomicI64>>,
}

impl JobMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, job_name: &str, duration_ms: i64) {
        self.counters_for(job_name, |c| {
            c.success.fetch_add(1, Ordering::Relaxed);
            c.last_run_ms.store(duration_ms, Ordering::Relaxed);
        });
    }

    pub fn record_failure(&self, job_name: &str, duration_ms: i64) {
        self.counters_for(job_name, |c| {
            c.failure.fetch_add(1, Ordering::Relaxed);
            c.last_run_ms.store(duration_ms, Ordering::Relaxed);
        });
    }

    pub fn set_gauge(&self, name: &str, value: i64) {
        if let Some(g) = self.gauges.read().expect("gauges lock poisoned").get(name) {
            g.store(value, Ordering::Relaxed);
            return;
        }
        let mut gauges = self.gauges.write().expect("gauges lock poisoned");
        gauges
            .entry(name.to_string())
            .or_insert_with(|| AtomicI64::new(0))
            .store(value, Ordering::Relaxed);
    }

    fn counters_for(&self, job_name: &str, f: impl FnOnce(&JobCounters)) {
        if let Some(c) = self.jobs.read().expect("jobs lock poisoned").get(job_name) {
            f(c);
            return;
        }
        let mut jobs = self.jobs.write().expect("jobs lock poisoned");
        let counters = jobs.entry(job_name.to_string()).or_default();
        f(counters);
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP billing_job_runs_total Job completions by outcome.\n");
        out.push_str("# TYPE billing_job_runs_total counter\n");
        let jobs = self.jobs.read().expect("jobs lock poisoned");
        let mut job_names: Vec<&String> = jobs.keys().collect();
        job_names.sort();
        for name in &job_names {
            let c = &jobs[*name];
            out.push_str(&format!(
                "billing_job_runs_total{{job=\"{}\",outcome=\"success\"}} {}\n",
                name,
                c.success.load(Ordering::Relaxed)
            ));
            out.push_str(&format!(
                "billing_job_runs_total{{job=\"{}\",outcome=\"failure\"}} {}\n",
                name,
                c.failure.load(Ordering::Relaxed)
            ));
        }

        out.push_str("# HELP billing_job_last_run_duration_ms Duration of the most recent run.\n");
        out.push_str("# TYPE billing_job_last_run_duration_ms gauge\n");
        for name in &job_names {
            let c = &jobs[*name];
            out.push_str(&format!(
                "billing_job_last_run_duration_ms{{job=\"{}\"}} {}\n",
                name,
                c.last_run_ms.load(Ordering::Relaxed)
            ));
        }
        drop(jobs);

        out.push_str("# HELP billing_backlog Backlog size by named gauge.\n");
        out.push_str("# TYPE billing_backlog gauge\n");
        let gauges = self.gauges.read().expect("gauges lock poisoned");
        let mut gauge_names: Vec<&String> = gauges.keys().collect();
        gauge_names.sort();
        for name in gauge_names {
            out.push_str(&format!(
                "billing_backlog{{name=\"{}\"}} {}\n",
                name,
                gauges[name].load(Ordering::Relaxed)
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_success_and_failure_independently() {
        let m = JobMetrics::new();
        m.record_success("rating", 12);
        m.record_success("rating", 8);
        m.record_failure("rating", 3);
        let rendered = m.render();
        assert!(rendered.contains("outcome=\"success\"} 2"));
        assert!(rendered.contains("outcome=\"failure\"} 1"));
        assert!(rendered.contains("billing_job_last_run_duration_ms{job=\"rating\"} 3"));
    }

    #[test]
    fn gauges_reflect_latest_set_value() {
        let m = JobMetrics::new();
        m.set_gauge("usage_events_pending", 40);
        m.set_gauge("usage_events_pending", 12);
        let rendered = m.render();
        assert!(rendered.contains("billing_backlog{name=\"usage_events_pending\"} 12"));
    }

    #[test]
    fn unknown_jobs_render_no_series() {
        let m = JobMetrics::new();
        assert!(!m.render().contains("job="));
    }
}
