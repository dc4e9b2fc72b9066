//! Prometheus metrics instrumentation for fanout.
//!
//! All metrics are conditionally compiled behind the `metrics` feature flag.
//!
//! # Metrics
//!
//! ## Counters
//! - `fanout_jobs_dispatched_total` - Jobs placed into worker lanes
//! - `fanout_outcomes_total` - Job outcomes produced by workers, by status
//!   (`success`, `failure`, `panicked`)
//! - `fanout_dispatch_cancelled_total` - Dispatch calls stopped by cancellation
//!
//! ## Gauges
//! - `fanout_active_workers` - Worker tasks currently running
//!
//! ## Histograms
//! - `fanout_job_duration_seconds` - Processing time of a single job
#![cfg(feature = "metrics")]

use prometheus::{exponential_buckets, Counter, CounterVec, Gauge, HistogramVec, Opts, Registry};
use std::sync::LazyLock;

/// Global Prometheus registry for fanout metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Counter for jobs placed into lanes.
pub static JOBS_DISPATCHED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    Counter::new(
        "fanout_jobs_dispatched_total",
        "Total number of jobs placed into worker lanes",
    )
    .expect("fanout_jobs_dispatched_total metric creation failed")
});

/// Counter for job outcomes.
///
/// Labels:
/// - `status`: success, failure or panicked
pub static OUTCOMES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new("fanout_outcomes_total", "Total number of job outcomes");
    CounterVec::new(opts, &["status"]).expect("fanout_outcomes_total metric creation failed")
});

/// Counter for dispatch calls stopped by cancellation.
pub static DISPATCH_CANCELLED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    Counter::new(
        "fanout_dispatch_cancelled_total",
        "Total number of dispatch calls stopped by cancellation",
    )
    .expect("fanout_dispatch_cancelled_total metric creation failed")
});

/// Gauge for running worker tasks.
pub static ACTIVE_WORKERS: LazyLock<Gauge> = LazyLock::new(|| {
    Gauge::new("fanout_active_workers", "Worker tasks currently running")
        .expect("fanout_active_workers metric creation failed")
});

/// Histogram for job processing duration in seconds.
///
/// Labels:
/// - `status`: success or failure
pub static JOB_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let buckets = exponential_buckets(0.0005, 2.0, 16).expect("bucket creation failed");
    let opts = prometheus::HistogramOpts::new(
        "fanout_job_duration_seconds",
        "Job processing duration in seconds",
    )
    .buckets(buckets);
    HistogramVec::new(opts, &["status"]).expect("fanout_job_duration_seconds metric creation failed")
});

/// Register all metrics with the global registry.
///
/// Calling it more than once is safe.
pub fn init_metrics() -> anyhow::Result<()> {
    let registry = &*REGISTRY;

    for metric in [
        Box::new(JOBS_DISPATCHED_TOTAL.clone()) as Box<dyn prometheus::core::Collector>,
        Box::new(OUTCOMES_TOTAL.clone()),
        Box::new(DISPATCH_CANCELLED_TOTAL.clone()),
        Box::new(ACTIVE_WORKERS.clone()),
        Box::new(JOB_DURATION_SECONDS.clone()),
    ] {
        if let Err(e) = registry.register(metric) {
            if !matches!(e, prometheus::Error::AlreadyReg) {
                return Err(e.into());
            }
        }
    }

    Ok(())
}

pub fn record_jobs_dispatched(count: u64) {
    JOBS_DISPATCHED_TOTAL.inc_by(count as f64);
}

pub fn record_outcome(status: &str) {
    OUTCOMES_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_dispatch_cancelled() {
    DISPATCH_CANCELLED_TOTAL.inc();
}

pub fn observe_job_duration(status: &str, duration_secs: f64) {
    JOB_DURATION_SECONDS
        .with_label_values(&[status])
        .observe(duration_secs);
}

/// Gather all registered metrics in Prometheus text format.
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        init_metrics().expect("metrics initialization should succeed");
        init_metrics().expect("second initialization should be a no-op");
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().expect("metrics initialization should succeed");

        record_jobs_dispatched(3);
        record_outcome("success");
        record_outcome("failure");
        record_outcome("panicked");
        observe_job_duration("success", 0.01);

        let output = gather_metrics().expect("gather should succeed");
        assert!(output.contains("fanout_jobs_dispatched_total"));
        assert!(output.contains("fanout_outcomes_total"));
        assert!(output.contains("status=\"panicked\""));
    }
}
