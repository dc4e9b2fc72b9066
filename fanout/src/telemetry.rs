//! Tracing and telemetry instrumentation for fanout.
//!
//! This module provides helper functions for creating tracing spans and recording
//! metrics during a dispatch call. All functions work both with and without
//! the `metrics` feature flag.
//!
//! # Features
//!
//! - Tracing spans for the dispatch call, each worker, and the collector
//! - Integration with the `metrics` module for Prometheus metrics
//! - Helper functions that only log when the feature is disabled
//!
//! # Example
//!
//! ```ignore
//! use fanout::telemetry::{instrument_worker, record_job_start, record_job_end};
//!
//! let timing = record_job_start("fanout-w0");
//! // ... process the job
//! record_job_end(timing, OutcomeStatus::Success);
//! ```

use std::future::Future;
use tracing::{info_span, Instrument, Span};

use crate::outcome::{DispatchId, DispatchSummary, OutcomeStatus};

/// Create a tracing span covering one dispatch call.
#[must_use]
pub fn dispatch_span(dispatch_id: DispatchId, job_count: usize, worker_count: usize) -> Span {
    info_span!(
        "fanout.dispatch",
        dispatch_id = %dispatch_id,
        job_count = job_count,
        worker_count = worker_count,
    )
}

/// Create a tracing span for one worker task.
///
/// # Arguments
/// * `worker_id` - The worker identifier
/// * `dispatch_id` - The dispatch call the worker belongs to
#[must_use]
pub fn worker_span(worker_id: impl AsRef<str>, dispatch_id: DispatchId) -> Span {
    info_span!(
        "fanout.worker",
        worker_id = %worker_id.as_ref(),
        dispatch_id = %dispatch_id,
    )
}

/// Create a tracing span for the merge loop.
#[must_use]
pub fn collect_span(dispatch_id: DispatchId, expected: usize) -> Span {
    info_span!(
        "fanout.collect",
        dispatch_id = %dispatch_id,
        expected = expected,
    )
}

/// Instrument a future with a worker span.
pub fn instrument_worker<F>(
    worker_id: impl AsRef<str>,
    dispatch_id: DispatchId,
    future: F,
) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let span = worker_span(worker_id, dispatch_id);
    future.instrument(span)
}

/// Record jobs placed into lanes.
pub fn record_jobs_dispatched(count: usize) {
    tracing::debug!(count = count, "jobs assigned to lanes");

    #[cfg(feature = "metrics")]
    crate::metrics::record_jobs_dispatched(count as u64);
}

/// Record one job outcome produced by a worker.
pub fn record_job_outcome(worker_id: impl AsRef<str>, status: OutcomeStatus) {
    tracing::trace!(
        worker_id = %worker_id.as_ref(),
        status = %status,
        "job processed"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_outcome(status.as_str());
}

/// Record a job whose processor panicked. The worker carries on with its
/// lane.
pub fn record_job_panicked(worker_id: impl AsRef<str>, message: &str) {
    tracing::warn!(
        worker_id = %worker_id.as_ref(),
        panic = message,
        "processor panicked, job dropped"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_outcome("panicked");
}

/// Record a worker task starting.
pub fn record_worker_started(worker_id: impl AsRef<str>) {
    tracing::debug!(worker_id = %worker_id.as_ref(), "worker started");

    #[cfg(feature = "metrics")]
    crate::metrics::ACTIVE_WORKERS.inc();
}

/// Record a worker task stopping.
///
/// # Arguments
/// * `worker_id` - The worker identifier
/// * `processed` - Jobs the worker processed before stopping
pub fn record_worker_stopped(worker_id: impl AsRef<str>, processed: u64) {
    tracing::debug!(
        worker_id = %worker_id.as_ref(),
        processed = processed,
        "worker stopped"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::ACTIVE_WORKERS.dec();
}

/// Record the end of a dispatch call.
pub fn record_dispatch_finished(summary: &DispatchSummary) {
    let elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds();
    tracing::info!(
        dispatch_id = %summary.dispatch_id,
        submitted = summary.submitted,
        dispatched = summary.dispatched,
        succeeded = summary.succeeded,
        failed = summary.failed,
        panicked = summary.panicked,
        cancelled = summary.cancelled,
        elapsed_ms = elapsed_ms,
        "dispatch finished"
    );

    #[cfg(feature = "metrics")]
    if summary.cancelled {
        crate::metrics::record_dispatch_cancelled();
    }
}

/// Observe the duration of a single job.
pub fn observe_job_duration(status: OutcomeStatus, duration_secs: f64) {
    tracing::trace!(
        status = %status,
        duration_secs = duration_secs,
        "job duration observed"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::observe_job_duration(status.as_str(), duration_secs);
}

/// Record the start of job execution for duration tracking.
///
/// Returns an opaque handle that should be passed to `record_job_end`.
pub fn record_job_start(worker_id: impl AsRef<str>) -> JobTimingHandle {
    JobTimingHandle {
        worker_id: worker_id.as_ref().to_string(),
        start: std::time::Instant::now(),
    }
}

/// Record the end of job execution and update duration metrics.
pub fn record_job_end(handle: JobTimingHandle, status: OutcomeStatus) {
    observe_job_duration(status, handle.elapsed().as_secs_f64());
}

/// Handle for tracking job execution duration.
///
/// This is an opaque type returned by `record_job_start` and consumed by `record_job_end`.
#[derive(Debug)]
pub struct JobTimingHandle {
    worker_id: String,
    start: std::time::Instant,
}

impl JobTimingHandle {
    /// Get the worker that is timing the job.
    #[must_use]
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Get the elapsed time since the job started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
