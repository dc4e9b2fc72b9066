//! Fanout - bounded-concurrency job distribution.
//!
//! A small building block for running one processing function over a batch
//! of jobs on a fixed number of concurrent workers, without hand-written
//! synchronization.
//!
//! # Core Concepts
//!
//! - **Job**: any `Send + 'static` value. A dispatch call takes an ordered
//!   sequence of jobs; a job has no identity beyond its position.
//!
//! - **Processor**: the [`JobProcessor`] trait maps one job to
//!   `Result<Output, Error>`. [`process_fn`] and [`process_async_fn`] adapt
//!   plain closures.
//!
//! - **Lanes**: each worker owns one bounded [`Lane`]; job *i* goes to lane
//!   `i mod N` regardless of its content.
//!
//! - **Collector**: [`WorkerPool::dispatch`] merges the success and failure
//!   streams of all workers and invokes the matching callback for each
//!   outcome, serially, on the calling task.
//!
//! - **Cancellation**: a [`CancelToken`] stops the collector early. Work in
//!   progress is never interrupted; lanes are closed and workers wind down
//!   on their own.
//!
//! # Feature Flags
//!
//! - `metrics` - Prometheus metrics support
//!
//! # Example
//!
//! ```ignore
//! use fanout::*;
//!
//! let mut succeeded = Vec::new();
//! let mut failed = Vec::new();
//! let mut pool = WorkerPool::new(
//!     PoolConfig::new(3),
//!     process_fn(|job: u32| if job > 4 { Err(format!("{job} too large")) } else { Ok(job) }),
//!     |value| succeeded.push(value),
//!     |err| failed.push(err),
//! );
//!
//! let summary = pool.dispatch(&CancelToken::new(), 1..=7).await?;
//! assert_eq!(summary.succeeded, 4);
//! ```

/// Cooperative cancellation.
///
/// The `cancel` module provides [`CancelToken`], the signal a caller fires
/// to stop a dispatch call early.
pub mod cancel;

/// Configuration for worker pools.
///
/// The `config` module defines [`PoolConfig`]: worker count, lane buffer
/// size, worker join timeout and naming.
pub mod config;

/// Errors that abort a dispatch call.
pub mod error;

#[cfg(feature = "metrics")]
/// Prometheus metrics, enabled by the `metrics` feature.
pub mod metrics;

/// Outcomes and dispatch reports.
///
/// The `outcome` module defines [`WorkOutcome`], [`DispatchId`] and the
/// [`DispatchSummary`] returned by every dispatch call.
pub mod outcome;

/// The unit of work applied to each job.
///
/// The `processor` module defines the [`JobProcessor`] trait and the
/// closure adapters [`process_fn`] and [`process_async_fn`].
pub mod processor;

/// Lanes, workers and the worker pool.
///
/// The `runtime` module provides:
/// - [`WorkerPool`] - dispatch and outcome collection
/// - [`Lane`] and [`LaneSet`] - per-worker queues with round-robin assignment
pub mod runtime;

/// Tracing spans and telemetry helpers.
pub mod telemetry;

pub use cancel::*;
pub use config::*;
pub use error::*;
pub use outcome::*;
pub use processor::*;
pub use runtime::{Assignment, Lane, LaneSet, WorkerPool};
