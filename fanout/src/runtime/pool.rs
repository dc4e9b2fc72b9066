use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::cancel::CancelToken;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::outcome::{DispatchId, DispatchSummary};
use crate::processor::JobProcessor;
use crate::telemetry;

use super::lane::LaneSet;
use super::worker::Worker;

/// Fans jobs out to a fixed number of workers and merges their outcomes
/// back onto the calling task.
///
/// The pool holds the configuration, the processor and both callbacks;
/// it keeps no workers between calls. Every [`dispatch`](Self::dispatch)
/// opens fresh lanes, starts fresh workers and tears them down before it
/// returns.
///
/// Callbacks run one at a time on the task that awaits `dispatch`, so
/// they may mutate captured state freely and do not need to be `Send`.
/// They should return quickly: while a callback runs, no other outcome is
/// collected.
///
/// # Example
///
/// ```ignore
/// use fanout::*;
///
/// let mut succeeded = 0;
/// let mut failed = 0;
/// let mut pool = WorkerPool::new(
///     PoolConfig::new(3),
///     process_fn(|job: u32| if job > 4 { Err("too large") } else { Ok(job) }),
///     |_value| succeeded += 1,
///     |_err| failed += 1,
/// );
/// pool.dispatch(&CancelToken::new(), 1..=7).await?;
/// ```
pub struct WorkerPool<J, P, S, F>
where
    J: Send + 'static,
    P: JobProcessor<J>,
    S: FnMut(P::Output),
    F: FnMut(P::Error),
{
    config: PoolConfig,
    processor: Arc<P>,
    on_success: S,
    on_failure: F,
    _job: PhantomData<fn(J)>,
}

impl<J, P, S, F> fmt::Debug for WorkerPool<J, P, S, F>
where
    J: Send + 'static,
    P: JobProcessor<J>,
    S: FnMut(P::Output),
    F: FnMut(P::Error),
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("job_type", &type_name::<J>())
            .field("processor_type", &type_name::<P>())
            .finish()
    }
}

impl<J, P, S, F> WorkerPool<J, P, S, F>
where
    J: Send + 'static,
    P: JobProcessor<J>,
    S: FnMut(P::Output),
    F: FnMut(P::Error),
{
    /// Create a pool. Nothing is validated until the first dispatch.
    pub fn new(config: PoolConfig, processor: P, on_success: S, on_failure: F) -> Self {
        Self::with_shared_processor(config, Arc::new(processor), on_success, on_failure)
    }

    /// Create a pool around a processor that is shared with other owners.
    pub fn with_shared_processor(
        config: PoolConfig,
        processor: Arc<P>,
        on_success: S,
        on_failure: F,
    ) -> Self {
        Self {
            config,
            processor,
            on_success,
            on_failure,
            _job: PhantomData,
        }
    }

    /// Get the pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Get a clone of the processor.
    pub fn processor(&self) -> Arc<P> {
        Arc::clone(&self.processor)
    }

    /// Process every job and deliver each outcome to the matching callback.
    ///
    /// Returns once every dispatched job has been reported, or as soon as
    /// `cancel` is observed. Stopping early is not an error; compare
    /// [`DispatchSummary::observed`] with [`DispatchSummary::submitted`]
    /// to detect it. Per-job failures never fail the call, and a job whose
    /// processor panics is counted in [`DispatchSummary::panicked`]
    /// without reaching either callback.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Configuration`] if the pool has no workers. No
    /// worker is started and no callback runs in that case.
    pub async fn dispatch<I>(&mut self, cancel: &CancelToken, jobs: I) -> PoolResult<DispatchSummary>
    where
        I: IntoIterator<Item = J>,
    {
        self.config.validate()?;
        let jobs: Vec<J> = jobs.into_iter().collect();
        self.run(cancel, jobs).await
    }

    /// Dispatch jobs decoded from a JSON array.
    ///
    /// Every element is decoded before any worker starts.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidInput`] if `jobs` is not an array,
    /// [`PoolError::JobDecode`] if an element does not decode into `J`, and
    /// [`PoolError::Configuration`] if the pool has no workers.
    pub async fn dispatch_json(
        &mut self,
        cancel: &CancelToken,
        jobs: serde_json::Value,
    ) -> PoolResult<DispatchSummary>
    where
        J: DeserializeOwned,
    {
        let serde_json::Value::Array(items) = jobs else {
            return Err(PoolError::InvalidInput);
        };
        let jobs = items
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                serde_json::from_value(item).map_err(|source| PoolError::JobDecode { position, source })
            })
            .collect::<PoolResult<Vec<J>>>()?;

        self.config.validate()?;
        self.run(cancel, jobs).await
    }

    async fn run(&mut self, cancel: &CancelToken, jobs: Vec<J>) -> PoolResult<DispatchSummary> {
        let dispatch_id = DispatchId::new();
        let summary = DispatchSummary::begin(dispatch_id, jobs.len());

        if jobs.is_empty() {
            tracing::debug!(dispatch_id = %dispatch_id, "no jobs to dispatch");
            return Ok(summary.finish());
        }

        let span = telemetry::dispatch_span(dispatch_id, jobs.len(), self.config.worker_count);
        let summary = self.fan_out(cancel, jobs, summary).instrument(span).await;
        telemetry::record_dispatch_finished(&summary);
        Ok(summary)
    }

    async fn fan_out(
        &mut self,
        cancel: &CancelToken,
        jobs: Vec<J>,
        mut summary: DispatchSummary,
    ) -> DispatchSummary {
        let dispatch_id = summary.dispatch_id;
        let worker_count = self.config.worker_count;
        let lane_capacity = self.config.lane_capacity_for(jobs.len());

        tracing::info!(
            jobs = jobs.len(),
            workers = worker_count,
            lane_capacity,
            "dispatch started"
        );

        // Outcome channels hold every job's result so workers never wait on
        // the collector and lanes always drain.
        let (success_tx, mut successes) = mpsc::channel(jobs.len());
        let (failure_tx, mut failures) = mpsc::channel(jobs.len());
        let (panic_tx, mut panics) = mpsc::channel(jobs.len());

        let (lanes, receivers) = LaneSet::open(worker_count, lane_capacity);
        let mut handles = Vec::with_capacity(worker_count);
        for (index, lane) in receivers.into_iter().enumerate() {
            let worker_id = format!("{}-w{}", self.config.worker_prefix, index);
            let worker = Worker::new(
                worker_id.clone(),
                lane,
                Arc::clone(&self.processor),
                success_tx.clone(),
                failure_tx.clone(),
                panic_tx.clone(),
            );
            handles.push(tokio::spawn(telemetry::instrument_worker(
                worker_id,
                dispatch_id,
                worker.run(),
            )));
        }
        // Only workers may hold senders, so every outcome channel closes once
        // all workers have exited.
        drop(success_tx);
        drop(failure_tx);
        drop(panic_tx);

        let assignment = lanes.assign(jobs, cancel).await;
        summary.dispatched = assignment.placed;
        summary.cancelled = assignment.cancelled;
        telemetry::record_jobs_dispatched(summary.dispatched);

        let collect_span = telemetry::collect_span(dispatch_id, summary.dispatched);
        let mut outcomes = OutcomeStreams {
            successes: &mut successes,
            failures: &mut failures,
            panics: &mut panics,
        };
        self.collect(cancel, &mut summary, &mut outcomes)
            .instrument(collect_span)
            .await;

        lanes.close_all();
        drop(successes);
        drop(failures);
        drop(panics);

        if let Some(ms) = self.config.join_timeout_ms {
            join_workers(handles, Duration::from_millis(ms)).await;
        }

        summary.finish()
    }

    /// Merge loop: runs until every dispatched job has settled or
    /// cancellation is observed.
    async fn collect(
        &mut self,
        cancel: &CancelToken,
        summary: &mut DispatchSummary,
        outcomes: &mut OutcomeStreams<'_, P::Output, P::Error>,
    ) {
        let expected = summary.dispatched;
        let mut successes_open = true;
        let mut failures_open = true;
        let mut panics_open = true;

        while summary.settled() < expected {
            // A callback may have fired the signal; honor it before the next one.
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            if !successes_open && !failures_open && !panics_open {
                tracing::warn!(
                    settled = summary.settled(),
                    expected,
                    "workers exited before all outcomes were delivered"
                );
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                received = outcomes.successes.recv(), if successes_open => match received {
                    Some(value) => {
                        (self.on_success)(value);
                        summary.succeeded += 1;
                    }
                    None => successes_open = false,
                },
                received = outcomes.failures.recv(), if failures_open => match received {
                    Some(err) => {
                        (self.on_failure)(err);
                        summary.failed += 1;
                    }
                    None => failures_open = false,
                },
                received = outcomes.panics.recv(), if panics_open => match received {
                    Some(()) => summary.panicked += 1,
                    None => panics_open = false,
                },
            }
        }
    }
}

/// Receiving ends of the channels workers report on.
struct OutcomeStreams<'a, R, E> {
    successes: &'a mut mpsc::Receiver<R>,
    failures: &'a mut mpsc::Receiver<E>,
    panics: &'a mut mpsc::Receiver<()>,
}

async fn join_workers(handles: Vec<JoinHandle<u64>>, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    for handle in handles {
        match tokio::time::timeout_at(deadline, handle).await {
            Ok(Ok(_processed)) => {}
            Ok(Err(e)) => tracing::warn!("Worker task failed: {:?}", e),
            Err(_) => tracing::warn!("Worker task timed out during shutdown"),
        }
    }
}
