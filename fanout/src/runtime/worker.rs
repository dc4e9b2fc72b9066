use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::outcome::WorkOutcome;
use crate::processor::JobProcessor;
use crate::telemetry;

/// One worker of a dispatch call.
///
/// Drains its lane until the lane is closed and empty, routing every
/// outcome to the success or failure channel. A job whose processor panics
/// is reported on the panic channel and the worker moves on to the next
/// job. Lane closure is the only stop signal; the worker also stops if the
/// collector has dropped the outcome channels.
pub(crate) struct Worker<J, P>
where
    J: Send + 'static,
    P: JobProcessor<J>,
{
    worker_id: String,
    lane: mpsc::Receiver<J>,
    processor: Arc<P>,
    successes: mpsc::Sender<P::Output>,
    failures: mpsc::Sender<P::Error>,
    panics: mpsc::Sender<()>,
}

impl<J, P> Worker<J, P>
where
    J: Send + 'static,
    P: JobProcessor<J>,
{
    pub(crate) fn new(
        worker_id: String,
        lane: mpsc::Receiver<J>,
        processor: Arc<P>,
        successes: mpsc::Sender<P::Output>,
        failures: mpsc::Sender<P::Error>,
        panics: mpsc::Sender<()>,
    ) -> Self {
        Self {
            worker_id,
            lane,
            processor,
            successes,
            failures,
            panics,
        }
    }

    /// Run until the lane is closed and drained. Returns the number of jobs
    /// processed.
    pub(crate) async fn run(mut self) -> u64 {
        let mut activity = WorkerActivity::start(&self.worker_id);

        while let Some(job) = self.lane.recv().await {
            let timing = telemetry::record_job_start(&self.worker_id);
            let result = AssertUnwindSafe(self.processor.process(job))
                .catch_unwind()
                .await;
            activity.processed += 1;

            let delivered = match result {
                Ok(result) => {
                    let outcome = WorkOutcome::from(result);
                    let status = outcome.status();
                    telemetry::record_job_end(timing, status);
                    telemetry::record_job_outcome(&self.worker_id, status);
                    match outcome {
                        WorkOutcome::Success(value) => self.successes.send(value).await.is_ok(),
                        WorkOutcome::Failure(err) => self.failures.send(err).await.is_ok(),
                    }
                }
                Err(payload) => {
                    telemetry::record_job_panicked(&self.worker_id, panic_message(payload.as_ref()));
                    self.panics.send(()).await.is_ok()
                }
            };
            if !delivered {
                tracing::debug!(worker_id = %self.worker_id, "collector gone, stopping early");
                break;
            }
        }

        activity.processed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Tracks a running worker; reports it stopped when dropped, including on
/// panic.
struct WorkerActivity<'a> {
    worker_id: &'a str,
    processed: u64,
}

impl<'a> WorkerActivity<'a> {
    fn start(worker_id: &'a str) -> Self {
        telemetry::record_worker_started(worker_id);
        Self {
            worker_id,
            processed: 0,
        }
    }
}

impl Drop for WorkerActivity<'_> {
    fn drop(&mut self) {
        telemetry::record_worker_stopped(self.worker_id, self.processed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::process_fn;

    fn threshold_worker(
        lane: mpsc::Receiver<u32>,
        capacity: usize,
    ) -> (
        Worker<u32, impl JobProcessor<u32, Output = u32, Error = String>>,
        mpsc::Receiver<u32>,
        mpsc::Receiver<String>,
        mpsc::Receiver<()>,
    ) {
        let processor = Arc::new(process_fn(|job: u32| {
            if job == 0 {
                panic!("job 0 is poison");
            }
            if job > 4 {
                Err(format!("job {job} rejected"))
            } else {
                Ok(job)
            }
        }));
        let (success_tx, success_rx) = mpsc::channel(capacity);
        let (failure_tx, failure_rx) = mpsc::channel(capacity);
        let (panic_tx, panic_rx) = mpsc::channel(capacity);
        let worker = Worker::new(
            "test-w0".to_string(),
            lane,
            processor,
            success_tx,
            failure_tx,
            panic_tx,
        );
        (worker, success_rx, failure_rx, panic_rx)
    }

    #[tokio::test]
    async fn test_worker_routes_outcomes_in_lane_order() {
        let (lane_tx, lane_rx) = mpsc::channel(8);
        let (worker, mut successes, mut failures, _panics) = threshold_worker(lane_rx, 8);

        for job in [1, 5, 2, 6, 3] {
            lane_tx.send(job).await.unwrap();
        }
        drop(lane_tx);

        let processed = worker.run().await;
        assert_eq!(processed, 5);

        let mut ok = Vec::new();
        while let Some(value) = successes.recv().await {
            ok.push(value);
        }
        let mut failed = Vec::new();
        while let Some(err) = failures.recv().await {
            failed.push(err);
        }
        assert_eq!(ok, vec![1, 2, 3]);
        assert_eq!(failed, vec!["job 5 rejected", "job 6 rejected"]);
    }

    #[tokio::test]
    async fn test_worker_stops_when_collector_is_gone() {
        let (lane_tx, lane_rx) = mpsc::channel(8);
        let (worker, successes, failures, panics) = threshold_worker(lane_rx, 8);
        drop(successes);
        drop(failures);
        drop(panics);

        for job in [1, 2, 3] {
            lane_tx.send(job).await.unwrap();
        }

        // The lane is still open; the worker must stop on its own.
        let processed = tokio::time::timeout(std::time::Duration::from_secs(5), worker.run())
            .await
            .expect("worker should stop once outcomes cannot be delivered");
        assert_eq!(processed, 1);
    }

    #[tokio::test]
    async fn test_worker_survives_panicking_job() {
        let (lane_tx, lane_rx) = mpsc::channel(8);
        let (worker, mut successes, _failures, mut panics) = threshold_worker(lane_rx, 8);

        for job in [1, 0, 2] {
            lane_tx.send(job).await.unwrap();
        }
        drop(lane_tx);

        let processed = tokio::time::timeout(std::time::Duration::from_secs(5), worker.run())
            .await
            .expect("worker should keep draining after a panic");
        assert_eq!(processed, 3);

        let mut ok = Vec::new();
        while let Some(value) = successes.recv().await {
            ok.push(value);
        }
        assert_eq!(ok, vec![1, 2]);
        assert_eq!(panics.recv().await, Some(()));
        assert_eq!(panics.recv().await, None);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(format!("job {}", 7));
        assert_eq!(panic_message(payload.as_ref()), "job 7");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
