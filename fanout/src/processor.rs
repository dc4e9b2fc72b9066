use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

/// The unit of work applied to every job of a dispatch call.
///
/// A processor is shared by all workers of a pool, so it must be
/// `Send + Sync`. Returning `Err` marks the job as failed; the error is
/// delivered to the pool's failure callback and never aborts the batch.
#[async_trait]
pub trait JobProcessor<J: Send + 'static>: Send + Sync + 'static {
    /// Value delivered to the success callback.
    type Output: Send + 'static;
    /// Value delivered to the failure callback.
    type Error: Send + 'static;

    /// Process a single job.
    async fn process(&self, job: J) -> Result<Self::Output, Self::Error>;
}

/// Processor backed by a synchronous closure.
///
/// Built with [`process_fn`]. The closure runs inline on the worker task,
/// so it should not block for long.
pub struct ProcessFn<F> {
    f: F,
}

/// Wrap a synchronous closure as a [`JobProcessor`].
pub fn process_fn<F>(f: F) -> ProcessFn<F> {
    ProcessFn { f }
}

#[async_trait]
impl<J, F, R, E> JobProcessor<J> for ProcessFn<F>
where
    J: Send + 'static,
    F: Fn(J) -> Result<R, E> + Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    type Output = R;
    type Error = E;

    async fn process(&self, job: J) -> Result<R, E> {
        (self.f)(job)
    }
}

/// Processor backed by a closure returning a future.
///
/// Built with [`process_async_fn`].
pub struct ProcessAsyncFn<F, Fut> {
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a [`JobProcessor`].
pub fn process_async_fn<F, Fut>(f: F) -> ProcessAsyncFn<F, Fut> {
    ProcessAsyncFn {
        f,
        _future: PhantomData,
    }
}

#[async_trait]
impl<J, F, Fut, R, E> JobProcessor<J> for ProcessAsyncFn<F, Fut>
where
    J: Send + 'static,
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    type Output = R;
    type Error = E;

    async fn process(&self, job: J) -> Result<R, E> {
        (self.f)(job).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_process_fn_routes_result() {
        let processor = process_fn(|job: u32| {
            if job > 4 {
                Err(format!("job {job} too large"))
            } else {
                Ok(job * 10)
            }
        });

        assert_eq!(processor.process(2u32).await, Ok(20));
        assert_eq!(processor.process(5u32).await, Err("job 5 too large".to_string()));
    }

    #[tokio::test]
    async fn test_process_async_fn_awaits_future() {
        let processor = process_async_fn(|job: u64| async move {
            tokio::time::sleep(Duration::from_millis(job)).await;
            Ok::<_, std::convert::Infallible>(job + 1)
        });

        assert_eq!(processor.process(5u64).await, Ok(6));
    }
}
