use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use fanout::JobProcessor;
use parking_lot::Mutex;

/// Processor that records every job it sees.
///
/// Jobs succeed with their own value unless marked failing. Clones share
/// the same record, so a test can keep one clone and hand the other to a
/// pool.
#[derive(Clone)]
pub struct MockProcessor {
    processed: Arc<Mutex<Vec<ProcessRecord>>>,
    failing: Arc<Mutex<HashSet<u64>>>,
    delay: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessRecord {
    pub job: u64,
    /// Order in which processing started, across all workers.
    pub sequence: usize,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self {
            processed: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            delay: None,
        }
    }

    /// Sleep this long inside every job.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the given jobs fail.
    pub fn with_failing(self, jobs: impl IntoIterator<Item = u64>) -> Self {
        self.failing.lock().extend(jobs);
        self
    }

    pub fn record(&self) -> Vec<ProcessRecord> {
        self.processed.lock().clone()
    }

    /// Jobs in the order processing started.
    pub fn processed_jobs(&self) -> Vec<u64> {
        self.processed.lock().iter().map(|r| r.job).collect()
    }

    pub fn assert_processed_count_eq(&self, expected: usize) {
        assert_eq!(
            self.processed.lock().len(),
            expected,
            "Expected {} processed jobs, got {}",
            expected,
            self.processed.lock().len()
        );
    }

    pub fn clear(&self) {
        self.processed.lock().clear();
    }
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobProcessor<u64> for MockProcessor {
    type Output = u64;
    type Error = anyhow::Error;

    async fn process(&self, job: u64) -> anyhow::Result<u64> {
        {
            let mut processed = self.processed.lock();
            let sequence = processed.len();
            processed.push(ProcessRecord { job, sequence });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().contains(&job) {
            return Err(anyhow!("job {job} marked failing"));
        }
        Ok(job)
    }
}
