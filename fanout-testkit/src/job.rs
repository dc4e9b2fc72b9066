use std::fmt::Display;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use fanout::JobProcessor;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestJob {
    Simple { value: u64 },
    Slow { value: u64, duration_ms: u64 },
    Failing { value: u64, error: String },
}

impl TestJob {
    pub fn value(&self) -> u64 {
        match self {
            TestJob::Simple { value } => *value,
            TestJob::Slow { value, .. } => *value,
            TestJob::Failing { value, .. } => *value,
        }
    }

    pub fn kind(&self) -> TestJobKind {
        match self {
            TestJob::Simple { .. } => TestJobKind::Simple,
            TestJob::Slow { .. } => TestJobKind::Slow,
            TestJob::Failing { .. } => TestJobKind::Failing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestJobKind {
    Simple,
    Slow,
    Failing,
}

impl TestJobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestJobKind::Simple => "simple",
            TestJobKind::Slow => "slow",
            TestJobKind::Failing => "failing",
        }
    }
}

impl Display for TestJobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Processes [`TestJob`]s: simple jobs succeed, slow jobs sleep first,
/// failing jobs fail with their error.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestJobProcessor;

#[async_trait]
impl JobProcessor<TestJob> for TestJobProcessor {
    type Output = u64;
    type Error = anyhow::Error;

    async fn process(&self, job: TestJob) -> anyhow::Result<u64> {
        match job {
            TestJob::Simple { value } => Ok(value),
            TestJob::Slow { value, duration_ms } => {
                tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                Ok(value)
            }
            TestJob::Failing { value, error } => Err(anyhow!("job {value} failed: {error}")),
        }
    }
}

/// Succeeds with the job itself up to `max_ok`, fails above it.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdProcessor {
    pub max_ok: u32,
}

impl ThresholdProcessor {
    pub fn new(max_ok: u32) -> Self {
        Self { max_ok }
    }
}

#[async_trait]
impl JobProcessor<u32> for ThresholdProcessor {
    type Output = u32;
    type Error = anyhow::Error;

    async fn process(&self, job: u32) -> anyhow::Result<u32> {
        if job > self.max_ok {
            return Err(anyhow!("job {job} exceeds {}", self.max_ok));
        }
        Ok(job)
    }
}
