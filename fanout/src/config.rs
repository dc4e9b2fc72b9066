use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// Configuration for a [`WorkerPool`](crate::runtime::WorkerPool).
///
/// A config is fixed when the pool is built and reused for every dispatch
/// call. Nothing is validated here; [`PoolConfig::validate`] runs at the
/// start of each dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of concurrent workers started per dispatch call.
    pub worker_count: usize,
    /// Per-lane buffer size. Defaults to the job count divided by the
    /// worker count.
    pub lane_capacity: Option<usize>,
    /// When set, dispatch waits this long for workers to exit after the
    /// lanes are closed.
    pub join_timeout_ms: Option<u64>,
    /// Prefix used to name workers in logs and spans.
    pub worker_prefix: String,
}

impl PoolConfig {
    /// Create a configuration with the given worker count.
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// Set the worker count.
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Override the per-lane buffer size.
    pub fn with_lane_capacity(mut self, capacity: usize) -> Self {
        self.lane_capacity = Some(capacity);
        self
    }

    /// Wait for workers to exit after each dispatch, up to `ms`.
    pub fn with_join_timeout(mut self, ms: u64) -> Self {
        self.join_timeout_ms = Some(ms);
        self
    }

    /// Set the worker name prefix.
    pub fn with_worker_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_prefix = prefix.into();
        self
    }

    /// Check that the configuration can run a dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Configuration`] when `worker_count` is zero.
    pub fn validate(&self) -> PoolResult<()> {
        if self.worker_count == 0 {
            return Err(PoolError::Configuration);
        }
        Ok(())
    }

    /// Buffer size for each lane when `job_count` jobs are split across
    /// the configured workers. Never zero.
    pub fn lane_capacity_for(&self, job_count: usize) -> usize {
        let hint = match self.lane_capacity {
            Some(capacity) => capacity,
            None => job_count / self.worker_count.max(1),
        };
        hint.max(1)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            lane_capacity: None,
            join_timeout_ms: None,
            worker_prefix: "fanout".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PoolConfig::default();
        assert_eq!(config.worker_count, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = PoolConfig::new(0).validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_lane_capacity_hint() {
        let config = PoolConfig::new(3);
        assert_eq!(config.lane_capacity_for(7), 2);
        assert_eq!(config.lane_capacity_for(2), 1);
        assert_eq!(config.lane_capacity_for(0), 1);

        let config = config.with_lane_capacity(0);
        assert_eq!(config.lane_capacity_for(100), 1);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"worker_count": 2, "join_timeout_ms": 500}"#).unwrap();
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.join_timeout_ms, Some(500));
        assert_eq!(config.worker_prefix, "fanout");
        assert_eq!(config.lane_capacity, None);
    }
}
