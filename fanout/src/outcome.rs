use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of one dispatch call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DispatchId(pub Uuid);

impl Default for DispatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Display for DispatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of processing exactly one job.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WorkOutcome<R, E> {
    Success(R),
    Failure(E),
}

impl<R, E> WorkOutcome<R, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Label used in logs and metrics.
    pub fn status(&self) -> OutcomeStatus {
        match self {
            Self::Success(_) => OutcomeStatus::Success,
            Self::Failure(_) => OutcomeStatus::Failure,
        }
    }
}

impl<R, E> From<Result<R, E>> for WorkOutcome<R, E> {
    fn from(result: Result<R, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a dispatch call did.
///
/// `succeeded + failed` is the number of callbacks invoked. When it is
/// smaller than `submitted`, the call stopped early (cancellation fired or
/// workers went away) or some jobs panicked.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub dispatch_id: DispatchId,
    /// Jobs in the input sequence.
    pub submitted: usize,
    /// Jobs placed into a lane.
    pub dispatched: usize,
    /// Success callbacks invoked.
    pub succeeded: usize,
    /// Failure callbacks invoked.
    pub failed: usize,
    /// Jobs whose processor panicked. They reach neither callback.
    #[serde(default)]
    pub panicked: usize,
    /// Whether assignment or collection stopped because of the
    /// cancellation signal.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DispatchSummary {
    pub(crate) fn begin(dispatch_id: DispatchId, submitted: usize) -> Self {
        let now = Utc::now();
        Self {
            dispatch_id,
            submitted,
            dispatched: 0,
            succeeded: 0,
            failed: 0,
            panicked: 0,
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Outcomes delivered to either callback.
    pub fn observed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Dispatched jobs that have finished, with or without a callback.
    pub fn settled(&self) -> usize {
        self.observed() + self.panicked
    }

    /// Whether every submitted job reached a callback.
    pub fn is_complete(&self) -> bool {
        self.observed() == self.submitted
    }
}
