//! Test support for fanout: jobs, processors and outcome recorders.

mod job;
mod mock;
mod recorder;

pub use job::{TestJob, TestJobKind, TestJobProcessor, ThresholdProcessor};
pub use mock::{MockProcessor, ProcessRecord};
pub use recorder::{OutcomeEntry, OutcomeLog};
