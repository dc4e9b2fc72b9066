/// Per-worker job queues and round-robin assignment.
pub mod lane;
/// The worker pool: dispatch and outcome collection.
pub mod pool;
/// Worker task loop.
pub(crate) mod worker;

pub use lane::{Assignment, Lane, LaneSet};
pub use pool::WorkerPool;
