use tokio::sync::mpsc;

use crate::cancel::CancelToken;

/// Sending half of one worker's job queue.
///
/// Only the dispatcher holds a lane. Closing consumes it, so a lane cannot
/// be closed twice.
#[derive(Debug)]
pub struct Lane<J> {
    index: usize,
    sender: mpsc::Sender<J>,
}

impl<J> Lane<J> {
    /// Position of this lane among its siblings.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Push a job, waiting while the lane is full.
    ///
    /// Hands the job back if the owning worker has gone away.
    pub async fn push(&self, job: J) -> Result<(), J> {
        self.sender.send(job).await.map_err(|err| err.0)
    }

    /// Close the lane. The worker finishes whatever is buffered, then stops.
    pub fn close(self) {
        drop(self.sender);
    }
}

/// Result of [`LaneSet::assign`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Assignment {
    /// Jobs pushed onto a lane.
    pub placed: usize,
    /// Assignment stopped early because the cancellation signal fired.
    pub cancelled: bool,
}

/// The lanes of one dispatch call, filled round-robin.
#[derive(Debug)]
pub struct LaneSet<J> {
    lanes: Vec<Lane<J>>,
}

impl<J> LaneSet<J> {
    /// Open `count` lanes buffering up to `capacity` jobs each.
    ///
    /// Returns the lanes together with the receiving half for each worker,
    /// in lane order.
    pub fn open(count: usize, capacity: usize) -> (Self, Vec<mpsc::Receiver<J>>) {
        let mut lanes = Vec::with_capacity(count);
        let mut receivers = Vec::with_capacity(count);
        for index in 0..count {
            let (sender, receiver) = mpsc::channel(capacity.max(1));
            lanes.push(Lane { index, sender });
            receivers.push(receiver);
        }
        (Self { lanes }, receivers)
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Lane that receives the job at `position` of the input.
    pub fn lane_for(&self, position: usize) -> usize {
        position % self.lanes.len()
    }

    /// Assign jobs to lanes round-robin.
    ///
    /// Stops at the first job seen after `cancel` fired; remaining jobs are
    /// dropped without being started. A job whose worker is gone is dropped
    /// too.
    pub async fn assign<I>(&self, jobs: I, cancel: &CancelToken) -> Assignment
    where
        I: IntoIterator<Item = J>,
    {
        let mut assignment = Assignment::default();
        if self.lanes.is_empty() {
            return assignment;
        }

        for (position, job) in jobs.into_iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::debug!(position, "cancelled during assignment");
                assignment.cancelled = true;
                break;
            }

            let lane = &self.lanes[self.lane_for(position)];
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(position, "cancelled while waiting for lane capacity");
                    assignment.cancelled = true;
                    break;
                }
                pushed = lane.push(job) => match pushed {
                    Ok(()) => assignment.placed += 1,
                    Err(_) => {
                        tracing::warn!(lane = lane.index(), position, "lane rejected job, worker is gone");
                    }
                },
            }
        }
        assignment
    }

    /// Close every lane exactly once.
    pub fn close_all(self) {
        for lane in self.lanes {
            lane.close();
        }
    }
}
