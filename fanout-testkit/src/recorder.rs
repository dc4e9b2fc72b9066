use std::cell::RefCell;
use std::rc::Rc;

use fanout::{CancelToken, OutcomeStatus};

/// Records the callbacks a pool invokes.
///
/// Pool callbacks run serially on the dispatching task, so the log uses
/// plain `Rc<RefCell<_>>` state rather than a lock.
pub struct OutcomeLog<R, E> {
    inner: Rc<RefCell<LogInner<R, E>>>,
}

struct LogInner<R, E> {
    successes: Vec<R>,
    failures: Vec<E>,
    entries: Vec<OutcomeEntry>,
    cancel_after: Option<(usize, CancelToken)>,
}

/// One callback invocation, in arrival order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutcomeEntry {
    pub arrival: usize,
    pub status: OutcomeStatus,
}

impl<R, E> Clone for OutcomeLog<R, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: 'static, E: 'static> Default for OutcomeLog<R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static, E: 'static> OutcomeLog<R, E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(LogInner {
                successes: Vec::new(),
                failures: Vec::new(),
                entries: Vec::new(),
                cancel_after: None,
            })),
        }
    }

    /// Fire `token` from inside the callback that brings the total to
    /// `count`.
    pub fn cancel_after(self, count: usize, token: CancelToken) -> Self {
        self.inner.borrow_mut().cancel_after = Some((count, token));
        self
    }

    /// Callback to pass as a pool's success handler.
    pub fn on_success(&self) -> impl FnMut(R) + 'static {
        let inner = Rc::clone(&self.inner);
        move |value| {
            let mut log = inner.borrow_mut();
            log.successes.push(value);
            log.push_entry(OutcomeStatus::Success);
        }
    }

    /// Callback to pass as a pool's failure handler.
    pub fn on_failure(&self) -> impl FnMut(E) + 'static {
        let inner = Rc::clone(&self.inner);
        move |err| {
            let mut log = inner.borrow_mut();
            log.failures.push(err);
            log.push_entry(OutcomeStatus::Failure);
        }
    }

    pub fn success_count(&self) -> usize {
        self.inner.borrow().successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.inner.borrow().failures.len()
    }

    /// Callbacks invoked so far.
    pub fn total(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn entries(&self) -> Vec<OutcomeEntry> {
        self.inner.borrow().entries.clone()
    }

    /// Remove and return the recorded successes.
    pub fn take_successes(&self) -> Vec<R> {
        std::mem::take(&mut self.inner.borrow_mut().successes)
    }

    /// Remove and return the recorded failures.
    pub fn take_failures(&self) -> Vec<E> {
        std::mem::take(&mut self.inner.borrow_mut().failures)
    }
}

impl<R, E> LogInner<R, E> {
    fn push_entry(&mut self, status: OutcomeStatus) {
        let arrival = self.entries.len();
        self.entries.push(OutcomeEntry { arrival, status });
        if let Some((count, token)) = &self.cancel_after {
            if self.entries.len() >= *count {
                token.cancel();
            }
        }
    }
}
