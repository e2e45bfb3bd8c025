//! Hand-off queue between the launching thread and the workers of one call.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// FIFO of pending units plus a count of workers that are free to take one.
///
/// A worker announces itself with `mark_idle()` before it goes back to `pop()`.
/// The launcher spends one announcement per unit with `claim_idle()`; when none
/// is left it starts a new worker instead, so no pushed unit waits on a busy one.
pub(crate) struct WorkQueue<J> {
    state: Mutex<QueueState<J>>,
    ready: Condvar,
    idle: AtomicUsize,
}

struct QueueState<J> {
    jobs: VecDeque<J>,
    closed: bool,
}

impl<J> WorkQueue<J> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState { jobs: VecDeque::new(), closed: false }),
            ready: Condvar::new(),
            idle: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push(&self, job: J) {
        let mut state = self.state.lock();
        state.jobs.push_back(job);
        self.ready.notify_one();
    }

    /// Block for the next unit; `None` once the queue is closed and drained.
    pub(crate) fn pop(&self) -> Option<J> {
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.closed {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    pub(crate) fn try_pop(&self) -> Option<J> {
        self.state.lock().jobs.pop_front()
    }

    /// No more pushes; wakes every blocked `pop()`.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.ready.notify_all();
    }

    pub(crate) fn mark_idle(&self) {
        self.idle.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn claim_idle(&self) -> bool {
        let mut current = self.idle.load(Ordering::SeqCst);
        while current > 0 {
            match self.idle.compare_exchange_weak(current, current - 1, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }
}
