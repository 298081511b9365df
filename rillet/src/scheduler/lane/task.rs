use super::state::{CANCELLED, COMPLETED, QUEUED, RUNNING};
use crate::disposable::Disposable;
use crate::error::ActionFault;

use parking_lot::Mutex;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A boxed unit of work accepted by a lane.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// A job submitted to a lane, together with its cancellation state.
///
/// `LaneTask` is the low-level cancellation token of the execution context.
/// Cancelling it while queued guarantees the job never starts; cancelling it
/// while running only marks it, the job is never interrupted.
pub(crate) struct LaneTask {
    /// The job itself. Taken exactly once, either to run or to drop it.
    job: Mutex<Option<Job>>,

    /// The current lifecycle state (QUEUED, RUNNING, ...).
    state: AtomicUsize,
}

impl LaneTask {
    pub(crate) fn new(job: Job) -> Self {
        Self {
            job: Mutex::new(Some(job)),
            state: AtomicUsize::new(QUEUED),
        }
    }

    /// Runs the job if the task is still queued.
    ///
    /// A panic raised by the job is caught and returned as an
    /// [`ActionFault`]; the lane decides where it goes.
    pub(crate) fn run(&self) -> Result<(), ActionFault> {
        // Transition to RUNNING. Losing this race means we were cancelled.
        if self
            .state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let job = self.job.lock().take();
        let Some(job) = job else {
            return Ok(());
        };

        let result = panic::catch_unwind(AssertUnwindSafe(job));

        // Fails when cancelled mid-run; CANCELLED stays.
        let _ = self
            .state
            .compare_exchange(RUNNING, COMPLETED, Ordering::AcqRel, Ordering::Acquire);

        result.map_err(ActionFault::new)
    }

    /// Cancels the task.
    ///
    /// Returns `true` if this call moved the task to `CANCELLED`. A queued
    /// job is dropped right away.
    pub(crate) fn cancel(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);

        loop {
            if current == COMPLETED || current == CANCELLED {
                return false;
            }

            match self.state.compare_exchange_weak(
                current,
                CANCELLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if current == QUEUED {
                        let job = self.job.lock().take();
                        drop(job);
                    }
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }
}

impl Disposable for LaneTask {
    fn dispose(&self) {
        self.cancel();
    }

    fn is_disposed(&self) -> bool {
        self.is_cancelled()
    }
}
