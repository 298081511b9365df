use super::state::{BOUND, CANCELLED, FINISHED, UNBOUND, is_terminal};
use crate::disposable::Disposable;
use crate::scheduler::lane::LaneTask;
use crate::scheduler::worker::WorkerShared;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// A unit of work scheduled through a [`ParallelWorker`](crate::ParallelWorker).
///
/// The task coordinates three parties that may race with each other: the
/// lane running the action, the caller disposing the handle, and the worker
/// shutting down. All of them go through a single atomic `state` cell:
///
/// ```text
///   UNBOUND --bind--> BOUND --complete--> FINISHED
///      |                |
///      +--dispose / shutdown / lane drop--> CANCELLED
/// ```
///
/// `FINISHED` and `CANCELLED` are terminal. Completion may also move
/// `UNBOUND` straight to `FINISHED` when the lane runs the action before the
/// scheduling thread attaches the token.
pub(crate) struct WorkerTask {
    /// Worker that tracks this task, used for self-removal only.
    owner: Arc<WorkerShared>,

    /// Current lifecycle state.
    state: AtomicUsize,

    /// Lane token, written once before the UNBOUND -> BOUND transition.
    token: OnceLock<Arc<LaneTask>>,

    /// Set exactly once by `dispose`.
    cancelled: AtomicBool,

    /// Slot of this task in the owner's live set.
    slot: AtomicUsize,
}

impl WorkerTask {
    pub(crate) fn new(owner: Arc<WorkerShared>) -> Self {
        Self {
            owner,
            state: AtomicUsize::new(UNBOUND),
            token: OnceLock::new(),
            cancelled: AtomicBool::new(false),
            slot: AtomicUsize::new(usize::MAX),
        }
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot.load(Ordering::Relaxed)
    }

    /// Records the live-set slot. Called under the owner's lock.
    pub(crate) fn set_slot(&self, slot: usize) {
        self.slot.store(slot, Ordering::Relaxed);
    }

    /// Runs `action` on the lane thread.
    ///
    /// The action is skipped when the task was disposed or its worker shut
    /// down before it started. A panic still drives the completion
    /// transition before it propagates to the lane.
    pub(crate) fn run<F>(&self, action: F)
    where
        F: FnOnce(),
    {
        if self.cancelled.load(Ordering::Acquire) || self.owner.is_shutdown() {
            return;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(action));

        self.complete();

        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
    }

    /// Attaches the lane token.
    ///
    /// If the task was cancelled before the token arrived, the token is
    /// cancelled on the spot. A task that already finished keeps its token
    /// untouched.
    pub(crate) fn bind(&self, token: Arc<LaneTask>) {
        let token = self.token.get_or_init(|| token);

        let bound =
            self.state
                .compare_exchange(UNBOUND, BOUND, Ordering::AcqRel, Ordering::Acquire);

        if bound == Err(CANCELLED) {
            token.cancel();
        }
    }

    /// Cancels the task on behalf of its worker's shutdown.
    ///
    /// Returns `true` if this call performed the cancellation. The task is
    /// not removed from the live set, the worker has detached it already.
    pub(crate) fn cancel_for_shutdown(&self) -> bool {
        match self.transition_to_cancelled() {
            Some(previous) => {
                self.cancel_token(previous);
                true
            }
            None => false,
        }
    }

    /// Cancels the task after its lane dropped the job without running it.
    ///
    /// The lane token is already cancelled or was never queued, so only the
    /// state and the live set are touched.
    pub(crate) fn cancel_unrun(&self) {
        if self.transition_to_cancelled().is_some() {
            self.owner.remove(self);
        }
    }

    /// Moves a non-terminal task to `FINISHED`; yields to `CANCELLED`.
    fn complete(&self) {
        let mut current = self.state.load(Ordering::Acquire);

        loop {
            if is_terminal(current) {
                tracing::trace!("task completed after cancellation");
                return;
            }

            match self.state.compare_exchange_weak(
                current,
                FINISHED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.owner.remove(self);
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// CAS loop to `CANCELLED`; returns the state it replaced, or `None`
    /// when the task was already terminal.
    fn transition_to_cancelled(&self) -> Option<usize> {
        let mut current = self.state.load(Ordering::Acquire);

        loop {
            if is_terminal(current) {
                return None;
            }

            match self.state.compare_exchange_weak(
                current,
                CANCELLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(current),
                Err(actual) => current = actual,
            }
        }
    }

    fn cancel_token(&self, previous: usize) {
        if previous != BOUND {
            return;
        }

        if let Some(token) = self.token.get() {
            token.cancel();
        }
    }
}

impl Disposable for WorkerTask {
    fn dispose(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(previous) = self.transition_to_cancelled() {
            self.cancel_token(previous);
            self.owner.remove(self);
        }
    }

    fn is_disposed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }
}
