use super::task::{Job, LaneTask};
use crate::error::Error;
use crate::hooks::ErrorHooks;

use parking_lot::{Condvar, Mutex};

use std::collections::VecDeque;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// One sequential execution context.
///
/// A lane owns a single OS thread and a FIFO queue. Jobs submitted to the
/// same lane never overlap; jobs on different lanes run in parallel.
///
/// Cloning a `Lane` is cheap and shares the same thread and queue.
#[derive(Clone)]
pub(crate) struct Lane {
    shared: Arc<LaneShared>,
}

struct LaneShared {
    /// Name of the lane thread.
    name: String,

    /// Tasks waiting to run.
    queue: Mutex<VecDeque<Arc<LaneTask>>>,

    /// Wakes the lane thread when work arrives or the lane terminates.
    condvar: Condvar,

    /// One-way termination flag.
    terminated: AtomicBool,

    /// Join handle of the lane thread, taken by `join`.
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Lane {
    /// Starts a new lane thread named `name`.
    ///
    /// If the thread cannot be spawned the lane is returned already
    /// terminated, so every submission to it is rejected.
    pub(crate) fn spawn(name: String, hooks: ErrorHooks) -> Self {
        let shared = Arc::new(LaneShared {
            name,
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            terminated: AtomicBool::new(false),
            thread: Mutex::new(None),
        });

        let worker = shared.clone();
        let spawned = thread::Builder::new()
            .name(shared.name.clone())
            .spawn(move || run(worker, hooks));

        match spawned {
            Ok(handle) => {
                *shared.thread.lock() = Some(handle);
                tracing::debug!(lane = %shared.name, "lane started");
            }
            Err(err) => {
                tracing::error!(lane = %shared.name, error = %err, "failed to spawn lane thread");
                shared.terminate();
            }
        }

        Self { shared }
    }

    /// Queues `job` for execution.
    ///
    /// Returns the cancellation token of the queued job, or
    /// [`Error::Rejected`] once the lane has terminated.
    pub(crate) fn submit(&self, job: Job) -> Result<Arc<LaneTask>, Error> {
        let task = Arc::new(LaneTask::new(job));

        {
            let mut queue = self.shared.queue.lock();
            if self.shared.terminated.load(Ordering::Acquire) {
                return Err(Error::Rejected);
            }
            queue.push_back(task.clone());
        }

        self.shared.condvar.notify_one();
        Ok(task)
    }

    /// Terminates the lane.
    ///
    /// Further submissions are rejected and every queued task is cancelled.
    /// The job currently running, if any, is left to finish. Idempotent.
    pub(crate) fn terminate(&self) {
        self.shared.terminate();
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::Acquire)
    }

    /// Returns `true` once the lane terminated and its thread has exited,
    /// or was already joined.
    pub(crate) fn is_finished(&self) -> bool {
        self.is_terminated()
            && self
                .shared
                .thread
                .lock()
                .as_ref()
                .is_none_or(JoinHandle::is_finished)
    }

    pub(crate) fn name(&self) -> &str {
        &self.shared.name
    }

    /// Waits for the lane thread to exit.
    ///
    /// Does nothing when called from the lane thread itself or when the
    /// thread was already joined.
    pub(crate) fn join(&self) {
        let handle = self.shared.thread.lock().take();
        let Some(handle) = handle else {
            return;
        };

        if handle.thread().id() == thread::current().id() {
            return;
        }

        if handle.join().is_err() {
            tracing::debug!(lane = %self.shared.name, "lane thread exited by panicking");
        }
    }
}

impl LaneShared {
    fn terminate(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }

        let drained: Vec<_> = self.queue.lock().drain(..).collect();
        self.condvar.notify_all();

        for task in &drained {
            task.cancel();
        }

        tracing::debug!(lane = %self.name, cancelled = drained.len(), "lane terminated");
    }
}

/// Terminates the lane when its thread exits, including by unwinding.
struct ExitGuard(Arc<LaneShared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.terminate();
    }
}

/// The lane thread loop.
///
/// Pops tasks in FIFO order and runs them until the lane terminates. Faults
/// are classified through `hooks`: fatal ones resume unwinding and end the
/// thread, the rest go to the error sink.
fn run(shared: Arc<LaneShared>, hooks: ErrorHooks) {
    let _guard = ExitGuard(shared.clone());

    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if shared.terminated.load(Ordering::Acquire) {
                    return;
                }
                if let Some(task) = queue.pop_front() {
                    break task;
                }
                shared.condvar.wait(&mut queue);
            }
        };

        if let Err(fault) = task.run() {
            if hooks.is_fatal(&fault) {
                tracing::error!(lane = %shared.name, error = %fault, "fatal fault, terminating lane");
                panic::resume_unwind(fault.into_payload());
            }

            hooks.on_error_dropped(fault);
        }
    }
}
