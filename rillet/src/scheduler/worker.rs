use crate::disposable::Handle;
use crate::scheduler::Worker;
use crate::scheduler::lane::{Job, Lane};
use crate::scheduler::task::WorkerTask;
use crate::utils::Slab;

use parking_lot::Mutex;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Initial number of slots in a worker's live-task set.
const INITIAL_SLOTS: usize = 8;

/// A batch of work bound to one lane of a [`ParallelScheduler`].
///
/// Every action scheduled through the same worker runs on the same lane, in
/// submission order. The worker tracks the tasks it has handed out that are
/// neither finished nor cancelled, so [`shutdown`](Worker::shutdown) can
/// cancel all of them at once.
///
/// Dropping a `ParallelWorker` shuts it down.
///
/// [`ParallelScheduler`]: crate::ParallelScheduler
pub struct ParallelWorker {
    shared: Arc<WorkerShared>,
}

/// State shared between a worker and the tasks it created.
pub(crate) struct WorkerShared {
    /// Lane this worker submits to. `None` when created on a shut down
    /// scheduler.
    lane: Option<Lane>,

    /// Live tasks. `None` once the worker has shut down.
    tasks: Mutex<Option<Slab<Arc<WorkerTask>>>>,

    /// One-way shutdown flag.
    shutdown: AtomicBool,
}

impl ParallelWorker {
    pub(crate) fn new(lane: Option<Lane>) -> Self {
        let shutdown = lane.is_none();

        Self {
            shared: Arc::new(WorkerShared {
                lane,
                tasks: Mutex::new(Some(Slab::new(INITIAL_SLOTS))),
                shutdown: AtomicBool::new(shutdown),
            }),
        }
    }

    /// Number of tracked tasks that have neither finished nor been
    /// cancelled. Always 0 once the worker has shut down.
    pub fn pending_count(&self) -> usize {
        self.shared.pending_count()
    }

    /// Returns `true` once the worker stopped accepting work.
    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Shuts the worker down and returns how many tracked tasks this call
    /// cancelled. Every later call returns 0.
    pub fn shutdown_now(&self) -> usize {
        self.shared.shutdown()
    }
}

impl Worker for ParallelWorker {
    fn schedule<F>(&self, action: F) -> Handle
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.schedule(action)
    }

    fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl Drop for ParallelWorker {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl WorkerShared {
    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn schedule<F>(self: &Arc<Self>, action: F) -> Handle
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_shutdown() {
            return Handle::rejected();
        }

        let Some(lane) = &self.lane else {
            return Handle::rejected();
        };

        let task = Arc::new(WorkerTask::new(self.clone()));

        {
            let mut tasks = self.tasks.lock();
            let Some(set) = tasks.as_mut() else {
                return Handle::rejected();
            };
            task.set_slot(set.insert(task.clone()));
        }

        let job: Job = {
            let pending = PendingRun(Some(task.clone()));
            Box::new(move || pending.run(action))
        };

        // A rejected job is dropped inside `submit`, which already cancelled
        // the task and took it out of the live set.
        let token = match lane.submit(job) {
            Ok(token) => token,
            Err(err) => {
                tracing::debug!(lane = %lane.name(), error = %err, "worker submission rejected");
                return Handle::rejected();
            }
        };

        task.bind(token.clone());

        // Shutdown may have swept the live set before the token was attached.
        if self.is_shutdown() {
            token.cancel();
            return Handle::rejected();
        }

        Handle::new(task)
    }

    fn shutdown(&self) -> usize {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let tasks = self.tasks.lock().take();
        let Some(tasks) = tasks else {
            return 0;
        };

        let cancelled = tasks
            .into_values()
            .filter(|task| task.cancel_for_shutdown())
            .count();

        tracing::debug!(cancelled, "worker shut down");
        cancelled
    }

    /// Removes a finished or disposed task from the live set.
    pub(crate) fn remove(&self, task: &WorkerTask) {
        if self.is_shutdown() {
            return;
        }

        let removed = {
            let mut tasks = self.tasks.lock();
            tasks.as_mut().and_then(|set| set.remove(task.slot()))
        };

        drop(removed);
    }

    fn pending_count(&self) -> usize {
        if self.is_shutdown() {
            return 0;
        }

        self.tasks.lock().as_ref().map_or(0, Slab::len)
    }
}

/// The worker task captured by a lane job.
///
/// Dropping it before `run` means the lane discarded the job: the scheduler
/// shut down with the job queued, or the lane refused it.
struct PendingRun(Option<Arc<WorkerTask>>);

impl PendingRun {
    fn run<F>(mut self, action: F)
    where
        F: FnOnce(),
    {
        if let Some(task) = self.0.take() {
            task.run(action);
        }
    }
}

impl Drop for PendingRun {
    fn drop(&mut self) {
        if let Some(task) = self.0.take() {
            task.cancel_unrun();
        }
    }
}
