use crate::disposable::Handle;
use crate::error::Error;
use crate::hooks::ErrorHooks;
use crate::scheduler::lane::{Lane, LaneFactory};
use crate::scheduler::worker::ParallelWorker;
use crate::scheduler::{Scheduler, SchedulerBuilder};

use crossbeam::epoch::{self, Atomic, Owned, Shared};

use std::sync::atomic::{AtomicUsize, Ordering};

/// Scheduler hosting a fixed pool of single-thread lanes.
///
/// Work submitted through [`schedule`](Scheduler::schedule) is spread over
/// the lanes round-robin. Each lane runs its work sequentially, different
/// lanes run in parallel, so at most [`parallelism`](Self::parallelism)
/// actions execute at the same time. The lane array doubles as the
/// lifecycle flag: it is null while shut down.
///
/// # Examples
///
/// ```rust
/// use rillet::{ParallelScheduler, Scheduler, Disposable};
///
/// let scheduler = ParallelScheduler::new(2).unwrap();
/// let handle = scheduler.schedule(|| println!("hello from a lane"));
///
/// scheduler.shutdown();
/// assert!(scheduler.schedule(|| unreachable!()).is_disposed());
/// # drop(handle);
/// ```
pub struct ParallelScheduler {
    /// Current lanes, null while shut down.
    lanes: Atomic<Vec<Lane>>,

    /// Number of lanes in every installed set.
    parallelism: usize,

    /// Round-robin cursor.
    cursor: AtomicUsize,

    /// Builds lanes and keeps them around for `join`.
    factory: LaneFactory,
}

impl ParallelScheduler {
    /// Creates a scheduler with `lanes` lanes and default settings.
    ///
    /// Fails with [`Error::InvalidArgument`] if `lanes == 0`.
    pub fn new(lanes: usize) -> Result<Self, Error> {
        SchedulerBuilder::new().lanes(lanes).build()
    }

    /// Returns a builder for a customized scheduler.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn from_parts(parallelism: usize, thread_name: String, hooks: ErrorHooks) -> Self {
        let factory = LaneFactory::new(thread_name, hooks);
        let lanes = factory.spawn_set(parallelism);

        Self {
            lanes: Atomic::new(lanes),
            parallelism,
            cursor: AtomicUsize::new(0),
            factory,
        }
    }

    /// Number of lanes.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Returns `true` unless the scheduler is shut down.
    pub fn is_started(&self) -> bool {
        let guard = &epoch::pin();
        !self.lanes.load(Ordering::Acquire, guard).is_null()
    }

    /// Waits for the threads of every terminated lane to exit.
    ///
    /// Lanes currently installed are left alone, so this only waits for
    /// anything after a [`shutdown`](Scheduler::shutdown). Lane threads
    /// calling `join` on their own scheduler skip themselves.
    pub fn join(&self) {
        self.factory.join_terminated();
    }

    /// Picks the next lane round-robin, or `None` while shut down.
    fn pick(&self) -> Option<Lane> {
        let guard = &epoch::pin();

        // SAFETY: installed arrays are only destroyed through
        // `defer_destroy` after being unlinked, so they outlive this guard.
        let lanes = unsafe { self.lanes.load(Ordering::Acquire, guard).as_ref() }?;

        // Racy on purpose: a lost update only changes which lane is picked.
        let mut index = self.cursor.load(Ordering::Relaxed);
        if index >= lanes.len() {
            index = 0;
        }
        self.cursor.store(index + 1, Ordering::Relaxed);

        lanes.get(index).cloned()
    }
}

impl Scheduler for ParallelScheduler {
    type Worker = ParallelWorker;

    fn schedule<F>(&self, action: F) -> Handle
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(lane) = self.pick() else {
            tracing::trace!("scheduler is shut down, rejecting action");
            return Handle::rejected();
        };

        match lane.submit(Box::new(action)) {
            Ok(token) => Handle::new(token),
            Err(err) => {
                tracing::debug!(lane = %lane.name(), error = %err, "submission rejected");
                Handle::rejected()
            }
        }
    }

    fn create_worker(&self) -> ParallelWorker {
        ParallelWorker::new(self.pick())
    }

    fn start(&self) {
        let guard = &epoch::pin();
        let mut fresh: Option<Owned<Vec<Lane>>> = None;

        loop {
            let current = self.lanes.load(Ordering::Acquire, guard);

            if !current.is_null() {
                // Somebody else installed a set first.
                if let Some(fresh) = fresh {
                    for lane in fresh.iter() {
                        lane.terminate();
                    }
                    tracing::debug!("concurrent start won, discarding fresh lanes");
                }
                return;
            }

            let lanes = fresh
                .take()
                .unwrap_or_else(|| Owned::new(self.factory.spawn_set(self.parallelism)));

            match self.lanes.compare_exchange(
                current,
                lanes,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(_) => {
                    tracing::debug!(lanes = self.parallelism, "scheduler started");
                    return;
                }
                Err(err) => fresh = Some(err.new),
            }
        }
    }

    fn shutdown(&self) {
        let guard = &epoch::pin();

        if self.lanes.load(Ordering::Acquire, guard).is_null() {
            return;
        }

        let previous = self.lanes.swap(Shared::null(), Ordering::AcqRel, guard);

        // SAFETY: the swap unlinked `previous`; only this call observed it,
        // and readers pinned before the swap keep it alive until they unpin.
        let Some(lanes) = (unsafe { previous.as_ref() }) else {
            return;
        };

        for lane in lanes {
            lane.terminate();
        }

        tracing::debug!(lanes = lanes.len(), "scheduler shut down");

        // SAFETY: `previous` is no longer reachable from `self.lanes`, and
        // the swap hands it to exactly one caller, so it is destroyed once,
        // after every guard pinned before the swap is dropped.
        unsafe { guard.defer_destroy(previous) };
    }
}

impl Drop for ParallelScheduler {
    /// Shuts the scheduler down and waits for its lane threads.
    fn drop(&mut self) {
        self.shutdown();
        self.join();
    }
}
