//! Multi-lane task scheduling. Lanes and per-task state machines are
//! internal.

mod builder;
mod core;
mod lane;
mod task;
mod worker;

pub use self::core::ParallelScheduler;
pub use builder::SchedulerBuilder;
pub use worker::ParallelWorker;

use crate::disposable::Handle;

/// Runs units of work on some execution context.
///
/// Submissions never fail loudly: a scheduler that cannot accept work
/// returns [`Handle::rejected`], an inert handle that reports itself as
/// already disposed.
pub trait Scheduler: Send + Sync {
    /// Worker type returned by [`create_worker`](Self::create_worker).
    type Worker: Worker;

    /// Schedules `action` for execution and returns a handle that can
    /// cancel it before it starts.
    fn schedule<F>(&self, action: F) -> Handle
    where
        F: FnOnce() + Send + 'static;

    /// Creates a worker that schedules on a single execution context and
    /// can cancel everything it scheduled at once.
    fn create_worker(&self) -> Self::Worker;

    /// Restarts the scheduler after a [`shutdown`](Self::shutdown).
    /// No-op while running.
    fn start(&self);

    /// Stops accepting work and cancels everything not yet started.
    /// Idempotent.
    fn shutdown(&self);
}

/// A group of scheduled actions sharing one execution context.
pub trait Worker: Send + Sync {
    /// Schedules `action` on this worker's execution context.
    fn schedule<F>(&self, action: F) -> Handle
    where
        F: FnOnce() + Send + 'static;

    /// Rejects further work and cancels every pending action exactly once.
    fn shutdown(&self);
}
