//! Per-task lifecycle for worker submissions.
//!
//! [`WorkerTask`] is the lock-free state machine behind every handle a
//! [`ParallelWorker`](crate::ParallelWorker) returns.

mod core;
mod state;

pub(crate) use self::core::WorkerTask;
