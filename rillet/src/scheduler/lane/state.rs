/// Lane task is waiting in its lane's queue.
pub(crate) const QUEUED: usize = 0;

/// Lane task is being executed by its lane thread.
///
/// At most one thread may observe this state for a given task.
pub(crate) const RUNNING: usize = 1;

/// Lane task has run to completion, normally or by panicking.
pub(crate) const COMPLETED: usize = 2;

/// Lane task was cancelled before or while running.
///
/// A task cancelled while `QUEUED` is skipped by its lane.
pub(crate) const CANCELLED: usize = 3;
