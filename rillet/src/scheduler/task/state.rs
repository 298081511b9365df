/// Task is registered with its worker but no lane token is attached yet.
pub(crate) const UNBOUND: usize = 0;

/// The lane token is attached and published in the task's token cell.
pub(crate) const BOUND: usize = 1;

/// The action ran to completion. Terminal.
pub(crate) const FINISHED: usize = 2;

/// The task was disposed or its worker shut down. Terminal.
pub(crate) const CANCELLED: usize = 3;

/// Returns `true` for states no transition may leave.
pub(crate) fn is_terminal(state: usize) -> bool {
    state == FINISHED || state == CANCELLED
}
