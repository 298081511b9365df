use super::ParallelScheduler;
use crate::error::{ActionFault, Error};
use crate::hooks::ErrorHooks;

use std::sync::Arc;
use std::thread;

/// Default prefix for lane thread names.
const DEFAULT_THREAD_NAME: &str = "parallel";

/// Builder for configuring and creating a [`ParallelScheduler`].
///
/// # Examples
///
/// ```rust
/// use rillet::SchedulerBuilder;
///
/// let scheduler = SchedulerBuilder::new()
///     .lanes(4)
///     .thread_name("io")
///     .on_error_dropped(|fault| eprintln!("dropped: {fault}"))
///     .build()
///     .unwrap();
///
/// assert_eq!(scheduler.parallelism(), 4);
/// ```
pub struct SchedulerBuilder {
    /// Number of lanes.
    lanes: usize,

    /// Prefix of lane thread names.
    thread_name: String,

    /// Routing for faults raised by scheduled actions.
    hooks: ErrorHooks,
}

impl SchedulerBuilder {
    /// Creates a new `SchedulerBuilder` with default configuration.
    ///
    /// By default, the number of lanes is set to the number of available
    /// logical CPUs, falling back to `1` if unavailable. Faults are logged
    /// and none is fatal.
    pub fn new() -> Self {
        let lanes = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            lanes,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            hooks: ErrorHooks::default(),
        }
    }

    /// Sets the number of lanes. Validated by [`build`](Self::build).
    pub fn lanes(mut self, n: usize) -> Self {
        self.lanes = n;
        self
    }

    /// Sets the prefix of lane thread names. Threads are named
    /// `<prefix>-1`, `<prefix>-2`, ...
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    /// Sets the sink receiving recoverable faults of scheduled actions.
    pub fn on_error_dropped<F>(mut self, sink: F) -> Self
    where
        F: Fn(ActionFault) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_sink(Arc::new(sink));
        self
    }

    /// Sets the predicate classifying faults as fatal.
    ///
    /// A fatal fault is re-raised on its lane thread, which terminates the
    /// lane instead of reporting to the sink.
    pub fn fatal_when<F>(mut self, is_fatal: F) -> Self
    where
        F: Fn(&ActionFault) -> bool + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_classifier(Arc::new(is_fatal));
        self
    }

    /// Builds the scheduler and starts its lanes.
    ///
    /// Fails with [`Error::InvalidArgument`] if the lane count is zero.
    pub fn build(self) -> Result<ParallelScheduler, Error> {
        if self.lanes == 0 {
            return Err(Error::InvalidArgument {
                name: "lanes",
                value: self.lanes,
            });
        }

        Ok(ParallelScheduler::from_parts(
            self.lanes,
            self.thread_name,
            self.hooks,
        ))
    }
}

impl Default for SchedulerBuilder {
    /// Creates a default `SchedulerBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
