use crate::error::ActionFault;

use std::fmt;
use std::sync::Arc;

/// Callback receiving faults that have no caller left to report to.
pub(crate) type ErrorSink = Arc<dyn Fn(ActionFault) + Send + Sync>;

/// Predicate deciding whether a fault must terminate its lane.
pub(crate) type FatalClassifier = Arc<dyn Fn(&ActionFault) -> bool + Send + Sync>;

/// Routing for failures raised off any observable call stack, shared by
/// every lane of a scheduler. Fatal faults take the lane thread down; the
/// rest go to the sink.
#[derive(Clone)]
pub(crate) struct ErrorHooks {
    sink: ErrorSink,
    is_fatal: FatalClassifier,
}

impl ErrorHooks {
    pub(crate) fn with_sink(mut self, sink: ErrorSink) -> Self {
        self.sink = sink;
        self
    }

    pub(crate) fn with_classifier(mut self, is_fatal: FatalClassifier) -> Self {
        self.is_fatal = is_fatal;
        self
    }

    /// Returns `true` if `fault` must not be swallowed.
    pub(crate) fn is_fatal(&self, fault: &ActionFault) -> bool {
        (self.is_fatal)(fault)
    }

    /// Hands a recoverable fault to the sink.
    pub(crate) fn on_error_dropped(&self, fault: ActionFault) {
        (self.sink)(fault)
    }
}

impl Default for ErrorHooks {
    /// Logs every fault at `error` level and treats none as fatal.
    fn default() -> Self {
        Self {
            sink: Arc::new(|fault: ActionFault| {
                tracing::error!(error = %fault, "unsignalled error dropped");
            }),
            is_fatal: Arc::new(|_: &ActionFault| false),
        }
    }
}

impl fmt::Debug for ErrorHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHooks").finish_non_exhaustive()
    }
}
