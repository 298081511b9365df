use std::any::Any;
use std::fmt;

/// Errors reported by `rillet` constructors and execution lanes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A count that must be strictly positive was zero.
    #[error("{name} > 0 required but it was {value}")]
    InvalidArgument {
        /// Name of the offending parameter.
        name: &'static str,
        /// The value that was supplied.
        value: usize,
    },

    /// The execution lane no longer accepts work.
    #[error("execution lane rejected the submission")]
    Rejected,
}

/// A panic raised by a scheduled action.
///
/// The lane catches the unwind and hands its payload to the error sink of
/// the owning scheduler.
pub struct ActionFault {
    payload: Box<dyn Any + Send + 'static>,
}

impl ActionFault {
    /// Wraps a payload returned by [`std::panic::catch_unwind`].
    pub fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self { payload }
    }

    /// Returns the panic message when the payload is a `&str` or a `String`.
    pub fn message(&self) -> Option<&str> {
        if let Some(s) = self.payload.downcast_ref::<&'static str>() {
            return Some(s);
        }

        self.payload.downcast_ref::<String>().map(String::as_str)
    }

    /// Returns the raw panic payload.
    pub fn payload(&self) -> &(dyn Any + Send + 'static) {
        &*self.payload
    }

    /// Consumes the fault and returns the payload, e.g. to resume unwinding.
    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.payload
    }
}

impl fmt::Debug for ActionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionFault")
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for ActionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "scheduled action panicked: {msg}"),
            None => f.write_str("scheduled action panicked with a non-string payload"),
        }
    }
}

impl std::error::Error for ActionFault {}
