use std::fmt;
use std::sync::Arc;

/// A resource or unit of work that can be cancelled.
///
/// Disposal is idempotent: calling [`dispose`](Self::dispose) more than once
/// has the same effect as calling it once.
pub trait Disposable: Send + Sync {
    /// Cancels the underlying work or releases the underlying resource.
    fn dispose(&self);

    /// Returns `true` once the disposable has been cancelled.
    fn is_disposed(&self) -> bool;
}

/// An opaque cancellable token returned to callers.
///
/// A `Handle` either wraps a live [`Disposable`] or is *rejected*: the
/// inert, already-cancelled handle returned when a scheduler or worker
/// refuses a submission. Cloning a handle shares the underlying disposable.
#[derive(Clone)]
pub struct Handle {
    inner: Option<Arc<dyn Disposable>>,
}

impl Handle {
    /// Wraps a shared disposable.
    pub fn new<D>(disposable: Arc<D>) -> Self
    where
        D: Disposable + 'static,
    {
        Self {
            inner: Some(disposable),
        }
    }

    /// Returns the inert handle used for rejected submissions.
    pub fn rejected() -> Self {
        Self { inner: None }
    }

    /// Returns `true` if this handle was produced by a rejected submission.
    pub fn is_rejected(&self) -> bool {
        self.inner.is_none()
    }
}

impl Disposable for Handle {
    fn dispose(&self) {
        if let Some(inner) = &self.inner {
            inner.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.inner.as_ref().is_none_or(|inner| inner.is_disposed())
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("rejected", &self.is_rejected())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
