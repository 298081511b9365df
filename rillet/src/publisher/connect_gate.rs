use super::{ConnectablePublisher, OnConnect, Publisher};
use crate::disposable::Handle;
use crate::error::Error;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Connects a [`ConnectablePublisher`] once `n` subscribers have attached.
///
/// Every [`subscribe`](Publisher::subscribe) is forwarded to the source
/// first and then counts down. The call that brings the count from 1 to 0
/// connects the source, exactly once, whichever thread it runs on. Later
/// subscribers are still forwarded but never reconnect: the gate is one-shot
/// and has no reset.
///
/// # Examples
///
/// ```rust
/// use rillet::{ConnectGate, ConnectablePublisher, Handle, Publisher};
/// use rillet::publisher::OnConnect;
/// use std::sync::Arc;
///
/// struct Source;
/// struct Connection;
///
/// impl rillet::Disposable for Connection {
///     fn dispose(&self) {}
///     fn is_disposed(&self) -> bool { false }
/// }
///
/// impl Publisher<&'static str> for Source {
///     fn subscribe(&self, name: &'static str) {
///         println!("{name} subscribed");
///     }
/// }
///
/// impl ConnectablePublisher<&'static str> for Source {
///     fn connect(&self, on_connect: &OnConnect) {
///         on_connect(Handle::new(Arc::new(Connection)));
///     }
/// }
///
/// let gate = ConnectGate::new(Arc::new(Source), 2, |_connection| println!("connected")).unwrap();
/// gate.subscribe("first");
/// gate.subscribe("second"); // connects
/// assert_eq!(gate.remaining(), 0);
/// ```
pub struct ConnectGate<P, S> {
    /// The gated publisher, shared with every subscriber.
    source: Arc<P>,

    /// Subscriptions still needed before connecting. Never below zero.
    remaining: AtomicUsize,

    /// Receives the connection handle.
    on_connect: Arc<OnConnect>,

    _subscriber: PhantomData<fn(S)>,
}

impl<P, S> ConnectGate<P, S>
where
    P: ConnectablePublisher<S>,
{
    /// Creates a gate connecting `source` after `n` subscriptions.
    ///
    /// Fails with [`Error::InvalidArgument`] if `n == 0`.
    pub fn new<F>(source: Arc<P>, n: usize, on_connect: F) -> Result<Self, Error>
    where
        F: Fn(Handle) + Send + Sync + 'static,
    {
        if n == 0 {
            return Err(Error::InvalidArgument {
                name: "n",
                value: n,
            });
        }

        Ok(Self {
            source,
            remaining: AtomicUsize::new(n),
            on_connect: Arc::new(on_connect),
            _subscriber: PhantomData,
        })
    }

    /// Subscriptions still needed before the gate connects.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Returns `true` once `n` subscriptions have counted down.
    ///
    /// The winning subscriber may still be inside `connect` when this turns
    /// `true`; it does not mean the source is connected yet.
    pub fn threshold_reached(&self) -> bool {
        self.remaining() == 0
    }

    /// The gated publisher.
    pub fn upstream(&self) -> &Arc<P> {
        &self.source
    }

    /// Counts one subscription down. Returns `true` for the single call that
    /// reached zero.
    fn count_down(&self) -> bool {
        let mut current = self.remaining.load(Ordering::Acquire);

        loop {
            if current == 0 {
                return false;
            }

            match self.remaining.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current == 1,
                Err(actual) => current = actual,
            }
        }
    }
}

impl<P, S> Publisher<S> for ConnectGate<P, S>
where
    P: ConnectablePublisher<S>,
{
    fn subscribe(&self, subscriber: S) {
        self.source.subscribe(subscriber);

        if self.count_down() {
            tracing::debug!("subscriber threshold reached, connecting source");
            self.source.connect(&*self.on_connect);
        }
    }
}

impl<P, S> fmt::Debug for ConnectGate<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectGate")
            .field("remaining", &self.remaining.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
