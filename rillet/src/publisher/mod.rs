//! Publisher contracts consumed by the crate, and the connection gate.
//!
//! The operator library owns the actual publishers; this module only names
//! the two operations [`ConnectGate`] needs from them.

mod connect_gate;

pub use connect_gate::ConnectGate;

use crate::disposable::Handle;

/// Callback receiving the handle of an established connection.
pub type OnConnect = dyn Fn(Handle) + Send + Sync;

/// A source that subscribers of type `S` can attach to.
pub trait Publisher<S>: Send + Sync {
    /// Attaches `subscriber` to this publisher.
    fn subscribe(&self, subscriber: S);
}

/// A publisher that only starts emitting once explicitly connected.
pub trait ConnectablePublisher<S>: Publisher<S> {
    /// Connects to the upstream source.
    ///
    /// `on_connect` receives a handle that tears the connection down when
    /// disposed.
    fn connect(&self, on_connect: &OnConnect);
}
