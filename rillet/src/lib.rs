//! # Rillet
//!
//! **Rillet** is the concurrency substrate of a reactive-stream operator
//! library. It provides two lock-free coordination engines:
//!
//! - a **multi-lane scheduler**, [`ParallelScheduler`], running independent
//!   units of work on a fixed pool of single-thread lanes, with race-safe
//!   start/shutdown and cancellation,
//! - a **connection gate**, [`ConnectGate`], connecting a shared publisher
//!   once a configured number of subscribers have attached.
//!
//! ## Quick Start
//!
//! ```rust
//! use rillet::{Disposable, ParallelScheduler, Scheduler, Worker};
//! use std::sync::mpsc;
//!
//! let scheduler = ParallelScheduler::new(4).unwrap();
//!
//! // Fire and forget.
//! let (tx, rx) = mpsc::channel();
//! scheduler.schedule(move || tx.send(42).unwrap());
//! assert_eq!(rx.recv().unwrap(), 42);
//!
//! // A worker cancels everything it scheduled at once.
//! let worker = scheduler.create_worker();
//! let handle = worker.schedule(|| println!("maybe"));
//! worker.shutdown();
//! # let _ = handle.is_disposed();
//! ```
//!
//! ## Failures
//!
//! A panicking action is caught at the lane boundary and routed to the
//! scheduler's error sink; see [`SchedulerBuilder::on_error_dropped`] and
//! [`SchedulerBuilder::fatal_when`].

mod disposable;
mod error;
mod hooks;
mod utils;

pub mod publisher;
pub mod scheduler;

pub use disposable::{Disposable, Handle};
pub use error::{ActionFault, Error};
pub use publisher::{ConnectGate, ConnectablePublisher, Publisher};
pub use scheduler::{ParallelScheduler, ParallelWorker, Scheduler, SchedulerBuilder, Worker};
