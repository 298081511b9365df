//! Execution lanes.
//!
//! A lane is one OS thread draining a FIFO queue of [`LaneTask`]s. The
//! scheduler owns a fixed array of lanes built by a [`LaneFactory`].

mod core;
mod factory;
mod state;
mod task;

pub(crate) use self::core::Lane;
pub(crate) use factory::LaneFactory;
pub(crate) use task::{Job, LaneTask};
