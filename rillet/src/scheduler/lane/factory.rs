use super::core::Lane;
use crate::hooks::ErrorHooks;

use parking_lot::Mutex;

use std::sync::atomic::{AtomicU64, Ordering};

/// Builds the lanes of one scheduler.
///
/// The factory owns the thread-name counter, so lane threads of a scheduler
/// are numbered `<prefix>-1`, `<prefix>-2`, ... across restarts. It also
/// remembers every lane it built until that lane has been joined or its
/// thread has exited.
pub(crate) struct LaneFactory {
    prefix: String,
    counter: AtomicU64,
    hooks: ErrorHooks,
    spawned: Mutex<Vec<Lane>>,
}

impl LaneFactory {
    pub(crate) fn new(prefix: String, hooks: ErrorHooks) -> Self {
        Self {
            prefix,
            counter: AtomicU64::new(0),
            hooks,
            spawned: Mutex::new(Vec::new()),
        }
    }

    /// Starts `n` fresh lanes.
    pub(crate) fn spawn_set(&self, n: usize) -> Vec<Lane> {
        let lanes: Vec<Lane> = (0..n)
            .map(|_| {
                let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
                Lane::spawn(format!("{}-{}", self.prefix, id), self.hooks.clone())
            })
            .collect();

        let mut spawned = self.spawned.lock();
        spawned.retain(|lane| !lane.is_finished());
        spawned.extend(lanes.iter().cloned());
        drop(spawned);

        lanes
    }

    /// Joins every terminated lane built so far.
    ///
    /// Lanes still running stay registered for a later call.
    pub(crate) fn join_terminated(&self) {
        let terminated: Vec<Lane> = {
            let mut spawned = self.spawned.lock();
            let (terminated, live) = spawned.drain(..).partition(Lane::is_terminated);
            *spawned = live;
            terminated
        };

        for lane in &terminated {
            lane.join();
        }
    }
}
