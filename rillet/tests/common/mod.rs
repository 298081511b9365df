#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

/// Default deadline for anything a test waits on.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Installs a test-friendly tracing subscriber, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }

    condition()
}
