//! [`Clock`] – injectable time source for motion loops and sensor reads.
//!
//! Motion loops sleep one tick per iteration and sensor reads are timed.
//! Both go through this trait so tests and headless runs can substitute a
//! clock that advances simulated time instead of wall time.

use std::time::{Duration, Instant};

/// A monotonic time source that can also block the caller.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Block the caller for `duration` of this clock's time.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
