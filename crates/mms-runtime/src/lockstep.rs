//! [`LockstepClock`] – simulated time that advances only when slept on.
//!
//! Every `sleep(d)` steps the registered integrators by `d` before
//! returning, so a motion loop driving a [`SimMouse`][mms_hal::SimMouse]
//! behaves exactly as in real time but runs as fast as the CPU allows and
//! is fully deterministic.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mms_hal::Integrator;
use mms_kernel::Clock;

/// A clock driven by its own `sleep` calls.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use mms_kernel::Clock;
/// use mms_runtime::lockstep::LockstepClock;
///
/// let clock = LockstepClock::new();
/// clock.sleep(Duration::from_millis(5));
/// clock.sleep(Duration::from_millis(5));
/// assert_eq!(clock.now(), Duration::from_millis(10));
/// ```
#[derive(Default)]
pub struct LockstepClock {
    now: Mutex<Duration>,
    integrators: Vec<Arc<dyn Integrator>>,
}

impl LockstepClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step `integrator` on every sleep.
    pub fn with_integrator(mut self, integrator: Arc<dyn Integrator>) -> Self {
        self.integrators.push(integrator);
        self
    }
}

impl Clock for LockstepClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        for integrator in &self.integrators {
            integrator.step(duration);
        }
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += duration;
    }
}
