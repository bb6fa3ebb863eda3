//! [`Mouse`] – the kinematic mouse contract.
//!
//! The control facade never touches wheel physics directly. It reads the
//! pose, commands wheel speeds and teleports through this trait, so any
//! implementation (the bundled [`SimMouse`][crate::sim::SimMouse], a replay
//! mouse, a test double) can sit behind it.
//!
//! Every method takes `&self`: implementations synchronise internally so one
//! thread can integrate motion while another polls the pose.

use std::time::Duration;

use mms_types::geometry::{Angle, Cartesian};

/// A wheeled mouse whose pose evolves over simulated time.
///
/// Wheel speeds are in radians per second. Driving forward means a negative
/// left wheel and a positive right wheel, as the two motors face each other.
pub trait Mouse: Send + Sync {
    /// Pose translation at the start of the run.
    fn initial_translation(&self) -> Cartesian;

    fn current_translation(&self) -> Cartesian;

    /// Current heading, normalised to `[0, 2π)`, counter-clockwise from
    /// north.
    fn current_rotation(&self) -> Angle;

    /// Place the mouse at an exact pose without simulating the motion.
    fn teleport(&self, translation: Cartesian, rotation: Angle);

    fn set_wheel_speeds(&self, left: f64, right: f64);

    fn has_sensor(&self, name: &str) -> bool;

    /// Latest reading of the named sensor, `None` if there is no such sensor.
    fn read(&self, name: &str) -> Option<f64>;

    /// Nominal read duration of the named sensor.
    fn read_duration(&self, name: &str) -> Option<Duration>;

    /// Yaw rate in degrees per second, counter-clockwise positive.
    fn read_gyro(&self) -> f64;
}

/// Something that advances simulated time in fixed steps.
pub trait Integrator: Send + Sync {
    fn step(&self, dt: Duration);
}
