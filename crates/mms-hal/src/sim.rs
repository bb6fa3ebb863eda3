//! [`SimMouse`] – simulated differential-drive mouse.
//!
//! The mouse integrates its pose from the commanded wheel speeds whenever
//! [`Integrator::step`] is called. It never advances on its own, so the same
//! type serves a real-time harness thread and a fully deterministic lockstep
//! test.
//!
//! # Kinematics
//!
//! The wheel motors face each other, so forward motion means a negative left
//! wheel speed and a positive right one. With wheel radius `r`, wheel base
//! `b` and wheel speeds `ωl`, `ωr` (rad/s):
//!
//! | Quantity | Formula |
//! |---|---|
//! | forward speed `v` | `r · (ωr − ωl) / 2` |
//! | yaw rate `Ω` (CCW) | `−r · (ωl + ωr) / b` |
//!
//! Each step uses arc integration, which is exact for constant wheel speeds.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mms_hal::mouse::{Integrator, Mouse};
//! use mms_hal::sim::SimMouse;
//! use mms_maze::MazeBuilder;
//! use mms_types::SimParams;
//!
//! let maze = Arc::new(MazeBuilder::bordered(4, 4).build().unwrap());
//! let mouse = SimMouse::builder(maze, &SimParams::default()).build().unwrap();
//!
//! let start = mouse.current_translation();
//! mouse.set_wheel_speeds(-10.0, 10.0);
//! mouse.step(Duration::from_millis(100));
//! assert!(mouse.current_translation().y > start.y);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use mms_maze::Maze;
use mms_perception::{RangeSensor, SensorSpec};
use mms_types::geometry::{Angle, Cartesian};
use mms_types::{Direction, MmsError, SimParams};

use crate::mouse::{Integrator, Mouse};
use crate::sensors::SensorRegistry;

const DEFAULT_WHEEL_RADIUS: f64 = 0.02;
const DEFAULT_WHEEL_BASE: f64 = 0.08;

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct KinematicState {
    translation: Cartesian,
    rotation: Angle,
    left_speed: f64,
    right_speed: f64,
    sensors: SensorRegistry,
}

/// A simulated mouse driving through a [`Maze`].
#[derive(Debug)]
pub struct SimMouse {
    maze: Arc<Maze>,
    tile_length: f64,
    wheel_radius: f64,
    wheel_base: f64,
    initial_translation: Cartesian,
    state: Mutex<KinematicState>,
}

impl SimMouse {
    /// Start building a mouse for `maze` using the tile geometry of
    /// `params`.
    pub fn builder(maze: Arc<Maze>, params: &SimParams) -> SimMouseBuilder {
        SimMouseBuilder {
            maze,
            tile_length: params.tile_length(),
            wheel_radius: DEFAULT_WHEEL_RADIUS,
            wheel_base: DEFAULT_WHEEL_BASE,
            initial_direction: Direction::North,
            sensors: Vec::new(),
        }
    }

    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    pub fn wheel_base(&self) -> f64 {
        self.wheel_base
    }

    /// Names of the mounted sensors, sorted.
    pub fn sensor_names(&self) -> Vec<String> {
        self.lock().sensors.names()
    }

    /// Current commanded wheel speeds `(left, right)`.
    pub fn wheel_speeds(&self) -> (f64, f64) {
        let state = self.lock();
        (state.left_speed, state.right_speed)
    }

    fn lock(&self) -> MutexGuard<'_, KinematicState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn forward_speed(&self, left: f64, right: f64) -> f64 {
        self.wheel_radius * (right - left) / 2.0
    }

    fn yaw_rate(&self, left: f64, right: f64) -> f64 {
        -self.wheel_radius * (left + right) / self.wheel_base
    }

    fn refresh_sensors(&self, state: &mut KinematicState) {
        let (translation, rotation) = (state.translation, state.rotation);
        state
            .sensors
            .update_all(translation, rotation, &self.maze, self.tile_length);
    }
}

impl Mouse for SimMouse {
    fn initial_translation(&self) -> Cartesian {
        self.initial_translation
    }

    fn current_translation(&self) -> Cartesian {
        self.lock().translation
    }

    fn current_rotation(&self) -> Angle {
        self.lock().rotation
    }

    fn teleport(&self, translation: Cartesian, rotation: Angle) {
        let mut state = self.lock();
        state.translation = translation;
        state.rotation = rotation.normalized();
        self.refresh_sensors(&mut state);
    }

    fn set_wheel_speeds(&self, left: f64, right: f64) {
        let mut state = self.lock();
        state.left_speed = left;
        state.right_speed = right;
    }

    fn has_sensor(&self, name: &str) -> bool {
        self.lock().sensors.contains(name)
    }

    fn read(&self, name: &str) -> Option<f64> {
        self.lock().sensors.read(name)
    }

    fn read_duration(&self, name: &str) -> Option<Duration> {
        self.lock().sensors.read_duration(name)
    }

    fn read_gyro(&self) -> f64 {
        let state = self.lock();
        self.yaw_rate(state.left_speed, state.right_speed).to_degrees()
    }
}

impl Integrator for SimMouse {
    fn step(&self, dt: Duration) {
        let dt = dt.as_secs_f64();
        let mut state = self.lock();
        let v = self.forward_speed(state.left_speed, state.right_speed);
        let omega = self.yaw_rate(state.left_speed, state.right_speed);
        if v == 0.0 && omega == 0.0 {
            return;
        }

        let theta0 = state.rotation.radians();
        let theta1 = theta0 + omega * dt;
        let delta = if omega.abs() < 1e-12 {
            Angle::from_radians(theta0).heading_vector() * (v * dt)
        } else {
            // ∫ v·(−sin θ, cos θ) dt with θ linear in t.
            Cartesian::new(
                v * (theta1.cos() - theta0.cos()) / omega,
                v * (theta1.sin() - theta0.sin()) / omega,
            )
        };
        state.translation += delta;
        state.rotation = Angle::from_radians(theta1).normalized();
        self.refresh_sensors(&mut state);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder for [`SimMouse`]. The mouse starts in the centre of tile `(0, 0)`.
pub struct SimMouseBuilder {
    maze: Arc<Maze>,
    tile_length: f64,
    wheel_radius: f64,
    wheel_base: f64,
    initial_direction: Direction,
    sensors: Vec<(String, SensorSpec)>,
}

impl SimMouseBuilder {
    pub fn with_wheel_radius(mut self, radius: f64) -> Self {
        self.wheel_radius = radius;
        self
    }

    /// Distance between the two wheels.
    pub fn with_wheel_base(mut self, base: f64) -> Self {
        self.wheel_base = base;
        self
    }

    pub fn with_initial_direction(mut self, direction: Direction) -> Self {
        self.initial_direction = direction;
        self
    }

    /// Mount a range sensor under `name`.
    pub fn with_sensor(mut self, name: impl Into<String>, spec: SensorSpec) -> Self {
        self.sensors.push((name.into(), spec));
        self
    }

    /// Consume the builder and return the mouse with fresh sensor readings.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::InvalidParameter`] for non-positive wheel
    /// dimensions or an invalid sensor spec.
    pub fn build(self) -> Result<SimMouse, MmsError> {
        for (name, value) in [("wheel_radius", self.wheel_radius), ("wheel_base", self.wheel_base)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(MmsError::InvalidParameter {
                    name: name.to_string(),
                    details: format!("must be positive, got {value}"),
                });
            }
        }

        let mut sensors = SensorRegistry::new();
        for (name, spec) in self.sensors {
            sensors.register(name, RangeSensor::new(spec)?);
        }

        let half = self.tile_length / 2.0;
        let initial_translation = Cartesian::new(half, half);
        let mouse = SimMouse {
            maze: self.maze,
            tile_length: self.tile_length,
            wheel_radius: self.wheel_radius,
            wheel_base: self.wheel_base,
            initial_translation,
            state: Mutex::new(KinematicState {
                translation: initial_translation,
                rotation: self.initial_direction.canonical_angle(),
                left_speed: 0.0,
                right_speed: 0.0,
                sensors,
            }),
        };
        {
            let mut state = mouse.lock();
            mouse.refresh_sensors(&mut state);
        }
        debug!(
            sensors = mouse.sensor_names().len(),
            direction = %self.initial_direction,
            "simulated mouse built"
        );
        Ok(mouse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mms_maze::MazeBuilder;
    use mms_perception::ReadingModel;

    fn mouse() -> SimMouse {
        let maze = Arc::new(MazeBuilder::bordered(5, 5).build().unwrap());
        SimMouse::builder(maze, &SimParams::default())
            .with_sensor(
                "front",
                SensorSpec {
                    radius: 0.005,
                    range: 0.5,
                    half_width: Angle::from_degrees(3.0),
                    read_duration: Duration::from_millis(3),
                    mount_position: Cartesian::new(0.0, 0.03),
                    mount_direction: Angle::from_degrees(0.0),
                    model: ReadingModel::NearestHit,
                },
            )
            .build()
            .unwrap()
    }

    #[test]
    fn starts_centred_in_first_tile_facing_north() {
        let m = mouse();
        assert_eq!(m.current_translation(), m.initial_translation());
        assert!((m.initial_translation().x - 0.09).abs() < 1e-12);
        assert_eq!(m.current_rotation().radians(), 0.0);
    }

    #[test]
    fn opposite_wheel_speeds_drive_straight_ahead() {
        let m = mouse();
        m.set_wheel_speeds(-10.0, 10.0);
        m.step(Duration::from_millis(50));
        // v = 0.02 * 20 / 2 = 0.2 m/s for 0.05 s.
        let p = m.current_translation();
        assert!((p.y - (0.09 + 0.01)).abs() < 1e-12);
        assert!((p.x - 0.09).abs() < 1e-12);
        assert_eq!(m.read_gyro(), 0.0);
    }

    #[test]
    fn equal_positive_speeds_turn_clockwise_in_place() {
        let m = mouse();
        m.set_wheel_speeds(5.0, 5.0);
        assert!(m.read_gyro() < 0.0);
        m.step(Duration::from_millis(10));
        let p = m.current_translation();
        assert!((p.x - 0.09).abs() < 1e-12 && (p.y - 0.09).abs() < 1e-12);
        // Turning right from north wraps below 360°.
        assert!(m.current_rotation().degrees() > 270.0);
    }

    #[test]
    fn arc_integration_matches_closed_form() {
        let m = mouse();
        // Left wheel slower than right: forward with a CCW turn.
        m.set_wheel_speeds(-5.0, 15.0);
        let v = 0.02 * 20.0 / 2.0;
        let omega = -0.02 * 10.0 / 0.08;
        m.step(Duration::from_millis(200));
        let theta: f64 = omega * 0.2;
        let expected_x = 0.09 + v * (theta.cos() - 1.0) / omega;
        let expected_y = 0.09 + v * theta.sin() / omega;
        let p = m.current_translation();
        assert!((p.x - expected_x).abs() < 1e-12);
        assert!((p.y - expected_y).abs() < 1e-12);
    }

    #[test]
    fn teleport_normalises_rotation_and_refreshes_sensors() {
        let m = mouse();
        let before = m.read("front").unwrap();
        // Face the west boundary from the first tile.
        m.teleport(m.initial_translation(), Angle::from_degrees(-270.0));
        assert!((m.current_rotation().degrees() - 90.0).abs() < 1e-9);
        let after = m.read("front").unwrap();
        assert!(after > before);
    }

    #[test]
    fn sensor_lookup_by_name() {
        let m = mouse();
        assert!(m.has_sensor("front"));
        assert!(!m.has_sensor("rear"));
        assert_eq!(m.read("rear"), None);
        assert_eq!(m.read_duration("front"), Some(Duration::from_millis(3)));
        assert_eq!(m.sensor_names(), vec!["front".to_string()]);
    }

    #[test]
    fn zero_wheel_base_is_rejected() {
        let maze = Arc::new(MazeBuilder::bordered(1, 1).build().unwrap());
        let result = SimMouse::builder(maze, &SimParams::default())
            .with_wheel_base(0.0)
            .build();
        assert!(matches!(result, Err(MmsError::InvalidParameter { .. })));
    }
}
