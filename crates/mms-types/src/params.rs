//! [`SimParams`] – run-wide simulation parameters.
//!
//! Every field has a serde default so a partial `[sim]` table in a TOML file
//! fills in the rest. Call [`SimParams::validate`] after loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Color, MmsError};

/// Simulation parameters shared by the facade, the simulated mouse and the
/// harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Length of one wall segment, in metres.
    #[serde(default = "default_wall_length")]
    pub wall_length: f64,

    /// Thickness of a wall, in metres. A tile is `wall_length + wall_width`
    /// wide.
    #[serde(default = "default_wall_width")]
    pub wall_width: f64,

    /// Sensor polling rate; a continuous-mode read always takes at least one
    /// frame period.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    /// Tick length of every motion and pause loop.
    #[serde(default = "default_min_sleep_duration_ms")]
    pub min_sleep_duration_ms: u64,

    /// Wheel speed used by discrete moves at full fraction, rad/s.
    #[serde(default = "default_max_wheel_speed")]
    pub max_wheel_speed: f64,

    /// Fraction of `max_wheel_speed` used by discrete moves, in `(0, 1]`.
    #[serde(default = "default_wheel_speed_fraction")]
    pub wheel_speed_fraction: f64,

    /// Initial simulation speed multiplier.
    #[serde(default = "default_sim_speed")]
    pub sim_speed: f64,

    /// Mirror every wall (un)declaration onto the neighbouring tile.
    #[serde(default = "default_true")]
    pub declare_both_wall_halves: bool,

    /// Allow the algorithm to toggle tile fog.
    #[serde(default)]
    pub algorithm_controls_tile_fog: bool,

    /// Warn when a sensor read overruns its nominal read duration.
    #[serde(default)]
    pub print_late_sensor_reads: bool,

    /// Declare the observed wall on every discrete wall check.
    #[serde(default = "default_true")]
    pub discrete_interface_declare_wall_on_read: bool,

    /// Color a tile returns to when its annotation is cleared.
    #[serde(default)]
    pub tile_base_color: Color,
}

fn default_wall_length() -> f64 {
    0.168
}
fn default_wall_width() -> f64 {
    0.012
}
fn default_frame_rate() -> f64 {
    60.0
}
fn default_min_sleep_duration_ms() -> u64 {
    5
}
fn default_max_wheel_speed() -> f64 {
    30.0
}
fn default_wheel_speed_fraction() -> f64 {
    1.0
}
fn default_sim_speed() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            wall_length: default_wall_length(),
            wall_width: default_wall_width(),
            frame_rate: default_frame_rate(),
            min_sleep_duration_ms: default_min_sleep_duration_ms(),
            max_wheel_speed: default_max_wheel_speed(),
            wheel_speed_fraction: default_wheel_speed_fraction(),
            sim_speed: default_sim_speed(),
            declare_both_wall_halves: true,
            algorithm_controls_tile_fog: false,
            print_late_sensor_reads: false,
            discrete_interface_declare_wall_on_read: true,
            tile_base_color: Color::default(),
        }
    }
}

impl SimParams {
    /// Side length of one tile: wall length plus wall width.
    pub fn tile_length(&self) -> f64 {
        self.wall_length + self.wall_width
    }

    pub fn min_sleep(&self) -> Duration {
        Duration::from_millis(self.min_sleep_duration_ms)
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate)
    }

    /// Discrete-move wheel speed before the live sim-speed multiplier.
    pub fn discrete_wheel_speed(&self) -> f64 {
        self.max_wheel_speed * self.wheel_speed_fraction
    }

    /// Reject parameter sets the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<(), MmsError> {
        let positive = [
            ("wall_length", self.wall_length),
            ("frame_rate", self.frame_rate),
            ("max_wheel_speed", self.max_wheel_speed),
            ("sim_speed", self.sim_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MmsError::InvalidParameter {
                    name: name.to_string(),
                    details: format!("must be a positive number, got {value}"),
                });
            }
        }
        if !(self.wall_width.is_finite() && self.wall_width >= 0.0) {
            return Err(MmsError::InvalidParameter {
                name: "wall_width".to_string(),
                details: format!("must be non-negative, got {}", self.wall_width),
            });
        }
        if !(self.wheel_speed_fraction > 0.0 && self.wheel_speed_fraction <= 1.0) {
            return Err(MmsError::InvalidParameter {
                name: "wheel_speed_fraction".to_string(),
                details: format!("must lie in (0, 1], got {}", self.wheel_speed_fraction),
            });
        }
        if self.min_sleep_duration_ms == 0 {
            return Err(MmsError::InvalidParameter {
                name: "min_sleep_duration_ms".to_string(),
                details: "must be at least 1 ms".to_string(),
            });
        }
        Ok(())
    }
}
