//! Run configuration – reads/writes `~/.mms/config.toml`.
//!
//! Every table is optional; missing keys take their defaults, so an empty
//! file is a valid 16×16 discrete run.
//!
//! ```toml
//! [sim]
//! sim_speed = 2.0
//!
//! [maze]
//! width = 8
//! height = 8
//!
//! [mouse]
//! initial_direction = "east"
//!
//! [[mouse.sensors]]
//! name = "front"
//! range = 0.4
//!
//! [run]
//! interface = "continuous"
//! lockstep = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mms_perception::{ReadingModel, SensorSpec};
use mms_types::geometry::{Angle, Cartesian};
use mms_types::{Direction, InterfaceMode, MmsError, SimParams};

/// Persisted run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sim: SimParams,
    #[serde(default)]
    pub maze: MazeConfig,
    #[serde(default)]
    pub mouse: MouseConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Size of the generated perimeter maze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeConfig {
    #[serde(default = "default_maze_side")]
    pub width: i32,
    #[serde(default = "default_maze_side")]
    pub height: i32,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            width: default_maze_side(),
            height: default_maze_side(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseConfig {
    /// Wheel radius, metres.
    #[serde(default = "default_wheel_radius")]
    pub wheel_radius: f64,
    /// Distance between the wheels, metres.
    #[serde(default = "default_wheel_base")]
    pub wheel_base: f64,
    #[serde(default = "default_initial_direction")]
    pub initial_direction: Direction,
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorConfig>,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            wheel_radius: default_wheel_radius(),
            wheel_base: default_wheel_base(),
            initial_direction: default_initial_direction(),
            sensors: default_sensors(),
        }
    }
}

/// One range sensor, angles in degrees and times in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub name: String,
    #[serde(default = "default_sensor_radius")]
    pub radius: f64,
    #[serde(default = "default_sensor_range")]
    pub range: f64,
    #[serde(default = "default_half_width_deg")]
    pub half_width_deg: f64,
    #[serde(default = "default_read_duration_ms")]
    pub read_duration_ms: u64,
    /// Offset in the mouse frame, `+y` forward.
    #[serde(default)]
    pub mount_x: f64,
    #[serde(default)]
    pub mount_y: f64,
    /// Counter-clockwise from the mouse heading.
    #[serde(default)]
    pub mount_direction_deg: f64,
    #[serde(default)]
    pub model: ReadingModel,
}

impl SensorConfig {
    fn new(name: &str, mount_x: f64, mount_direction_deg: f64) -> Self {
        Self {
            name: name.to_string(),
            radius: default_sensor_radius(),
            range: default_sensor_range(),
            half_width_deg: default_half_width_deg(),
            read_duration_ms: default_read_duration_ms(),
            mount_x,
            mount_y: 0.03,
            mount_direction_deg,
            model: ReadingModel::default(),
        }
    }

    pub fn to_spec(&self) -> SensorSpec {
        SensorSpec {
            radius: self.radius,
            range: self.range,
            half_width: Angle::from_degrees(self.half_width_deg),
            read_duration: Duration::from_millis(self.read_duration_ms),
            mount_position: Cartesian::new(self.mount_x, self.mount_y),
            mount_direction: Angle::from_degrees(self.mount_direction_deg),
            model: self.model,
        }
    }
}

/// What to run and for how long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_interface")]
    pub interface: InterfaceMode,
    /// Discrete moves, or continuous control frames, before the run stops.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Simulated time instead of wall-clock time.
    #[serde(default = "default_true")]
    pub lockstep: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            max_steps: default_max_steps(),
            lockstep: true,
        }
    }
}

fn default_maze_side() -> i32 {
    16
}
fn default_wheel_radius() -> f64 {
    0.02
}
fn default_wheel_base() -> f64 {
    0.08
}
fn default_initial_direction() -> Direction {
    Direction::North
}
fn default_sensors() -> Vec<SensorConfig> {
    vec![
        SensorConfig::new("front", 0.0, 0.0),
        SensorConfig::new("left", -0.02, 60.0),
        SensorConfig::new("right", 0.02, -60.0),
    ]
}
fn default_sensor_radius() -> f64 {
    0.005
}
fn default_sensor_range() -> f64 {
    0.3
}
fn default_half_width_deg() -> f64 {
    5.0
}
fn default_read_duration_ms() -> u64 {
    1
}
fn default_interface() -> InterfaceMode {
    InterfaceMode::Discrete
}
fn default_max_steps() -> usize {
    1024
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Reject configurations the simulator cannot run.
    pub fn validate(&self) -> Result<(), MmsError> {
        self.sim.validate()?;
        if self.maze.width < 1 || self.maze.height < 1 {
            return Err(MmsError::Config(format!(
                "maze must be at least 1x1, got {}x{}",
                self.maze.width, self.maze.height
            )));
        }
        if !(self.mouse.wheel_radius > 0.0 && self.mouse.wheel_base > 0.0) {
            return Err(MmsError::Config(
                "wheel radius and wheel base must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Return the path to `~/.mms/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".mms").join("config.toml")
}

/// Load the config at `path`, falling back to defaults when the file does
/// not exist. `MMS_*` overrides are applied either way.
pub fn load_or_default(path: &Path) -> Result<Config, MmsError> {
    let mut cfg = load_from(path)?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path. `None` if the file is missing.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, MmsError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        MmsError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| MmsError::Config(format!("failed to parse config: {e}")))?;
    Ok(Some(cfg))
}

/// Apply `MMS_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `MMS_MAZE_WIDTH` | `maze.width` |
/// | `MMS_MAZE_HEIGHT` | `maze.height` |
/// | `MMS_SIM_SPEED` | `sim.sim_speed` |
/// | `MMS_INTERFACE` | `run.interface` (`discrete` / `continuous`) |
/// | `MMS_MAX_STEPS` | `run.max_steps` |
/// | `MMS_LOCKSTEP` | `run.lockstep` (`true` / `false`) |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MMS_MAZE_WIDTH")
        && let Ok(width) = v.parse::<i32>()
    {
        cfg.maze.width = width;
    }
    if let Ok(v) = std::env::var("MMS_MAZE_HEIGHT")
        && let Ok(height) = v.parse::<i32>()
    {
        cfg.maze.height = height;
    }
    if let Ok(v) = std::env::var("MMS_SIM_SPEED")
        && let Ok(speed) = v.parse::<f64>()
    {
        cfg.sim.sim_speed = speed;
    }
    if let Ok(v) = std::env::var("MMS_INTERFACE") {
        match v.trim().to_ascii_lowercase().as_str() {
            "discrete" => cfg.run.interface = InterfaceMode::Discrete,
            "continuous" => cfg.run.interface = InterfaceMode::Continuous,
            _ => {}
        }
    }
    if let Ok(v) = std::env::var("MMS_MAX_STEPS")
        && let Ok(steps) = v.parse::<usize>()
    {
        cfg.run.max_steps = steps;
    }
    if let Ok(v) = std::env::var("MMS_LOCKSTEP")
        && let Ok(lockstep) = v.parse::<bool>()
    {
        cfg.run.lockstep = lockstep;
    }
}

/// Save the config to a specific path. A missing parent directory is
/// created and restricted to its owner; an existing one is left as is.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), MmsError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .map_err(|e| MmsError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                MmsError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| MmsError::Config(format!("failed to serialize config: {e}")))?;
    let write_err =
        |e: std::io::Error| MmsError::Config(format!("failed to write config at {}: {e}", path.display()));
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}
