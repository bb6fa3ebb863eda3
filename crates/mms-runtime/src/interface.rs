//! [`MouseInterface`] – the control surface handed to navigation algorithms.
//!
//! An algorithm declares one [`InterfaceMode`] per run and then drives the
//! mouse through it:
//!
//! * **discrete** – `move_forward`, `turn_left`, `turn_right`,
//!   `turn_around` and the `wall_*` queries. Each move runs a closed loop
//!   that commands wheel speeds, sleeps one tick and re-checks the pose
//!   until the destination is reached, then snaps the mouse exactly onto it.
//! * **continuous** – `set_wheel_speeds`, `read` and `read_gyro`.
//!
//! Calling an operation of the other mode fails with
//! [`MmsError::ModeViolation`], stops the wheels, raises the quit flag and
//! is published as an alert. That ends the run: every mode-specific call
//! afterwards fails with [`MmsError::RunTerminated`]. Invalid annotation input (unknown tile, color or direction) is
//! logged and ignored.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mms_hal::SimMouse;
//! use mms_kernel::SimState;
//! use mms_maze::MazeBuilder;
//! use mms_runtime::interface::MouseInterface;
//! use mms_runtime::lockstep::LockstepClock;
//! use mms_runtime::overlay::MazeOverlay;
//! use mms_types::{Cell, Direction, InterfaceMode, SimParams};
//!
//! let params = SimParams::default();
//! let maze = Arc::new(MazeBuilder::bordered(4, 4).build().unwrap());
//! let mouse = Arc::new(SimMouse::builder(maze.clone(), &params).build().unwrap());
//! let clock = Arc::new(LockstepClock::new().with_integrator(mouse.clone()));
//!
//! let mi = MouseInterface::new(
//!     maze,
//!     mouse,
//!     Arc::new(MazeOverlay::new()),
//!     Arc::new(SimState::default()),
//!     params,
//!     clock,
//! )
//! .unwrap();
//! mi.declare_interface(InterfaceMode::Discrete).unwrap();
//!
//! mi.move_forward().unwrap();
//! mi.turn_right().unwrap();
//! assert_eq!(mi.discretized_translation(), Cell::new(0, 1));
//! assert_eq!(mi.discretized_rotation(), Direction::East);
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, instrument, warn};

use mms_hal::Mouse;
use mms_kernel::{Clock, SimState};
use mms_maze::{Maze, opposing_wall};
use mms_middleware::{EventBus, Topic};
use mms_types::geometry::{Angle, Cartesian};
use mms_types::{
    Cell, Color, Direction, Event, EventPayload, InterfaceMode, MmsError, PoseSnapshot, SimParams,
};

use crate::motion::{self, Turn};
use crate::overlay::MazeGraphic;

const SOURCE: &str = "mms-runtime::interface";

/// The algorithm-facing facade over maze, mouse, overlay and run state.
pub struct MouseInterface {
    maze: Arc<Maze>,
    mouse: Arc<dyn Mouse>,
    graphic: Arc<dyn MazeGraphic>,
    state: Arc<SimState>,
    params: SimParams,
    clock: Arc<dyn Clock>,
    bus: Option<EventBus>,
    tiles_with_color: Mutex<BTreeSet<Cell>>,
}

impl MouseInterface {
    /// # Errors
    ///
    /// Returns [`MmsError::InvalidParameter`] when `params` fail
    /// [`SimParams::validate`].
    pub fn new(
        maze: Arc<Maze>,
        mouse: Arc<dyn Mouse>,
        graphic: Arc<dyn MazeGraphic>,
        state: Arc<SimState>,
        params: SimParams,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MmsError> {
        params.validate()?;
        Ok(Self {
            maze,
            mouse,
            graphic,
            state,
            params,
            clock,
            bus: None,
            tiles_with_color: Mutex::new(BTreeSet::new()),
        })
    }

    /// Publish alerts and telemetry on `bus`.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Declare the control abstraction for this run.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::ModeAlreadyDeclared`] when another mode was
    /// declared before.
    pub fn declare_interface(&self, mode: InterfaceMode) -> Result<(), MmsError> {
        self.state.declare_interface(mode)
    }

    pub fn sim_state(&self) -> &Arc<SimState> {
        &self.state
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mode-agnostic operations
    // ─────────────────────────────────────────────────────────────────────

    /// Sleep for `milliseconds` of simulation time.
    pub fn delay(&self, milliseconds: u64) {
        self.clock.sleep(std::time::Duration::from_millis(milliseconds));
    }

    /// Put the mouse back on its starting translation, facing north.
    pub fn reset_position(&self) {
        self.mouse
            .teleport(self.mouse.initial_translation(), Angle::from_radians(0.0));
        debug!("mouse position reset");
    }

    /// Whether input button `index` (0–9) was pressed and not yet
    /// acknowledged. Out-of-range indices are logged and read as `false`.
    pub fn input_button_pressed(&self, index: i32) -> bool {
        match self.state.input_button_pressed(index) {
            Ok(pressed) => pressed,
            Err(err) => {
                warn!(%err, "cannot check whether input button was pressed");
                false
            }
        }
    }

    /// Clear the pressed flag of input button `index` (0–9).
    pub fn acknowledge_input_button_pressed(&self, index: i32) {
        if let Err(err) = self.state.acknowledge_input_button(index) {
            warn!(%err, "cannot acknowledge input button");
        }
    }

    /// Grid cell containing the mouse centre.
    pub fn discretized_translation(&self) -> Cell {
        let p = self.mouse.current_translation();
        let length = self.tile_length();
        Cell::new(
            (p.x / length).floor() as i32,
            (p.y / length).floor() as i32,
        )
    }

    /// Cardinal direction nearest to the mouse heading.
    pub fn discretized_rotation(&self) -> Direction {
        Direction::from_angle(self.mouse.current_rotation())
    }

    /// Whether the mouse has ever tried to drive through a wall.
    pub fn crashed(&self) -> bool {
        self.state.crashed()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tile annotations
    // ─────────────────────────────────────────────────────────────────────

    /// Paint tile `(x, y)` with the color mapped to `color`.
    pub fn set_tile_color(&self, x: i32, y: i32, color: char) {
        let result = self.try_set_tile_color(x, y, color);
        ignore_invalid("set_tile_color", result);
    }

    /// Restore tile `(x, y)` to the base color.
    pub fn clear_tile_color(&self, x: i32, y: i32) {
        let result = self.cell_at(x, y).map(|cell| {
            self.graphic
                .set_tile_color(cell, self.params.tile_base_color);
            self.colored_tiles().remove(&cell);
        });
        ignore_invalid("clear_tile_color", result);
    }

    /// Restore every colored tile to the base color.
    pub fn clear_all_tile_color(&self) {
        let cells = std::mem::take(&mut *self.colored_tiles());
        for cell in cells {
            self.graphic
                .set_tile_color(cell, self.params.tile_base_color);
        }
    }

    /// Declare whether the wall on the `direction` side of `(x, y)` exists.
    pub fn declare_wall(&self, x: i32, y: i32, direction: char, wall_exists: bool) {
        let result = self
            .cell_and_direction(x, y, direction)
            .map(|(cell, dir)| self.declare_wall_at(cell, dir, wall_exists));
        ignore_invalid("declare_wall", result);
    }

    /// Forget a previous wall declaration.
    pub fn undeclare_wall(&self, x: i32, y: i32, direction: char) {
        let result = self.cell_and_direction(x, y, direction).map(|(cell, dir)| {
            self.graphic.undeclare_wall(cell, dir);
            if let Some((other, other_dir)) = self.opposing_half(cell, dir) {
                self.graphic.undeclare_wall(other, other_dir);
            }
        });
        ignore_invalid("undeclare_wall", result);
    }

    /// Fog or unfog tile `(x, y)`. Refused unless the algorithm controls
    /// tile fog.
    pub fn set_tile_fogginess(&self, x: i32, y: i32, foggy: bool) {
        let result = self.cell_at(x, y).and_then(|cell| {
            if !self.params.algorithm_controls_tile_fog {
                return Err(MmsError::FogControlDenied);
            }
            self.graphic.set_tile_fogginess(cell, foggy);
            Ok(())
        });
        ignore_invalid("set_tile_fogginess", result);
    }

    /// Show `distance` as the text of tile `(x, y)`.
    pub fn declare_tile_distance(&self, x: i32, y: i32, distance: i32) {
        let result = self
            .cell_at(x, y)
            .map(|cell| self.graphic.set_tile_text(cell, Some(distance.to_string())));
        ignore_invalid("declare_tile_distance", result);
    }

    /// Clear the text of tile `(x, y)`.
    pub fn undeclare_tile_distance(&self, x: i32, y: i32) {
        let result = self
            .cell_at(x, y)
            .map(|cell| self.graphic.set_tile_text(cell, None));
        ignore_invalid("undeclare_tile_distance", result);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Continuous interface
    // ─────────────────────────────────────────────────────────────────────

    /// Command raw wheel speeds, radians per second.
    pub fn set_wheel_speeds(&self, left: f64, right: f64) -> Result<(), MmsError> {
        self.ensure("set_wheel_speeds", InterfaceMode::Continuous)?;
        self.mouse.set_wheel_speeds(left, right);
        Ok(())
    }

    /// Read the named sensor. The call always takes at least one frame
    /// period; an unknown sensor is logged and reads `0.0`.
    pub fn read(&self, name: &str) -> Result<f64, MmsError> {
        self.ensure("read", InterfaceMode::Continuous)?;
        if !self.mouse.has_sensor(name) {
            warn!(err = %MmsError::UnknownSensor(name.to_string()), "cannot read sensor");
            return Ok(0.0);
        }

        let start = self.clock.now();
        let value = self.mouse.read(name).unwrap_or(0.0);
        let elapsed = self.clock.now().saturating_sub(start);

        if self.params.print_late_sensor_reads
            && let Some(nominal) = self.mouse.read_duration(name)
            && !nominal.is_zero()
            && elapsed > nominal
        {
            let late = (elapsed - nominal).as_secs_f64();
            warn!(
                sensor = name,
                late_by_s = late,
                percent_late = late / nominal.as_secs_f64() * 100.0,
                "sensor read was late"
            );
        }

        self.clock
            .sleep(self.params.frame_period().saturating_sub(elapsed));
        Ok(value)
    }

    /// Yaw rate in degrees per second.
    pub fn read_gyro(&self) -> Result<f64, MmsError> {
        self.ensure("read_gyro", InterfaceMode::Continuous)?;
        Ok(self.mouse.read_gyro())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Discrete interface
    // ─────────────────────────────────────────────────────────────────────

    pub fn wall_front(&self) -> Result<bool, MmsError> {
        self.ensure("wall_front", InterfaceMode::Discrete)?;
        self.is_wall(self.discretized_translation(), self.discretized_rotation())
    }

    pub fn wall_right(&self) -> Result<bool, MmsError> {
        self.ensure("wall_right", InterfaceMode::Discrete)?;
        self.is_wall(
            self.discretized_translation(),
            self.discretized_rotation().turned_right(),
        )
    }

    pub fn wall_left(&self) -> Result<bool, MmsError> {
        self.ensure("wall_left", InterfaceMode::Discrete)?;
        self.is_wall(
            self.discretized_translation(),
            self.discretized_rotation().turned_left(),
        )
    }

    /// Drive one cell forward. With a wall ahead the mouse stays put and is
    /// marked crashed.
    #[instrument(skip(self))]
    pub fn move_forward(&self) -> Result<(), MmsError> {
        self.ensure("move_forward", InterfaceMode::Discrete)?;
        let cell = self.discretized_translation();
        let heading = self.discretized_rotation();

        if self.is_wall(cell, heading)? {
            if self.state.set_crashed() {
                self.publish(
                    Topic::SystemAlerts,
                    EventPayload::Crashed {
                        cell,
                        direction: heading,
                    },
                );
            }
            return Ok(());
        }

        let destination = motion::forward_destination(
            cell,
            heading,
            self.mouse.initial_translation(),
            self.tile_length(),
        );
        let reached = self.drive_until(motion::forward_wheel_speeds, || {
            motion::forward_reached(self.mouse.current_translation(), destination, heading)
        });
        if reached {
            self.mouse.teleport(destination, heading.canonical_angle());
            self.publish_pose();
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn turn_right(&self) -> Result<(), MmsError> {
        self.ensure("turn_right", InterfaceMode::Discrete)?;
        self.turn(Turn::Right);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn turn_left(&self) -> Result<(), MmsError> {
        self.ensure("turn_left", InterfaceMode::Discrete)?;
        self.turn(Turn::Left);
        Ok(())
    }

    /// Two right turns.
    pub fn turn_around(&self) -> Result<(), MmsError> {
        self.ensure("turn_around", InterfaceMode::Discrete)?;
        self.turn_right()?;
        self.turn_right()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────

    fn tile_length(&self) -> f64 {
        self.params.tile_length()
    }

    /// Discrete-move wheel speed, re-read every tick so speed changes take
    /// effect mid-move.
    fn wheel_speed(&self) -> f64 {
        self.params.discrete_wheel_speed() * self.state.sim_speed()
    }

    fn ensure(&self, operation: &'static str, required: InterfaceMode) -> Result<(), MmsError> {
        self.state
            .mode_guard()
            .check(operation, required)
            .inspect_err(|err| match err {
                MmsError::ModeViolation { .. } => {
                    error!(
                        operation,
                        %required,
                        declared = ?self.state.mode_guard().mode(),
                        "interface mode violation"
                    );
                    self.mouse.set_wheel_speeds(0.0, 0.0);
                    self.state.request_quit();
                    self.publish(
                        Topic::SystemAlerts,
                        EventPayload::ModeViolation {
                            operation: operation.to_string(),
                            required,
                        },
                    );
                }
                _ => debug!(operation, "refused after mode violation"),
            })
    }

    fn is_wall(&self, cell: Cell, direction: Direction) -> Result<bool, MmsError> {
        let exists = self.maze.is_wall(cell, direction)?;
        if self.params.discrete_interface_declare_wall_on_read {
            self.declare_wall_at(cell, direction, exists);
        }
        Ok(exists)
    }

    fn turn(&self, turn: Turn) {
        let translation: Cartesian = self.mouse.current_translation();
        let target = turn.target(self.discretized_rotation());
        let target_angle = target.canonical_angle();
        let reached = self.drive_until(
            |speed| turn.wheel_speeds(speed),
            || turn.reached(self.mouse.current_rotation(), target_angle),
        );
        if reached {
            self.mouse.teleport(translation, target_angle);
            self.publish_pose();
        }
    }

    /// Run the command-sleep-check loop until `reached` holds. Returns
    /// `false` when the run was quit first. Wheels are always stopped on
    /// exit.
    fn drive_until(
        &self,
        wheel_speeds: impl Fn(f64) -> (f64, f64),
        reached: impl Fn() -> bool,
    ) -> bool {
        let tick = self.params.min_sleep();
        let mut done = reached();
        while !done && !self.state.quit_requested() {
            self.check_paused();
            let (left, right) = wheel_speeds(self.wheel_speed());
            self.mouse.set_wheel_speeds(left, right);
            self.clock.sleep(tick);
            done = reached();
        }
        self.mouse.set_wheel_speeds(0.0, 0.0);
        done
    }

    /// Hold still while the simulation is paused.
    fn check_paused(&self) {
        if !self.state.paused() {
            return;
        }
        self.mouse.set_wheel_speeds(0.0, 0.0);
        debug!("motion paused");
        while self.state.paused() && !self.state.quit_requested() {
            self.clock.sleep(self.params.min_sleep());
        }
    }

    fn cell_at(&self, x: i32, y: i32) -> Result<Cell, MmsError> {
        if self.maze.within(x, y) {
            Ok(Cell::new(x, y))
        } else {
            Err(MmsError::OutOfBounds { x, y })
        }
    }

    fn cell_and_direction(&self, x: i32, y: i32, direction: char) -> Result<(Cell, Direction), MmsError> {
        Ok((self.cell_at(x, y)?, Direction::from_char(direction)?))
    }

    fn try_set_tile_color(&self, x: i32, y: i32, color: char) -> Result<(), MmsError> {
        let cell = self.cell_at(x, y)?;
        let color = Color::from_char(color)?;
        self.graphic.set_tile_color(cell, color);
        self.colored_tiles().insert(cell);
        Ok(())
    }

    fn colored_tiles(&self) -> MutexGuard<'_, BTreeSet<Cell>> {
        self.tiles_with_color
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn opposing_half(&self, cell: Cell, direction: Direction) -> Option<(Cell, Direction)> {
        if !self.params.declare_both_wall_halves {
            return None;
        }
        opposing_wall(cell, direction, self.maze.width(), self.maze.height())
    }

    fn declare_wall_at(&self, cell: Cell, direction: Direction, exists: bool) {
        self.graphic.declare_wall(cell, direction, exists);
        if let Some((other, other_dir)) = self.opposing_half(cell, direction) {
            self.graphic.declare_wall(other, other_dir, exists);
        }
    }

    fn publish_pose(&self) {
        if self.bus.is_none() {
            return;
        }
        let p = self.mouse.current_translation();
        self.publish(
            Topic::Telemetry,
            EventPayload::Telemetry(PoseSnapshot {
                x: p.x,
                y: p.y,
                rotation_deg: self.mouse.current_rotation().degrees(),
                cell: self.discretized_translation(),
                direction: self.discretized_rotation(),
            }),
        );
    }

    fn publish(&self, topic: Topic, payload: EventPayload) {
        if let Some(bus) = &self.bus {
            let _ = bus.publish_to(topic, Event::new(SOURCE, payload));
        }
    }
}

fn ignore_invalid(operation: &'static str, result: Result<(), MmsError>) {
    if let Err(err) = result {
        warn!(operation, %err, "ignoring invalid annotation request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use mms_hal::SimMouse;
    use mms_maze::MazeBuilder;
    use mms_perception::{ReadingModel, SensorSpec};

    use crate::lockstep::LockstepClock;
    use crate::overlay::MazeOverlay;

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    /// Mouse that records commands and never moves on its own.
    #[derive(Default)]
    struct MockMouse {
        pose: Mutex<(Cartesian, Angle)>,
        commands: Mutex<Vec<(f64, f64)>>,
        teleports: Mutex<Vec<(Cartesian, Angle)>>,
    }

    impl Mouse for MockMouse {
        fn initial_translation(&self) -> Cartesian {
            Cartesian::new(0.09, 0.09)
        }
        fn current_translation(&self) -> Cartesian {
            self.pose.lock().unwrap().0
        }
        fn current_rotation(&self) -> Angle {
            self.pose.lock().unwrap().1
        }
        fn teleport(&self, translation: Cartesian, rotation: Angle) {
            *self.pose.lock().unwrap() = (translation, rotation.normalized());
            self.teleports.lock().unwrap().push((translation, rotation));
        }
        fn set_wheel_speeds(&self, left: f64, right: f64) {
            self.commands.lock().unwrap().push((left, right));
        }
        fn has_sensor(&self, name: &str) -> bool {
            name == "front"
        }
        fn read(&self, name: &str) -> Option<f64> {
            (name == "front").then_some(0.42)
        }
        fn read_duration(&self, name: &str) -> Option<Duration> {
            (name == "front").then_some(Duration::from_millis(1))
        }
        fn read_gyro(&self) -> f64 {
            -12.5
        }
    }

    struct Rig {
        mi: MouseInterface,
        mouse: Arc<SimMouse>,
        overlay: Arc<MazeOverlay>,
        clock: Arc<LockstepClock>,
        state: Arc<SimState>,
    }

    fn rig_with(maze: Maze, params: SimParams, mode: InterfaceMode) -> Rig {
        let maze = Arc::new(maze);
        let mouse = Arc::new(
            SimMouse::builder(maze.clone(), &params)
                .with_sensor(
                    "front",
                    SensorSpec {
                        radius: 0.005,
                        range: 0.4,
                        half_width: Angle::from_degrees(3.0),
                        read_duration: Duration::from_millis(2),
                        mount_position: Cartesian::zero(),
                        mount_direction: Angle::from_degrees(0.0),
                        model: ReadingModel::NearestHit,
                    },
                )
                .build()
                .unwrap(),
        );
        let clock = Arc::new(LockstepClock::new().with_integrator(mouse.clone()));
        let overlay = Arc::new(MazeOverlay::new());
        let state = Arc::new(SimState::default());
        let mi = MouseInterface::new(
            maze,
            mouse.clone(),
            overlay.clone(),
            state.clone(),
            params,
            clock.clone(),
        )
        .unwrap();
        mi.declare_interface(mode).unwrap();
        Rig {
            mi,
            mouse,
            overlay,
            clock,
            state,
        }
    }

    fn rig(mode: InterfaceMode) -> Rig {
        rig_with(
            MazeBuilder::bordered(5, 5).build().unwrap(),
            SimParams::default(),
            mode,
        )
    }

    fn mock_interface(mode: InterfaceMode) -> (MouseInterface, Arc<MockMouse>, Arc<SimState>) {
        let maze = Arc::new(MazeBuilder::bordered(3, 3).build().unwrap());
        let mouse = Arc::new(MockMouse::default());
        *mouse.pose.lock().unwrap() = (Cartesian::new(0.09, 0.09), Angle::from_degrees(0.0));
        let state = Arc::new(SimState::default());
        let params = SimParams {
            print_late_sensor_reads: true,
            ..SimParams::default()
        };
        let mi = MouseInterface::new(
            maze,
            mouse.clone(),
            Arc::new(MazeOverlay::new()),
            state.clone(),
            params,
            Arc::new(LockstepClock::new()),
        )
        .unwrap();
        mi.declare_interface(mode).unwrap();
        (mi, mouse, state)
    }

    // ------------------------------------------------------------------
    // Discrete motion
    // ------------------------------------------------------------------

    #[test]
    fn move_forward_lands_exactly_on_next_tile_in_every_heading() {
        let r = rig(InterfaceMode::Discrete);
        // Walk to the middle so every heading has room.
        r.mi.move_forward().unwrap();
        r.mi.move_forward().unwrap();
        r.mi.turn_right().unwrap();
        r.mi.move_forward().unwrap();
        r.mi.move_forward().unwrap();
        assert_eq!(r.mi.discretized_translation(), Cell::new(2, 2));

        let l = r.mi.params().tile_length();
        for heading in Direction::ALL {
            let offset = r.mouse.initial_translation();
            r.mouse.teleport(
                Cartesian::new(2.0 * l + offset.x, 2.0 * l + offset.y),
                heading.canonical_angle(),
            );
            r.mi.move_forward().unwrap();
            let expected = Cell::new(2, 2).neighbor(heading);
            assert_eq!(r.mi.discretized_translation(), expected, "{heading}");
            assert_eq!(r.mi.discretized_rotation(), heading);
            let p = r.mouse.current_translation();
            assert!((p.x - (expected.x as f64 * l + l / 2.0)).abs() < 1e-12);
            assert!((p.y - (expected.y as f64 * l + l / 2.0)).abs() < 1e-12);
            assert!((r.mouse.current_rotation() - heading.canonical_angle()).signed().radians().abs() < 1e-12);
        }
        assert!(!r.mi.crashed());
        assert_eq!(r.mouse.wheel_speeds(), (0.0, 0.0));
    }

    #[test]
    fn move_forward_takes_simulated_time() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.move_forward().unwrap();
        // 0.18 m at 0.02 * 30 = 0.6 m/s is 0.3 s, rounded up to whole ticks.
        let elapsed = r.clock.now();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed <= Duration::from_millis(305));
    }

    #[test]
    fn crash_leaves_mouse_in_place_and_sticks() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.turn_around().unwrap();
        let before = r.mouse.current_translation();
        r.mi.move_forward().unwrap();
        assert!(r.mi.crashed());
        assert_eq!(r.mouse.current_translation(), before);
        assert_eq!(r.mi.discretized_translation(), Cell::new(0, 0));

        // Driving into the same wall again while crashed changes nothing.
        let rotation = r.mouse.current_rotation();
        let elapsed = r.clock.now();
        r.mi.move_forward().unwrap();
        assert!(r.mi.crashed());
        assert_eq!(r.mouse.current_translation(), before);
        assert_eq!(r.mouse.current_rotation(), rotation);
        assert_eq!(r.clock.now(), elapsed);

        // A later legal move works and the flag stays set.
        r.mi.turn_around().unwrap();
        r.mi.move_forward().unwrap();
        assert_eq!(r.mi.discretized_translation(), Cell::new(0, 1));
        assert!(r.mi.crashed());
    }

    #[test]
    fn turns_snap_to_canonical_headings() {
        let r = rig(InterfaceMode::Discrete);
        let expected_right = [Direction::East, Direction::South, Direction::West, Direction::North];
        for expected in expected_right {
            r.mi.turn_right().unwrap();
            assert_eq!(r.mi.discretized_rotation(), expected);
            let err = (r.mouse.current_rotation() - expected.canonical_angle()).signed();
            assert!(err.radians().abs() < 1e-12);
        }
        let expected_left = [Direction::West, Direction::South, Direction::East, Direction::North];
        for expected in expected_left {
            r.mi.turn_left().unwrap();
            assert_eq!(r.mi.discretized_rotation(), expected);
        }
        let p = r.mouse.current_translation();
        assert!((p.x - 0.09).abs() < 1e-12 && (p.y - 0.09).abs() < 1e-12);
    }

    #[test]
    fn turn_around_equals_two_right_turns() {
        let a = rig(InterfaceMode::Discrete);
        let b = rig(InterfaceMode::Discrete);
        a.mi.turn_around().unwrap();
        b.mi.turn_right().unwrap();
        b.mi.turn_right().unwrap();
        assert_eq!(a.mi.discretized_rotation(), Direction::South);
        assert_eq!(a.mouse.current_rotation(), b.mouse.current_rotation());
        assert_eq!(a.mouse.current_translation(), b.mouse.current_translation());
        assert_eq!(a.clock.now(), b.clock.now());
    }

    #[test]
    fn wall_queries_follow_heading() {
        let maze = MazeBuilder::bordered(3, 3)
            .with_wall(Cell::new(0, 0), Direction::North)
            .build()
            .unwrap();
        let r = rig_with(maze, SimParams::default(), InterfaceMode::Discrete);
        assert!(r.mi.wall_front().unwrap());
        assert!(r.mi.wall_left().unwrap());
        assert!(!r.mi.wall_right().unwrap());
        r.mi.turn_right().unwrap();
        assert!(!r.mi.wall_front().unwrap());
        assert!(r.mi.wall_left().unwrap());
        assert!(r.mi.wall_right().unwrap());
    }

    #[test]
    fn wall_reads_are_declared_on_both_halves() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.wall_right().unwrap();
        assert_eq!(r.overlay.declared_wall(Cell::new(0, 0), Direction::East), Some(false));
        assert_eq!(r.overlay.declared_wall(Cell::new(1, 0), Direction::West), Some(false));
        r.mi.wall_left().unwrap();
        assert_eq!(r.overlay.declared_wall(Cell::new(0, 0), Direction::West), Some(true));
    }

    #[test]
    fn wall_reads_can_skip_declaration() {
        let params = SimParams {
            discrete_interface_declare_wall_on_read: false,
            ..SimParams::default()
        };
        let r = rig_with(MazeBuilder::bordered(2, 2).build().unwrap(), params, InterfaceMode::Discrete);
        r.mi.wall_front().unwrap();
        assert_eq!(r.overlay.declared_wall_count(), 0);
    }

    #[test]
    fn pause_blocks_motion_until_resumed() {
        let r = rig(InterfaceMode::Discrete);
        r.state.set_paused(true);
        let state = r.state.clone();
        let resume = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            state.set_paused(false);
        });
        r.mi.move_forward().unwrap();
        resume.join().unwrap();
        assert_eq!(r.mi.discretized_translation(), Cell::new(0, 1));
    }

    #[test]
    fn quit_aborts_motion_without_teleport() {
        let r = rig(InterfaceMode::Discrete);
        r.state.request_quit();
        r.mi.move_forward().unwrap();
        assert_eq!(r.mi.discretized_translation(), Cell::new(0, 0));
        assert_eq!(r.clock.now(), Duration::ZERO);
    }

    #[test]
    fn sim_speed_shortens_moves() {
        let slow = rig(InterfaceMode::Discrete);
        let fast = rig(InterfaceMode::Discrete);
        fast.state.set_sim_speed(2.0).unwrap();
        slow.mi.move_forward().unwrap();
        fast.mi.move_forward().unwrap();
        assert!(fast.clock.now() < slow.clock.now());
        assert_eq!(fast.mi.discretized_translation(), Cell::new(0, 1));
    }

    #[test]
    fn discrete_moves_publish_telemetry_and_crash_alerts() {
        let bus = EventBus::default();
        let mut telemetry = bus.subscribe_to(Topic::Telemetry);
        let mut alerts = bus.subscribe_to(Topic::SystemAlerts);
        let r = rig(InterfaceMode::Discrete);
        let mi = r.mi.with_bus(bus);

        mi.move_forward().unwrap();
        let events = telemetry.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].payload,
            EventPayload::Telemetry(PoseSnapshot { cell, .. }) if cell == Cell::new(0, 1)
        ));

        mi.turn_left().unwrap();
        mi.move_forward().unwrap();
        mi.move_forward().unwrap();
        let alerts = alerts.drain();
        assert_eq!(alerts.len(), 1, "crash is reported once");
        assert!(matches!(alerts[0].payload, EventPayload::Crashed { .. }));
    }

    // ------------------------------------------------------------------
    // Mode enforcement
    // ------------------------------------------------------------------

    #[test]
    fn discrete_ops_fail_in_continuous_mode() {
        type Op = fn(&MouseInterface) -> Result<(), MmsError>;
        let ops: [(&str, Op); 4] = [
            ("move_forward", MouseInterface::move_forward),
            ("turn_left", MouseInterface::turn_left),
            ("turn_right", MouseInterface::turn_right),
            ("turn_around", MouseInterface::turn_around),
        ];
        for (name, op) in ops {
            let (mi, mouse, state) = mock_interface(InterfaceMode::Continuous);
            assert_eq!(
                op(&mi),
                Err(MmsError::ModeViolation {
                    operation: name.to_string(),
                    required: InterfaceMode::Discrete,
                })
            );
            assert!(state.quit_requested());
            assert!(mouse.teleports.lock().unwrap().is_empty());
            assert!(mouse.commands.lock().unwrap().iter().all(|&c| c == (0.0, 0.0)));
        }

        let (mi, _mouse, _state) = mock_interface(InterfaceMode::Continuous);
        assert!(mi.wall_front().is_err());
        assert!(mi.wall_left().is_err());
        assert!(mi.wall_right().is_err());
    }

    #[test]
    fn continuous_ops_fail_in_discrete_mode() {
        let (mi, mouse, state) = mock_interface(InterfaceMode::Discrete);
        assert!(matches!(
            mi.set_wheel_speeds(1.0, 1.0),
            Err(MmsError::ModeViolation { .. })
        ));
        assert!(mi.read("front").is_err());
        assert!(mi.read_gyro().is_err());
        assert!(state.quit_requested());
        assert!(mouse.commands.lock().unwrap().iter().all(|&c| c == (0.0, 0.0)));
    }

    #[test]
    fn violation_ends_a_continuous_run() {
        let r = rig(InterfaceMode::Continuous);
        r.mi.set_wheel_speeds(-10.0, 10.0).unwrap();
        r.mi.read("front").unwrap();
        let stopped_at = r.mouse.current_translation();

        assert!(matches!(
            r.mi.wall_front(),
            Err(MmsError::ModeViolation { .. })
        ));
        assert_eq!(r.mouse.wheel_speeds(), (0.0, 0.0));
        assert_eq!(
            r.mi.set_wheel_speeds(-10.0, 10.0),
            Err(MmsError::RunTerminated {
                operation: "set_wheel_speeds".to_string(),
            })
        );
        for _ in 0..10 {
            assert!(matches!(
                r.mi.read("front"),
                Err(MmsError::RunTerminated { .. })
            ));
        }
        assert!(r.mi.read_gyro().is_err());
        r.mi.delay(100);
        assert_eq!(r.mouse.current_translation(), stopped_at);
        assert!(r.state.quit_requested());
    }

    #[test]
    fn refusals_after_a_violation_are_not_republished() {
        let bus = EventBus::default();
        let mut alerts = bus.subscribe_to(Topic::SystemAlerts);
        let (mi, _mouse, _state) = mock_interface(InterfaceMode::Discrete);
        let mi = mi.with_bus(bus);
        let _ = mi.read_gyro();
        assert!(matches!(mi.move_forward(), Err(MmsError::RunTerminated { .. })));
        assert_eq!(alerts.drain().len(), 1);
    }

    #[test]
    fn mode_violation_is_published() {
        let bus = EventBus::default();
        let mut alerts = bus.subscribe_to(Topic::SystemAlerts);
        let (mi, _mouse, _state) = mock_interface(InterfaceMode::Discrete);
        let mi = mi.with_bus(bus);
        let _ = mi.read_gyro();
        let events = alerts.drain();
        assert_eq!(
            events[0].payload,
            EventPayload::ModeViolation {
                operation: "read_gyro".to_string(),
                required: InterfaceMode::Continuous,
            }
        );
    }

    // ------------------------------------------------------------------
    // Continuous interface
    // ------------------------------------------------------------------

    #[test]
    fn read_passes_value_and_waits_one_frame() {
        let (mi, _mouse, _state) = mock_interface(InterfaceMode::Continuous);
        let before = mi.clock.now();
        assert_eq!(mi.read("front").unwrap(), 0.42);
        let waited = mi.clock.now() - before;
        assert_eq!(waited, mi.params().frame_period());
    }

    #[test]
    fn unknown_sensor_reads_zero_without_waiting() {
        let (mi, _mouse, _state) = mock_interface(InterfaceMode::Continuous);
        assert_eq!(mi.read("rear").unwrap(), 0.0);
        assert_eq!(mi.clock.now(), Duration::ZERO);
    }

    #[test]
    fn invalid_params_are_rejected_at_construction() {
        let zero_tick = SimParams {
            min_sleep_duration_ms: 0,
            ..SimParams::default()
        };
        let zero_frames = SimParams {
            frame_rate: 0.0,
            ..SimParams::default()
        };
        for params in [zero_tick, zero_frames] {
            let maze = Arc::new(MazeBuilder::bordered(2, 2).build().unwrap());
            let mouse = Arc::new(MockMouse::default());
            let result = MouseInterface::new(
                maze,
                mouse,
                Arc::new(MazeOverlay::new()),
                Arc::new(SimState::default()),
                params,
                Arc::new(LockstepClock::new()),
            );
            assert!(matches!(result, Err(MmsError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn wheel_speeds_and_gyro_pass_through() {
        let (mi, mouse, _state) = mock_interface(InterfaceMode::Continuous);
        mi.set_wheel_speeds(-3.0, 4.0).unwrap();
        assert_eq!(mouse.commands.lock().unwrap().as_slice(), &[(-3.0, 4.0)]);
        assert_eq!(mi.read_gyro().unwrap(), -12.5);
    }

    #[test]
    fn continuous_driving_moves_the_sim_mouse() {
        let r = rig(InterfaceMode::Continuous);
        r.mi.set_wheel_speeds(-10.0, 10.0).unwrap();
        for _ in 0..12 {
            let value = r.mi.read("front").unwrap();
            assert!((0.0..=1.0).contains(&value));
        }
        // 0.2 m/s for twelve frames.
        assert!((r.mouse.current_translation().y - (0.09 + 0.04)).abs() < 1e-6);
        assert!(r.mi.read_gyro().unwrap().abs() < 1e-12);
    }

    // ------------------------------------------------------------------
    // Annotations and misc
    // ------------------------------------------------------------------

    #[test]
    fn declare_wall_sets_both_halves() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.declare_wall(1, 1, 'n', true);
        assert_eq!(r.overlay.declared_wall(Cell::new(1, 1), Direction::North), Some(true));
        assert_eq!(r.overlay.declared_wall(Cell::new(1, 2), Direction::South), Some(true));
        r.mi.undeclare_wall(1, 2, 'S');
        assert_eq!(r.overlay.declared_wall(Cell::new(1, 1), Direction::North), None);
        assert_eq!(r.overlay.declared_wall(Cell::new(1, 2), Direction::South), None);
    }

    #[test]
    fn declare_wall_single_half_when_disabled() {
        let params = SimParams {
            declare_both_wall_halves: false,
            ..SimParams::default()
        };
        let r = rig_with(MazeBuilder::bordered(3, 3).build().unwrap(), params, InterfaceMode::Discrete);
        r.mi.declare_wall(1, 1, 'e', false);
        assert_eq!(r.overlay.declared_wall(Cell::new(1, 1), Direction::East), Some(false));
        assert_eq!(r.overlay.declared_wall(Cell::new(2, 1), Direction::West), None);
    }

    #[test]
    fn invalid_annotations_are_ignored() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.declare_wall(9, 9, 'n', true);
        r.mi.declare_wall(1, 1, 'x', true);
        r.mi.set_tile_color(-1, 0, 'r');
        r.mi.set_tile_color(0, 0, 'z');
        r.mi.declare_tile_distance(5, 0, 3);
        assert_eq!(r.overlay.declared_wall_count(), 0);
        assert_eq!(r.overlay.tile_color(Cell::new(0, 0)), None);
        assert_eq!(r.overlay.tile_text(Cell::new(4, 0)), None);
    }

    #[test]
    fn clearing_colors_restores_base_color() {
        let params = SimParams {
            tile_base_color: Color::Gray,
            ..SimParams::default()
        };
        let r = rig_with(MazeBuilder::bordered(3, 3).build().unwrap(), params, InterfaceMode::Discrete);
        r.mi.set_tile_color(0, 0, 'r');
        r.mi.set_tile_color(1, 2, 'G');
        assert_eq!(r.overlay.tile_color(Cell::new(1, 2)), Some(Color::DarkGreen));

        r.mi.clear_tile_color(0, 0);
        assert_eq!(r.overlay.tile_color(Cell::new(0, 0)), Some(Color::Gray));
        assert_eq!(r.overlay.tile_color(Cell::new(1, 2)), Some(Color::DarkGreen));

        r.mi.clear_all_tile_color();
        assert_eq!(r.overlay.tile_color(Cell::new(1, 2)), Some(Color::Gray));
        assert!(r.mi.colored_tiles().is_empty());
    }

    #[test]
    fn fog_requires_algorithm_control() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.set_tile_fogginess(1, 1, true);
        assert!(!r.overlay.is_foggy(Cell::new(1, 1)));

        let params = SimParams {
            algorithm_controls_tile_fog: true,
            ..SimParams::default()
        };
        let r = rig_with(MazeBuilder::bordered(3, 3).build().unwrap(), params, InterfaceMode::Discrete);
        r.mi.set_tile_fogginess(1, 1, true);
        assert!(r.overlay.is_foggy(Cell::new(1, 1)));
    }

    #[test]
    fn tile_distance_sets_and_clears_text() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.declare_tile_distance(2, 3, 14);
        assert_eq!(r.overlay.tile_text(Cell::new(2, 3)).as_deref(), Some("14"));
        r.mi.undeclare_tile_distance(2, 3);
        assert_eq!(r.overlay.tile_text(Cell::new(2, 3)), None);
    }

    #[test]
    fn input_buttons_roundtrip_and_reject_out_of_range() {
        let r = rig(InterfaceMode::Discrete);
        for k in 0..=9 {
            assert!(!r.mi.input_button_pressed(k));
            r.state.press_input_button(k).unwrap();
            assert!(r.mi.input_button_pressed(k), "button {k}");
            r.mi.acknowledge_input_button_pressed(k);
            assert!(!r.mi.input_button_pressed(k), "button {k}");
        }
        assert!(!r.mi.input_button_pressed(10));
        assert!(!r.mi.input_button_pressed(-1));
        r.mi.acknowledge_input_button_pressed(11);
    }

    #[test]
    fn reset_position_returns_to_start_facing_north() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.move_forward().unwrap();
        r.mi.turn_right().unwrap();
        r.mi.reset_position();
        assert_eq!(r.mouse.current_translation(), r.mouse.initial_translation());
        assert_eq!(r.mi.discretized_rotation(), Direction::North);
    }

    #[test]
    fn delay_advances_clock() {
        let r = rig(InterfaceMode::Discrete);
        r.mi.delay(40);
        assert_eq!(r.clock.now(), Duration::from_millis(40));
    }
}
