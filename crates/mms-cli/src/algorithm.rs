//! Built-in navigation algorithms driven through [`MouseInterface`].

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use mms_runtime::MouseInterface;
use mms_types::{Cell, Direction, InterfaceMode, MmsError};

/// Input button that stops a running algorithm.
pub const STOP_BUTTON: i32 = 0;

/// Front reading above which the continuous cruiser turns away.
const CRUISE_TURN_THRESHOLD: f64 = 0.5;

/// Outcome of one algorithm run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub interface: InterfaceMode,
    /// Loop iterations: decisions in discrete mode, frames in continuous.
    pub steps: usize,
    pub cells_visited: usize,
    pub final_cell: Cell,
    pub final_direction: Direction,
    pub crashed: bool,
    /// Stopped by quit flag or stop button rather than the step budget.
    pub interrupted: bool,
}

/// Tracks distinct cells and paints them as the mouse goes.
struct Trail {
    visits: HashMap<Cell, u32>,
}

impl Trail {
    fn start(mi: &MouseInterface) -> Self {
        let mut trail = Self {
            visits: HashMap::new(),
        };
        trail.visit(mi);
        trail
    }

    fn visit(&mut self, mi: &MouseInterface) {
        let cell = mi.discretized_translation();
        let count = self.visits.entry(cell).or_insert(0);
        *count += 1;
        // Bright on first visit, dark once revisited.
        let color = if *count == 1 { 'g' } else { 'G' };
        let count = *count as i32;
        mi.set_tile_color(cell.x, cell.y, color);
        mi.declare_tile_distance(cell.x, cell.y, count);
    }

    fn len(&self) -> usize {
        self.visits.len()
    }
}

fn should_stop(mi: &MouseInterface) -> bool {
    if mi.sim_state().quit_requested() {
        return true;
    }
    if mi.input_button_pressed(STOP_BUTTON) {
        mi.acknowledge_input_button_pressed(STOP_BUTTON);
        info!("stop button pressed");
        return true;
    }
    false
}

fn summarize(
    mi: &MouseInterface,
    interface: InterfaceMode,
    steps: usize,
    cells_visited: usize,
    interrupted: bool,
) -> RunSummary {
    RunSummary {
        interface,
        steps,
        cells_visited,
        final_cell: mi.discretized_translation(),
        final_direction: mi.discretized_rotation(),
        crashed: mi.crashed(),
        interrupted,
    }
}

/// Keep the left hand on the wall for at most `max_steps` decisions.
///
/// Each decision is one of: turn left and step, step straight, or turn
/// right in place. Visited tiles are colored and labelled with their visit
/// count.
///
/// # Errors
///
/// Fails when the interface was already declared continuous.
pub fn follow_left_wall(mi: &MouseInterface, max_steps: usize) -> Result<RunSummary, MmsError> {
    mi.declare_interface(InterfaceMode::Discrete)?;
    let mut trail = Trail::start(mi);
    let mut steps = 0;
    let mut interrupted = false;

    while steps < max_steps {
        if should_stop(mi) {
            interrupted = true;
            break;
        }
        steps += 1;
        if !mi.wall_left()? {
            mi.turn_left()?;
        } else if mi.wall_front()? {
            mi.turn_right()?;
            continue;
        }
        mi.move_forward()?;
        trail.visit(mi);
    }

    info!(steps, cells = trail.len(), "left-wall follower finished");
    Ok(summarize(mi, InterfaceMode::Discrete, steps, trail.len(), interrupted))
}

/// Drive forward on raw wheel speeds, spinning right whenever the `front`
/// sensor sees a wall close ahead. Runs `max_frames` sensor frames.
///
/// # Errors
///
/// Fails when the interface was already declared discrete.
pub fn cruise(mi: &MouseInterface, max_frames: usize) -> Result<RunSummary, MmsError> {
    mi.declare_interface(InterfaceMode::Continuous)?;
    let speed = mi.params().discrete_wheel_speed() / 2.0;
    let mut visited = vec![mi.discretized_translation()];
    let mut frames = 0;
    let mut interrupted = false;

    while frames < max_frames {
        if should_stop(mi) {
            interrupted = true;
            break;
        }
        frames += 1;
        let front = mi.read("front")?;
        if front > CRUISE_TURN_THRESHOLD {
            mi.set_wheel_speeds(speed / 2.0, speed / 2.0)?;
        } else {
            mi.set_wheel_speeds(-speed, speed)?;
        }
        let cell = mi.discretized_translation();
        if !visited.contains(&cell) {
            visited.push(cell);
        }
    }
    mi.set_wheel_speeds(0.0, 0.0)?;

    info!(frames, cells = visited.len(), "cruise finished");
    Ok(summarize(mi, InterfaceMode::Continuous, frames, visited.len(), interrupted))
}
