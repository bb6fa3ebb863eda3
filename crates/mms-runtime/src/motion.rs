//! Destinations, wheel commands and stop predicates of discrete moves.
//!
//! These are pure functions of the pose so the loops in
//! [`interface`][crate::interface] stay small and every predicate can be
//! tested without a clock.

use mms_types::geometry::{Angle, Cartesian};
use mms_types::{Cell, Direction};

/// Wheel speeds `(left, right)` driving straight ahead at `speed`.
pub fn forward_wheel_speeds(speed: f64) -> (f64, f64) {
    (-speed, speed)
}

/// Where a one-cell move from `cell` towards `heading` ends.
///
/// The mouse keeps its offset within the tile, which is the offset of its
/// initial translation inside tile `(0, 0)`.
pub fn forward_destination(
    cell: Cell,
    heading: Direction,
    initial_translation: Cartesian,
    tile_length: f64,
) -> Cartesian {
    let target = cell.neighbor(heading);
    Cartesian::new(
        tile_length * target.x as f64 + initial_translation.x,
        tile_length * target.y as f64 + initial_translation.y,
    )
}

/// True once `current` has reached or passed `destination` along the
/// travel axis of `heading`.
pub fn forward_reached(current: Cartesian, destination: Cartesian, heading: Direction) -> bool {
    match heading {
        Direction::North => current.y >= destination.y,
        Direction::East => current.x >= destination.x,
        Direction::South => current.y <= destination.y,
        Direction::West => current.x <= destination.x,
    }
}

/// A quarter turn in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    /// Heading after turning from `heading`.
    pub fn target(self, heading: Direction) -> Direction {
        match self {
            Turn::Left => heading.turned_left(),
            Turn::Right => heading.turned_right(),
        }
    }

    /// Both wheels spin the same way at half speed.
    pub fn wheel_speeds(self, speed: f64) -> (f64, f64) {
        match self {
            Turn::Right => (speed / 2.0, speed / 2.0),
            Turn::Left => (-speed / 2.0, -speed / 2.0),
        }
    }

    /// True once `current` has reached or passed `target`.
    ///
    /// The remaining angle is taken the short way round, so the 0°/360°
    /// seam needs no special case.
    pub fn reached(self, current: Angle, target: Angle) -> bool {
        let remaining = (target - current).signed().radians();
        match self {
            // Right turns decrease the heading.
            Turn::Right => remaining >= 0.0,
            Turn::Left => remaining <= 0.0,
        }
    }
}
