//! `mms-maze` – the maze model.
//!
//! # Modules
//!
//! - [`maze`] – [`Maze`] and [`MazeBuilder`]: an immutable tile grid with
//!   bounds-checked wall queries.
//! - [`walls`] – neighbour coupling ([`opposing_wall`][walls::opposing_wall])
//!   and wall geometry used by ray casting.

pub mod maze;
pub mod walls;

pub use maze::{Maze, MazeBuilder, Tile};
pub use walls::{opposing_wall, wall_segment};
