//! [`Maze`] – immutable grid of tiles with wall flags.
//!
//! A maze is assembled once with [`MazeBuilder`] and never mutated during a
//! run. Wall queries are bounds-checked and return
//! [`MmsError::OutOfBounds`] instead of panicking.
//!
//! # Example
//!
//! ```rust
//! use mms_maze::MazeBuilder;
//! use mms_types::{Cell, Direction};
//!
//! let maze = MazeBuilder::bordered(3, 3)
//!     .with_wall(Cell::new(0, 0), Direction::East)
//!     .build()
//!     .unwrap();
//!
//! assert!(maze.is_wall(Cell::new(0, 0), Direction::East).unwrap());
//! // Both halves of an interior wall are set.
//! assert!(maze.is_wall(Cell::new(1, 0), Direction::West).unwrap());
//! assert!(!maze.is_wall(Cell::new(1, 1), Direction::North).unwrap());
//! ```

use serde::Serialize;
use tracing::debug;

use mms_types::{Cell, Direction, MmsError};

use crate::walls::opposing_wall;

/// Wall flags of one tile, indexed by [`Direction::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Tile {
    walls: [bool; 4],
}

impl Tile {
    pub fn is_wall(&self, direction: Direction) -> bool {
        self.walls[direction.index()]
    }

    /// Number of walls surrounding the tile.
    pub fn wall_count(&self) -> usize {
        self.walls.iter().filter(|w| **w).count()
    }
}

/// A rectangular maze of `width × height` tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Maze {
    width: i32,
    height: i32,
    // Column-major: tile (x, y) lives at x * height + y.
    tiles: Vec<Tile>,
}

impl Maze {
    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// True when `(x, y)` names a tile of this maze.
    pub fn within(&self, x: i32, y: i32) -> bool {
        0 <= x && x < self.width && 0 <= y && y < self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.within(cell.x, cell.y)
    }

    /// Look up the tile at `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::OutOfBounds`] when `cell` is outside the maze.
    pub fn tile(&self, cell: Cell) -> Result<&Tile, MmsError> {
        if !self.contains(cell) {
            return Err(MmsError::OutOfBounds {
                x: cell.x,
                y: cell.y,
            });
        }
        Ok(&self.tiles[(cell.x * self.height + cell.y) as usize])
    }

    /// Whether the tile at `cell` has a wall on its `direction` side.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::OutOfBounds`] when `cell` is outside the maze.
    pub fn is_wall(&self, cell: Cell, direction: Direction) -> Result<bool, MmsError> {
        Ok(self.tile(cell)?.is_wall(direction))
    }

    /// Every cell of the maze, column by column.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Cell::new(x, y)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder for [`Maze`]. Walls are recorded as given and checked in
/// [`MazeBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct MazeBuilder {
    width: i32,
    height: i32,
    perimeter: bool,
    walls: Vec<(Cell, Direction)>,
}

impl MazeBuilder {
    /// Start an empty `width × height` maze with no walls at all.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Start a `width × height` maze enclosed by its outer walls.
    pub fn bordered(width: i32, height: i32) -> Self {
        Self::new(width, height).with_perimeter()
    }

    /// Close the outer boundary of the maze.
    pub fn with_perimeter(mut self) -> Self {
        self.perimeter = true;
        self
    }

    /// Add a wall on the `direction` side of `cell`. The neighbouring half
    /// is set as well so the maze stays consistent.
    pub fn with_wall(mut self, cell: Cell, direction: Direction) -> Self {
        self.walls.push((cell, direction));
        self
    }

    /// Add several walls at once.
    pub fn with_walls(mut self, walls: impl IntoIterator<Item = (Cell, Direction)>) -> Self {
        self.walls.extend(walls);
        self
    }

    /// Validate the dimensions and walls and produce the maze.
    ///
    /// # Errors
    ///
    /// * [`MmsError::InvalidParameter`] for a non-positive width or height.
    /// * [`MmsError::OutOfBounds`] for a wall on a cell outside the maze.
    pub fn build(self) -> Result<Maze, MmsError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(MmsError::InvalidParameter {
                name: "maze dimensions".to_string(),
                details: format!("{}x{} has no tiles", self.width, self.height),
            });
        }

        let mut maze = Maze {
            width: self.width,
            height: self.height,
            tiles: vec![Tile::default(); (self.width * self.height) as usize],
        };

        if self.perimeter {
            for x in 0..self.width {
                set_half(&mut maze, Cell::new(x, 0), Direction::South);
                set_half(&mut maze, Cell::new(x, self.height - 1), Direction::North);
            }
            for y in 0..self.height {
                set_half(&mut maze, Cell::new(0, y), Direction::West);
                set_half(&mut maze, Cell::new(self.width - 1, y), Direction::East);
            }
        }

        for (cell, direction) in &self.walls {
            if !maze.contains(*cell) {
                return Err(MmsError::OutOfBounds {
                    x: cell.x,
                    y: cell.y,
                });
            }
            set_half(&mut maze, *cell, *direction);
            if let Some((other, other_dir)) =
                opposing_wall(*cell, *direction, maze.width, maze.height)
            {
                set_half(&mut maze, other, other_dir);
            }
        }

        debug!(
            width = maze.width,
            height = maze.height,
            walls = self.walls.len(),
            "maze built"
        );
        Ok(maze)
    }
}

fn set_half(maze: &mut Maze, cell: Cell, direction: Direction) {
    let index = (cell.x * maze.height + cell.y) as usize;
    maze.tiles[index].walls[direction.index()] = true;
}
