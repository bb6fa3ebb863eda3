//! `mms-types` – shared vocabulary of the micromouse simulator.
//!
//! Every other crate in the workspace speaks in these types: compass
//! [`Direction`]s, grid [`Cell`]s, tile [`Color`]s, the [`InterfaceMode`] an
//! algorithm declares, bus [`Event`]s and the workspace-wide [`MmsError`].
//!
//! # Modules
//!
//! - [`geometry`] – points, angles, segments, boxes and polygons.
//! - [`params`] – [`SimParams`][params::SimParams], run-wide tunables.

pub mod geometry;
pub mod params;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geometry::Angle;

pub use params::SimParams;

// ────────────────────────────────────────────────────────────────────────────
// Direction
// ────────────────────────────────────────────────────────────────────────────

/// One of the four compass directions. Clockwise order is N → E → S → W.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Position in [`Direction::ALL`].
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn turned_right(self) -> Self {
        Self::ALL[(self.index() + 1) % 4]
    }

    pub fn turned_left(self) -> Self {
        Self::ALL[(self.index() + 3) % 4]
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// Parse an annotation character (`n`, `e`, `s`, `w`, either case).
    pub fn from_char(c: char) -> Result<Self, MmsError> {
        match c.to_ascii_lowercase() {
            'n' => Ok(Direction::North),
            'e' => Ok(Direction::East),
            's' => Ok(Direction::South),
            'w' => Ok(Direction::West),
            _ => Err(MmsError::UnknownDirection(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Direction::North => 'n',
            Direction::East => 'e',
            Direction::South => 's',
            Direction::West => 'w',
        }
    }

    /// Heading a mouse has when squarely facing this direction.
    pub fn canonical_angle(self) -> Angle {
        match self {
            Direction::North => Angle::from_degrees(0.0),
            Direction::West => Angle::from_degrees(90.0),
            Direction::South => Angle::from_degrees(180.0),
            Direction::East => Angle::from_degrees(270.0),
        }
    }

    /// Grid offset of the neighbouring cell in this direction.
    pub fn unit_offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// Nearest cardinal direction to an arbitrary heading.
    pub fn from_angle(angle: Angle) -> Self {
        let quarter = ((angle.normalized().degrees() + 45.0) / 90.0).floor() as i64;
        match quarter.rem_euclid(4) {
            0 => Direction::North,
            1 => Direction::West,
            2 => Direction::South,
            _ => Direction::East,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::East => write!(f, "east"),
            Direction::South => write!(f, "south"),
            Direction::West => write!(f, "west"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cell
// ────────────────────────────────────────────────────────────────────────────

/// Integer grid coordinate of a maze tile. `(0, 0)` is the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Adjacent cell in `direction`, which may lie outside the maze.
    pub fn neighbor(self, direction: Direction) -> Self {
        let (dx, dy) = direction.unit_offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Color
// ────────────────────────────────────────────────────────────────────────────

/// Tile annotation colors available to algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Black,
    Blue,
    Gray,
    Cyan,
    Green,
    Orange,
    Red,
    White,
    Yellow,
    DarkBlue,
    DarkCyan,
    DarkGray,
    DarkGreen,
    DarkRed,
    DarkYellow,
}

impl Color {
    /// Parse an annotation character. Case matters: lowercase letters are
    /// the bright colors, uppercase their dark variants.
    pub fn from_char(c: char) -> Result<Self, MmsError> {
        let color = match c {
            'k' => Color::Black,
            'b' => Color::Blue,
            'a' => Color::Gray,
            'c' => Color::Cyan,
            'g' => Color::Green,
            'o' => Color::Orange,
            'r' => Color::Red,
            'w' => Color::White,
            'y' => Color::Yellow,
            'B' => Color::DarkBlue,
            'C' => Color::DarkCyan,
            'A' => Color::DarkGray,
            'G' => Color::DarkGreen,
            'R' => Color::DarkRed,
            'Y' => Color::DarkYellow,
            _ => return Err(MmsError::UnknownColor(c)),
        };
        Ok(color)
    }

    pub fn to_char(self) -> char {
        match self {
            Color::Black => 'k',
            Color::Blue => 'b',
            Color::Gray => 'a',
            Color::Cyan => 'c',
            Color::Green => 'g',
            Color::Orange => 'o',
            Color::Red => 'r',
            Color::White => 'w',
            Color::Yellow => 'y',
            Color::DarkBlue => 'B',
            Color::DarkCyan => 'C',
            Color::DarkGray => 'A',
            Color::DarkGreen => 'G',
            Color::DarkRed => 'R',
            Color::DarkYellow => 'Y',
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Interface mode
// ────────────────────────────────────────────────────────────────────────────

/// The control abstraction an algorithm declares once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceMode {
    /// Cell-by-cell moves and wall queries.
    Discrete,
    /// Raw wheel speeds and timed sensor reads.
    Continuous,
}

impl fmt::Display for InterfaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceMode::Discrete => write!(f, "discrete"),
            InterfaceMode::Continuous => write!(f, "continuous"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Events
// ────────────────────────────────────────────────────────────────────────────

/// Unified event wrapper for the simulator event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "mms-runtime::interface"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp a payload with a fresh id and the current UTC time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    TileColor { cell: Cell, color: Color },
    WallDeclared { cell: Cell, direction: Direction, exists: bool },
    WallUndeclared { cell: Cell, direction: Direction },
    TileFog { cell: Cell, foggy: bool },
    /// `None` clears the tile text.
    TileText { cell: Cell, text: Option<String> },
    /// The mouse tried to drive through a wall.
    Crashed { cell: Cell, direction: Direction },
    ModeViolation { operation: String, required: InterfaceMode },
    /// The run was asked to stop from outside the algorithm.
    QuitRequested { reason: String },
    Telemetry(PoseSnapshot),
}

/// Pose of the mouse at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub x: f64,
    pub y: f64,
    pub rotation_deg: f64,
    pub cell: Cell,
    pub direction: Direction,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Workspace-wide error type.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MmsError {
    #[error("{operation}() requires the {required} interface")]
    ModeViolation {
        operation: String,
        required: InterfaceMode,
    },

    #[error("{operation}() refused: the run ended after an interface mode violation")]
    RunTerminated { operation: String },

    #[error("interface already declared as {existing}, cannot switch to {requested}")]
    ModeAlreadyDeclared {
        existing: InterfaceMode,
        requested: InterfaceMode,
    },

    #[error("there is no tile at position ({x}, {y})")]
    OutOfBounds { x: i32, y: i32 },

    #[error("'{0}' is not mapped to a valid direction")]
    UnknownDirection(char),

    #[error("'{0}' is not mapped to a color")]
    UnknownColor(char),

    #[error("there is no sensor called \"{0}\"")]
    UnknownSensor(String),

    #[error("there is no input button with the number {0}")]
    InputButtonOutOfRange(i32),

    #[error("tile fog is not under algorithm control")]
    FogControlDenied,

    #[error("invalid parameter {name}: {details}")]
    InvalidParameter { name: String, details: String },

    #[error("event bus error: {0}")]
    Channel(String),

    #[error("configuration error: {0}")]
    Config(String),
}
