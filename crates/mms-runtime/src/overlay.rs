//! [`MazeGraphic`] – the display-side sink for algorithm annotations.
//!
//! Annotations never influence the simulation. The facade validates them and
//! forwards them here; whatever renders the maze implements the trait.
//! [`MazeOverlay`] is the bundled implementation: it keeps the annotation
//! state in memory and mirrors every change onto [`Topic::Overlay`].

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use mms_middleware::{EventBus, Topic};
use mms_types::{Cell, Color, Direction, Event, EventPayload};

const SOURCE: &str = "mms-runtime::overlay";

/// Receiver of tile annotations. Inputs are already validated.
pub trait MazeGraphic: Send + Sync {
    fn set_tile_color(&self, cell: Cell, color: Color);
    fn declare_wall(&self, cell: Cell, direction: Direction, exists: bool);
    fn undeclare_wall(&self, cell: Cell, direction: Direction);
    fn set_tile_fogginess(&self, cell: Cell, foggy: bool);
    /// `None` clears the text.
    fn set_tile_text(&self, cell: Cell, text: Option<String>);
}

#[derive(Debug, Default)]
struct OverlayState {
    colors: HashMap<Cell, Color>,
    walls: HashMap<(Cell, Direction), bool>,
    fog: HashSet<Cell>,
    text: HashMap<Cell, String>,
}

/// In-memory annotation layer with optional bus mirroring.
///
/// # Example
///
/// ```rust
/// use mms_runtime::overlay::{MazeGraphic, MazeOverlay};
/// use mms_types::{Cell, Color};
///
/// let overlay = MazeOverlay::new();
/// overlay.set_tile_color(Cell::new(1, 1), Color::Red);
/// assert_eq!(overlay.tile_color(Cell::new(1, 1)), Some(Color::Red));
/// ```
#[derive(Debug, Default)]
pub struct MazeOverlay {
    state: Mutex<OverlayState>,
    bus: Option<EventBus>,
}

impl MazeOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every annotation onto [`Topic::Overlay`] of `bus`.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn tile_color(&self, cell: Cell) -> Option<Color> {
        self.lock().colors.get(&cell).copied()
    }

    /// Declared state of a wall half, `None` when undeclared.
    pub fn declared_wall(&self, cell: Cell, direction: Direction) -> Option<bool> {
        self.lock().walls.get(&(cell, direction)).copied()
    }

    pub fn is_foggy(&self, cell: Cell) -> bool {
        self.lock().fog.contains(&cell)
    }

    pub fn tile_text(&self, cell: Cell) -> Option<String> {
        self.lock().text.get(&cell).cloned()
    }

    /// Number of declared wall halves.
    pub fn declared_wall_count(&self) -> usize {
        self.lock().walls.len()
    }

    fn lock(&self) -> MutexGuard<'_, OverlayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, payload: EventPayload) {
        if let Some(bus) = &self.bus {
            // Nobody listening is fine; the overlay state is authoritative.
            let _ = bus.publish_to(Topic::Overlay, Event::new(SOURCE, payload));
        }
    }
}

impl MazeGraphic for MazeOverlay {
    fn set_tile_color(&self, cell: Cell, color: Color) {
        self.lock().colors.insert(cell, color);
        self.publish(EventPayload::TileColor { cell, color });
    }

    fn declare_wall(&self, cell: Cell, direction: Direction, exists: bool) {
        self.lock().walls.insert((cell, direction), exists);
        self.publish(EventPayload::WallDeclared {
            cell,
            direction,
            exists,
        });
    }

    fn undeclare_wall(&self, cell: Cell, direction: Direction) {
        self.lock().walls.remove(&(cell, direction));
        self.publish(EventPayload::WallUndeclared { cell, direction });
    }

    fn set_tile_fogginess(&self, cell: Cell, foggy: bool) {
        {
            let mut state = self.lock();
            if foggy {
                state.fog.insert(cell);
            } else {
                state.fog.remove(&cell);
            }
        }
        self.publish(EventPayload::TileFog { cell, foggy });
    }

    fn set_tile_text(&self, cell: Cell, text: Option<String>) {
        {
            let mut state = self.lock();
            match &text {
                Some(t) => state.text.insert(cell, t.clone()),
                None => state.text.remove(&cell),
            };
        }
        self.publish(EventPayload::TileText { cell, text });
    }
}
