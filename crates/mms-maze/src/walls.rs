//! Wall geometry and neighbour coupling.
//!
//! Each wall is shared by two tiles. [`opposing_wall`] is the only place the
//! neighbour math lives; the annotation layer and the maze builder both go
//! through it.
//!
//! Walls are modelled with zero thickness on the tile boundary lines: tile
//! `(x, y)` covers `[x·L, (x+1)·L] × [y·L, (y+1)·L]` where `L` is the tile
//! length.

use mms_types::geometry::{Aabb, Cartesian, Segment};
use mms_types::{Cell, Direction};

/// Positions closer than this to a tile boundary count as lying on it.
pub const EDGE_EPSILON: f64 = 1e-7;

/// The other half of the wall on the `direction` side of `cell`, or `None`
/// when that side faces outside a `width × height` maze.
///
/// ```rust
/// use mms_maze::walls::opposing_wall;
/// use mms_types::{Cell, Direction};
///
/// assert_eq!(
///     opposing_wall(Cell::new(1, 1), Direction::North, 3, 3),
///     Some((Cell::new(1, 2), Direction::South))
/// );
/// assert_eq!(opposing_wall(Cell::new(0, 0), Direction::West, 3, 3), None);
/// ```
pub fn opposing_wall(
    cell: Cell,
    direction: Direction,
    width: i32,
    height: i32,
) -> Option<(Cell, Direction)> {
    let has_neighbour = match direction {
        Direction::North => cell.y < height - 1,
        Direction::East => cell.x < width - 1,
        Direction::South => cell.y > 0,
        Direction::West => cell.x > 0,
    };
    has_neighbour.then(|| (cell.neighbor(direction), direction.opposite()))
}

/// Footprint of `cell` in world coordinates.
pub fn tile_bounds(cell: Cell, tile_length: f64) -> Aabb {
    let min = Cartesian::new(cell.x as f64 * tile_length, cell.y as f64 * tile_length);
    Aabb::new(min, Cartesian::new(min.x + tile_length, min.y + tile_length))
}

/// The boundary segment occupied by the wall on the `direction` side of
/// `cell`.
pub fn wall_segment(cell: Cell, direction: Direction, tile_length: f64) -> Segment {
    let b = tile_bounds(cell, tile_length);
    match direction {
        Direction::North => Segment::new(
            Cartesian::new(b.min.x, b.max.y),
            Cartesian::new(b.max.x, b.max.y),
        ),
        Direction::East => Segment::new(
            Cartesian::new(b.max.x, b.min.y),
            Cartesian::new(b.max.x, b.max.y),
        ),
        Direction::South => Segment::new(
            Cartesian::new(b.min.x, b.min.y),
            Cartesian::new(b.max.x, b.min.y),
        ),
        Direction::West => Segment::new(
            Cartesian::new(b.min.x, b.min.y),
            Cartesian::new(b.min.x, b.max.y),
        ),
    }
}

/// True when the coordinate `pos` lies on a tile boundary line.
pub fn is_tile_edge(pos: f64, tile_length: f64) -> bool {
    let offset = pos.rem_euclid(tile_length);
    offset < EDGE_EPSILON || tile_length - offset < EDGE_EPSILON
}

/// Every tile whose closed footprint contains `point`.
///
/// A point strictly inside a tile yields one cell; a point on an edge yields
/// two and a point on a corner four. Cells outside the maze are still
/// returned; callers filter with [`Maze::contains`][crate::Maze::contains].
pub fn containing_cells(point: Cartesian, tile_length: f64) -> Vec<Cell> {
    let axis = |pos: f64| -> Vec<i32> {
        let base = (pos / tile_length).floor() as i32;
        if is_tile_edge(pos, tile_length) {
            let nearest = (pos / tile_length).round() as i32;
            vec![nearest - 1, nearest]
        } else {
            vec![base]
        }
    };
    let xs = axis(point.x);
    let ys = axis(point.y);
    xs.iter()
        .flat_map(|x| ys.iter().map(move |y| Cell::new(*x, *y)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: f64 = 0.18;

    #[test]
    fn opposing_wall_covers_all_directions() {
        let c = Cell::new(1, 1);
        assert_eq!(
            opposing_wall(c, Direction::East, 3, 3),
            Some((Cell::new(2, 1), Direction::West))
        );
        assert_eq!(
            opposing_wall(c, Direction::South, 3, 3),
            Some((Cell::new(1, 0), Direction::North))
        );
        assert_eq!(
            opposing_wall(c, Direction::West, 3, 3),
            Some((Cell::new(0, 1), Direction::East))
        );
    }

    #[test]
    fn opposing_wall_is_involutive() {
        for x in 0..3 {
            for y in 0..3 {
                for d in Direction::ALL {
                    if let Some((other, od)) = opposing_wall(Cell::new(x, y), d, 3, 3) {
                        assert_eq!(opposing_wall(other, od, 3, 3), Some((Cell::new(x, y), d)));
                    }
                }
            }
        }
    }

    #[test]
    fn boundary_walls_have_no_opposite() {
        assert_eq!(opposing_wall(Cell::new(2, 2), Direction::North, 3, 3), None);
        assert_eq!(opposing_wall(Cell::new(2, 2), Direction::East, 3, 3), None);
        assert_eq!(opposing_wall(Cell::new(0, 0), Direction::South, 3, 3), None);
    }

    #[test]
    fn opposite_halves_share_a_segment() {
        let a = wall_segment(Cell::new(0, 0), Direction::North, L);
        let b = wall_segment(Cell::new(0, 1), Direction::South, L);
        assert_eq!(a, b);
        let e = wall_segment(Cell::new(2, 3), Direction::East, L);
        assert!((e.start.x - 3.0 * L).abs() < 1e-12);
        assert!((e.length() - L).abs() < 1e-12);
    }

    #[test]
    fn tile_edge_detection_tolerates_rounding() {
        assert!(is_tile_edge(0.0, L));
        assert!(is_tile_edge(3.0 * L, L));
        assert!(is_tile_edge(2.0 * L - 1e-9, L));
        assert!(!is_tile_edge(0.5 * L, L));
    }

    #[test]
    fn containing_cells_on_edge_and_corner() {
        let inside = containing_cells(Cartesian::new(0.5 * L, 0.5 * L), L);
        assert_eq!(inside, vec![Cell::new(0, 0)]);

        let edge = containing_cells(Cartesian::new(L, 0.5 * L), L);
        assert_eq!(edge.len(), 2);
        assert!(edge.contains(&Cell::new(0, 0)) && edge.contains(&Cell::new(1, 0)));

        let corner = containing_cells(Cartesian::new(L, L), L);
        assert_eq!(corner.len(), 4);
    }
}
