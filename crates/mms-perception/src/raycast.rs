//! Ray casting against maze walls.
//!
//! [`cast_ray`] walks a segment from `start` to `end` and reports the first
//! wall it touches. Only tiles whose footprint overlaps the segment's
//! bounding box are examined, so the cost scales with the ray length rather
//! than the maze size.
//!
//! # Tie-breaking
//!
//! Every interior wall belongs to two tiles and the two halves occupy the
//! same segment, so exact ties are common. Hits closer than
//! [`EDGE_EPSILON`] to each other are considered equal; among them a wall
//! owned by a tile containing the ray start wins, then the smallest
//! `(Cell, Direction)` pair. The result is therefore deterministic even for
//! rays starting on a tile edge.
//!
//! # Example
//!
//! ```rust
//! use mms_maze::MazeBuilder;
//! use mms_perception::raycast::cast_ray;
//! use mms_types::geometry::Cartesian;
//! use mms_types::{Cell, Direction};
//!
//! let maze = MazeBuilder::bordered(1, 1).build().unwrap();
//! let hit = cast_ray(Cartesian::new(0.5, 0.5), Cartesian::new(0.5, 3.0), &maze, 1.0);
//! assert!((hit.distance - 0.5).abs() < 1e-9);
//! assert_eq!(hit.wall, Some((Cell::new(0, 0), Direction::North)));
//! ```

use mms_maze::Maze;
use mms_maze::walls::{EDGE_EPSILON, containing_cells, wall_segment};
use mms_types::geometry::{Cartesian, Segment};
use mms_types::{Cell, Direction};

/// Outcome of a single ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Where the ray stopped: the hit point, or `end` when nothing was hit.
    pub point: Cartesian,
    /// Distance from `start` to `point`.
    pub distance: f64,
    /// The wall that stopped the ray, if any.
    pub wall: Option<(Cell, Direction)>,
}

impl RayHit {
    pub fn is_hit(&self) -> bool {
        self.wall.is_some()
    }
}

/// Cast a ray from `start` to `end` through `maze` whose tiles are
/// `tile_length` metres wide.
pub fn cast_ray(start: Cartesian, end: Cartesian, maze: &Maze, tile_length: f64) -> RayHit {
    let ray = Segment::new(start, end);
    let miss = RayHit {
        point: end,
        distance: ray.length(),
        wall: None,
    };
    if ray.length() < EDGE_EPSILON {
        return miss;
    }

    let bounds = ray.bounds().expanded(EDGE_EPSILON);
    let x_lo = ((bounds.min.x / tile_length).floor() as i32).max(0);
    let x_hi = ((bounds.max.x / tile_length).floor() as i32).min(maze.width() - 1);
    let y_lo = ((bounds.min.y / tile_length).floor() as i32).max(0);
    let y_hi = ((bounds.max.y / tile_length).floor() as i32).min(maze.height() - 1);

    let start_cells = containing_cells(start, tile_length);
    let mut best: Option<(f64, Cell, Direction)> = None;

    for x in x_lo..=x_hi {
        for y in y_lo..=y_hi {
            let cell = Cell::new(x, y);
            for direction in Direction::ALL {
                if !maze.is_wall(cell, direction).unwrap_or(false) {
                    continue;
                }
                let wall = wall_segment(cell, direction, tile_length);
                let Some(t) = intersect(&ray, &wall) else {
                    continue;
                };
                let distance = t * ray.length();
                if is_better(distance, cell, direction, best, &start_cells) {
                    best = Some((distance, cell, direction));
                }
            }
        }
    }

    match best {
        Some((distance, cell, direction)) => RayHit {
            point: start + ray.delta() * (distance / ray.length()),
            distance,
            wall: Some((cell, direction)),
        },
        None => miss,
    }
}

fn is_better(
    distance: f64,
    cell: Cell,
    direction: Direction,
    best: Option<(f64, Cell, Direction)>,
    start_cells: &[Cell],
) -> bool {
    let Some((best_distance, best_cell, best_direction)) = best else {
        return true;
    };
    if distance < best_distance - EDGE_EPSILON {
        return true;
    }
    if distance > best_distance + EDGE_EPSILON {
        return false;
    }
    let key = (!start_cells.contains(&cell), cell, direction);
    let best_key = (!start_cells.contains(&best_cell), best_cell, best_direction);
    key < best_key
}

/// Parameter `t ∈ [0, 1]` along `ray` of its first contact with `wall`.
///
/// Touching an endpoint within [`EDGE_EPSILON`] counts as contact. A
/// collinear overlap reports its point nearest to the ray start.
fn intersect(ray: &Segment, wall: &Segment) -> Option<f64> {
    let r = ray.delta();
    let s = wall.delta();
    let qp = wall.start - ray.start;
    let denom = r.cross(s);
    let r_len = r.length();
    let t_eps = EDGE_EPSILON / r_len;

    if denom.abs() < 1e-15 {
        // Parallel: only a collinear overlap can touch.
        if qp.cross(r).abs() / r_len > EDGE_EPSILON {
            return None;
        }
        let rr = r.dot(r);
        let t0 = qp.dot(r) / rr;
        let t1 = (wall.end - ray.start).dot(r) / rr;
        let lo = t0.min(t1).max(0.0);
        let hi = t0.max(t1).min(1.0);
        return (lo <= hi + t_eps).then_some(lo.min(1.0));
    }

    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    let u_eps = EDGE_EPSILON / s.length();
    if t < -t_eps || t > 1.0 + t_eps || u < -u_eps || u > 1.0 + u_eps {
        return None;
    }
    Some(t.clamp(0.0, 1.0))
}
