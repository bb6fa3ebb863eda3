//! Planar geometry primitives shared by the maze, sensor and motion code.
//!
//! All lengths are metres. The world frame has its origin at the outer
//! corner of tile `(0, 0)`, `+x` pointing east and `+y` pointing north.
//! Headings are measured counter-clockwise from north, so a heading of
//! 90° faces west and 270° faces east.
//!
//! # Example
//!
//! ```rust
//! use mms_types::geometry::{Angle, Cartesian};
//!
//! let heading = Angle::from_degrees(90.0);
//! let step = heading.heading_vector() * 2.0;
//! assert!((step.x - (-2.0)).abs() < 1e-9);
//! assert!(step.y.abs() < 1e-9);
//!
//! let p = Cartesian::new(1.0, 1.0) + step;
//! assert!((p.x - (-1.0)).abs() < 1e-9);
//! ```

use std::f64::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Cartesian
// ────────────────────────────────────────────────────────────────────────────

/// A point or displacement in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
}

impl Cartesian {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// z-component of the 3-D cross product.
    pub fn cross(self, rhs: Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Rotate counter-clockwise about the origin.
    pub fn rotated(self, angle: Angle) -> Self {
        let (sin, cos) = angle.radians().sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Cartesian {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Cartesian {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Cartesian {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Cartesian {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Cartesian {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Angle
// ────────────────────────────────────────────────────────────────────────────

/// An angle stored in radians.
///
/// Arithmetic does not wrap; call [`Angle::normalized`] or [`Angle::signed`]
/// when a canonical range is needed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub fn from_radians(radians: f64) -> Self {
        Self(radians)
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self(degrees.to_radians())
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    pub fn degrees(self) -> f64 {
        self.0.to_degrees()
    }

    /// The same direction expressed in `[0, 2π)`.
    pub fn normalized(self) -> Self {
        let r = self.0.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs.
        if r >= TAU { Self(0.0) } else { Self(r) }
    }

    /// The same direction expressed in `(-π, π]`.
    pub fn signed(self) -> Self {
        let r = self.normalized().0;
        if r > PI { Self(r - TAU) } else { Self(r) }
    }

    /// Unit vector pointing along this heading (north is `(0, 1)`).
    pub fn heading_vector(self) -> Cartesian {
        let (sin, cos) = self.0.sin_cos();
        Cartesian::new(-sin, cos)
    }
}

impl Add for Angle {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Angle {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Neg for Angle {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Segment
// ────────────────────────────────────────────────────────────────────────────

/// A closed line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Cartesian,
    pub end: Cartesian,
}

impl Segment {
    pub fn new(start: Cartesian, end: Cartesian) -> Self {
        Self { start, end }
    }

    /// `end - start`.
    pub fn delta(&self) -> Cartesian {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.delta().length()
    }

    /// Point at parameter `t`, where `t = 0` is `start` and `t = 1` is `end`.
    pub fn point_at(&self, t: f64) -> Cartesian {
        self.start + self.delta() * t
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.start, self.end)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aabb
// ────────────────────────────────────────────────────────────────────────────

/// An axis-aligned bounding box, defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Cartesian,
    pub max: Cartesian,
}

impl Aabb {
    /// Build a box from two opposite corners in any order.
    pub fn new(a: Cartesian, b: Cartesian) -> Self {
        Self {
            min: Cartesian::new(a.x.min(b.x), a.y.min(b.y)),
            max: Cartesian::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Grow the box by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Cartesian::new(self.min.x - margin, self.min.y - margin),
            max: Cartesian::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// True when the point lies inside or on the boundary.
    pub fn contains_point(&self, p: Cartesian) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// True when `other` overlaps or touches this box.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Polygon
// ────────────────────────────────────────────────────────────────────────────

/// A simple polygon given by its vertices in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Cartesian>,
}

impl Polygon {
    pub fn new(vertices: Vec<Cartesian>) -> Self {
        Self { vertices }
    }

    /// Regular `sides`-gon inscribed in a circle, first vertex due north of
    /// `center`. Used to approximate round bodies.
    pub fn regular(center: Cartesian, radius: f64, sides: usize) -> Self {
        let sides = sides.max(3);
        let step = TAU / sides as f64;
        let vertices = (0..sides)
            .map(|i| center + Angle::from_radians(step * i as f64).heading_vector() * radius)
            .collect();
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Cartesian] {
        &self.vertices
    }

    /// Unsigned area (shoelace formula). Degenerate polygons have zero area.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| self.vertices[i].cross(self.vertices[(i + 1) % n]))
            .sum();
        twice.abs() * 0.5
    }

    /// Rotate counter-clockwise about the origin, then translate.
    pub fn transformed(&self, rotation: Angle, translation: Cartesian) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| v.rotated(rotation) + translation)
                .collect(),
        }
    }
}
