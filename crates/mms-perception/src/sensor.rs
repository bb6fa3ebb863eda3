//! [`RangeSensor`] – a cone-shaped range sensor mounted on the mouse.
//!
//! The sensor sees a circular sector of radius `range` and half-angle
//! `half_width` centred on its mount direction. Each update casts a fan of
//! rays across that sector; every ray is cut short at the first wall it
//! touches. The clipped fan forms the *view polygon*, from which the scalar
//! reading is derived.
//!
//! Poses passed to [`RangeSensor::view_polygon`] and
//! [`RangeSensor::update_reading`] are the **mouse** pose. The sensor applies
//! its own mount offset and mount direction.
//!
//! # Reading models
//!
//! | Model | Value |
//! |---|---|
//! | [`ReadingModel::VisibleArea`] | `1 − visible_area / full_sector_area` |
//! | [`ReadingModel::NearestHit`] | `1 − nearest_distance / range` |
//!
//! Both stay in `[0, 1]`: `0` when nothing is in range, approaching `1` as a
//! wall closes in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use mms_maze::Maze;
use mms_types::MmsError;
use mms_types::geometry::{Angle, Cartesian, Polygon};

use crate::raycast::cast_ray;

/// Number of sides used for the body outline.
const BODY_SIDES: usize = 16;

/// How a clipped view is turned into a scalar reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingModel {
    #[default]
    VisibleArea,
    NearestHit,
}

/// Static description of a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Radius of the sensor body, metres.
    pub radius: f64,
    /// Maximum sensing distance, metres.
    pub range: f64,
    /// Half of the field of view.
    pub half_width: Angle,
    /// Nominal time one read takes.
    pub read_duration: Duration,
    /// Offset of the sensor from the mouse centre, in the mouse frame
    /// (`+y` forward, `+x` to the right).
    pub mount_position: Cartesian,
    /// Direction relative to the mouse heading (counter-clockwise).
    pub mount_direction: Angle,
    #[serde(default)]
    pub model: ReadingModel,
}

/// Latest state of a sensor. Only one reading is ever kept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorReading {
    pub value: f64,
    /// Distance to the nearest wall within the field of view, or the full
    /// range when none is visible.
    pub distance: f64,
    pub view: Polygon,
}

/// A range sensor with its most recent reading.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use mms_maze::MazeBuilder;
/// use mms_perception::sensor::{RangeSensor, ReadingModel, SensorSpec};
/// use mms_types::geometry::{Angle, Cartesian};
///
/// let maze = MazeBuilder::bordered(1, 4).build().unwrap();
/// let mut sensor = RangeSensor::new(SensorSpec {
///     radius: 0.01,
///     range: 0.5,
///     half_width: Angle::from_degrees(5.0),
///     read_duration: Duration::from_millis(1),
///     mount_position: Cartesian::zero(),
///     mount_direction: Angle::from_degrees(0.0),
///     model: ReadingModel::NearestHit,
/// })
/// .unwrap();
///
/// // Facing north from the centre of tile (0, 0): the view is open.
/// sensor.update_reading(Cartesian::new(0.09, 0.09), Angle::from_degrees(0.0), &maze, 0.18);
/// assert!(sensor.read() < 1e-9);
///
/// // Facing the west wall, 0.09 m away.
/// sensor.update_reading(Cartesian::new(0.09, 0.09), Angle::from_degrees(90.0), &maze, 0.18);
/// assert!((sensor.distance() - 0.09).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct RangeSensor {
    spec: SensorSpec,
    initial_polygon: Polygon,
    initial_view_polygon: Polygon,
    reading: SensorReading,
}

impl RangeSensor {
    /// Create a sensor. The first reading reports nothing in view.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::InvalidParameter`] when the range is not positive,
    /// the radius is negative or the half-width is outside `(0°, 180°)`.
    pub fn new(spec: SensorSpec) -> Result<Self, MmsError> {
        if !(spec.range.is_finite() && spec.range > 0.0) {
            return Err(MmsError::InvalidParameter {
                name: "sensor range".to_string(),
                details: format!("must be positive, got {}", spec.range),
            });
        }
        if !(spec.radius.is_finite() && spec.radius >= 0.0) {
            return Err(MmsError::InvalidParameter {
                name: "sensor radius".to_string(),
                details: format!("must be non-negative, got {}", spec.radius),
            });
        }
        let hw = spec.half_width.degrees();
        if !(hw > 0.0 && hw < 180.0) {
            return Err(MmsError::InvalidParameter {
                name: "sensor half width".to_string(),
                details: format!("must lie in (0, 180) degrees, got {hw}"),
            });
        }

        let initial_polygon = Polygon::regular(spec.mount_position, spec.radius, BODY_SIDES);
        let initial_view_polygon = Polygon::new(sector_vertices(
            spec.mount_position,
            spec.mount_direction,
            &spec,
        ));
        let reading = SensorReading {
            value: 0.0,
            distance: spec.range,
            view: initial_view_polygon.clone(),
        };
        Ok(Self {
            spec,
            initial_polygon,
            initial_view_polygon,
            reading,
        })
    }

    pub fn spec(&self) -> &SensorSpec {
        &self.spec
    }

    pub fn read_duration(&self) -> Duration {
        self.spec.read_duration
    }

    /// Outline of the sensor body in the mouse frame.
    pub fn initial_polygon(&self) -> &Polygon {
        &self.initial_polygon
    }

    /// Unclipped field of view in the mouse frame.
    pub fn initial_view_polygon(&self) -> &Polygon {
        &self.initial_view_polygon
    }

    /// Field of view for a mouse at `position` facing `direction`, clipped
    /// by the walls of `maze`.
    pub fn view_polygon(
        &self,
        position: Cartesian,
        direction: Angle,
        maze: &Maze,
        tile_length: f64,
    ) -> Polygon {
        self.clipped_view(position, direction, maze, tile_length).0
    }

    /// Recompute the view and the reading. The previous reading is
    /// discarded.
    pub fn update_reading(
        &mut self,
        position: Cartesian,
        direction: Angle,
        maze: &Maze,
        tile_length: f64,
    ) {
        let (view, distance) = self.clipped_view(position, direction, maze, tile_length);
        let value = match self.spec.model {
            ReadingModel::NearestHit => 1.0 - distance / self.spec.range,
            ReadingModel::VisibleArea => {
                let full = self.initial_view_polygon.area();
                if full > 0.0 {
                    1.0 - view.area() / full
                } else {
                    0.0
                }
            }
        };
        let value = value.clamp(0.0, 1.0);
        trace!(value, distance, "sensor reading updated");
        self.reading = SensorReading {
            value,
            distance,
            view,
        };
    }

    /// Latest scalar reading.
    pub fn read(&self) -> f64 {
        self.reading.value
    }

    /// Latest nearest-wall distance.
    pub fn distance(&self) -> f64 {
        self.reading.distance
    }

    /// Latest clipped view polygon, in world coordinates.
    pub fn last_view(&self) -> &Polygon {
        &self.reading.view
    }

    // Returns the clipped polygon together with the nearest hit distance.
    fn clipped_view(
        &self,
        position: Cartesian,
        direction: Angle,
        maze: &Maze,
        tile_length: f64,
    ) -> (Polygon, f64) {
        let apex = position + self.spec.mount_position.rotated(direction);
        let heading = direction + self.spec.mount_direction;

        let mut vertices = vec![apex];
        let mut nearest = self.spec.range;
        for end in sector_vertices(apex, heading, &self.spec).into_iter().skip(1) {
            let hit = cast_ray(apex, end, maze, tile_length);
            nearest = nearest.min(hit.distance);
            vertices.push(hit.point);
        }
        (Polygon::new(vertices), nearest)
    }
}

/// Apex followed by the arc vertices of the unclipped sector, sweeping
/// counter-clockwise. The ray count is odd so one ray lies on the axis.
fn sector_vertices(apex: Cartesian, heading: Angle, spec: &SensorSpec) -> Vec<Cartesian> {
    let rays = ray_count(spec.half_width);
    let step = spec.half_width * (2.0 / (rays - 1) as f64);
    let first = heading - spec.half_width;
    let mut vertices = Vec::with_capacity(rays + 1);
    vertices.push(apex);
    for i in 0..rays {
        let angle = first + step * i as f64;
        vertices.push(apex + angle.heading_vector() * spec.range);
    }
    vertices
}

// Roughly one ray per degree, never fewer than three.
fn ray_count(half_width: Angle) -> usize {
    let per_side = half_width.degrees().ceil().max(1.0) as usize;
    2 * per_side + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use mms_maze::MazeBuilder;
    use mms_types::{Cell, Direction};

    const L: f64 = 0.18;

    fn spec(model: ReadingModel) -> SensorSpec {
        SensorSpec {
            radius: 0.005,
            range: 2.0 * L,
            half_width: Angle::from_degrees(10.0),
            read_duration: Duration::from_millis(2),
            mount_position: Cartesian::zero(),
            mount_direction: Angle::from_degrees(0.0),
            model,
        }
    }

    fn centre(x: f64, y: f64) -> Cartesian {
        Cartesian::new((x + 0.5) * L, (y + 0.5) * L)
    }

    #[test]
    fn clear_view_reports_full_range_and_zero() {
        let maze = MazeBuilder::bordered(1, 5).build().unwrap();
        for model in [ReadingModel::VisibleArea, ReadingModel::NearestHit] {
            let mut sensor = RangeSensor::new(spec(model)).unwrap();
            sensor.update_reading(centre(0.0, 0.0), Angle::from_degrees(0.0), &maze, L);
            assert!((sensor.distance() - 2.0 * L).abs() < 1e-9);
            assert!(sensor.read().abs() < 1e-9, "{model:?} read {}", sensor.read());
        }
    }

    #[test]
    fn wall_within_range_clips_distance() {
        let maze = MazeBuilder::bordered(1, 5)
            .with_wall(Cell::new(0, 1), Direction::North)
            .build()
            .unwrap();
        let mut sensor = RangeSensor::new(spec(ReadingModel::NearestHit)).unwrap();
        sensor.update_reading(centre(0.0, 0.0), Angle::from_degrees(0.0), &maze, L);
        assert!((sensor.distance() - 1.5 * L).abs() < 1e-9);
        assert!((sensor.read() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn reading_grows_as_wall_approaches() {
        let near = MazeBuilder::bordered(1, 5)
            .with_wall(Cell::new(0, 0), Direction::North)
            .build()
            .unwrap();
        let far = MazeBuilder::bordered(1, 5)
            .with_wall(Cell::new(0, 1), Direction::North)
            .build()
            .unwrap();
        let mut sensor = RangeSensor::new(spec(ReadingModel::VisibleArea)).unwrap();
        sensor.update_reading(centre(0.0, 0.0), Angle::from_degrees(0.0), &far, L);
        let far_value = sensor.read();
        sensor.update_reading(centre(0.0, 0.0), Angle::from_degrees(0.0), &near, L);
        let near_value = sensor.read();
        assert!(far_value > 0.0);
        assert!(near_value > far_value);
        assert!(near_value <= 1.0);
    }

    #[test]
    fn mount_offset_and_direction_are_applied() {
        let maze = MazeBuilder::bordered(3, 1).build().unwrap();
        let mut s = spec(ReadingModel::NearestHit);
        // Pointing to the mouse's right, mounted 0.02 m ahead of centre.
        s.mount_position = Cartesian::new(0.0, 0.02);
        s.mount_direction = Angle::from_degrees(-90.0);
        s.half_width = Angle::from_degrees(2.0);
        s.range = 5.0 * L;
        let mut sensor = RangeSensor::new(s).unwrap();
        // Mouse faces north in tile (0, 0): the sensor looks east across
        // three tiles to the boundary at x = 3L.
        sensor.update_reading(centre(0.0, 0.0), Angle::from_degrees(0.0), &maze, L);
        assert!((sensor.distance() - 2.5 * L).abs() < 1e-3);
    }

    #[test]
    fn view_polygon_is_apex_plus_odd_fan() {
        let maze = MazeBuilder::bordered(1, 5).build().unwrap();
        let sensor = RangeSensor::new(spec(ReadingModel::VisibleArea)).unwrap();
        let view = sensor.view_polygon(centre(0.0, 0.0), Angle::from_degrees(0.0), &maze, L);
        let arc = view.vertices().len() - 1;
        assert_eq!(arc % 2, 1);
        assert_eq!(view.vertices()[0], centre(0.0, 0.0));
        // Centre ray points straight ahead.
        let mid = view.vertices()[1 + arc / 2];
        assert!((mid.x - centre(0.0, 0.0).x).abs() < 1e-9);
    }

    #[test]
    fn initial_polygons_live_in_mouse_frame() {
        let sensor = RangeSensor::new(spec(ReadingModel::VisibleArea)).unwrap();
        assert_eq!(sensor.initial_polygon().vertices().len(), BODY_SIDES);
        assert_eq!(sensor.initial_view_polygon().vertices()[0], Cartesian::zero());
        assert!(sensor.initial_view_polygon().area() > 0.0);
        assert_eq!(sensor.read(), 0.0);
        assert_eq!(sensor.last_view(), sensor.initial_view_polygon());
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let mut s = spec(ReadingModel::VisibleArea);
        s.range = 0.0;
        assert!(RangeSensor::new(s).is_err());
        let mut s = spec(ReadingModel::VisibleArea);
        s.half_width = Angle::from_degrees(200.0);
        assert!(RangeSensor::new(s).is_err());
    }

    #[test]
    fn reading_model_deserializes_snake_case() {
        let m: ReadingModel = serde_json::from_str("\"nearest_hit\"").unwrap();
        assert_eq!(m, ReadingModel::NearestHit);
    }
}
