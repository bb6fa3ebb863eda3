//! [`SensorRegistry`] – named range sensors carried by a mouse.
//!
//! Sensors are looked up by the name an algorithm passes to `read`. Every
//! registered sensor is refreshed together whenever the mouse pose changes.

use std::collections::HashMap;
use std::time::Duration;

use mms_maze::Maze;
use mms_perception::RangeSensor;
use mms_types::geometry::{Angle, Cartesian};

/// Central registry of a mouse's range sensors.
#[derive(Debug, Default, Clone)]
pub struct SensorRegistry {
    sensors: HashMap<String, RangeSensor>,
}

impl SensorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensor under `name`. Any previously registered sensor with
    /// the same name is replaced.
    pub fn register(&mut self, name: impl Into<String>, sensor: RangeSensor) {
        self.sensors.insert(name.into(), sensor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sensors.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&RangeSensor> {
        self.sensors.get(name)
    }

    pub fn read(&self, name: &str) -> Option<f64> {
        self.sensors.get(name).map(RangeSensor::read)
    }

    pub fn read_duration(&self, name: &str) -> Option<Duration> {
        self.sensors.get(name).map(RangeSensor::read_duration)
    }

    /// Sensor names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sensors.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Refresh every sensor for a mouse at `position` facing `direction`.
    pub fn update_all(&mut self, position: Cartesian, direction: Angle, maze: &Maze, tile_length: f64) {
        for sensor in self.sensors.values_mut() {
            sensor.update_reading(position, direction, maze, tile_length);
        }
    }
}
