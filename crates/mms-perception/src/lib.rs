//! `mms-perception` – what the mouse can see.
//!
//! # Modules
//!
//! - [`raycast`] – [`cast_ray`][raycast::cast_ray]: first wall hit along a
//!   segment, with deterministic tie-breaking on tile edges.
//! - [`sensor`] – [`RangeSensor`][sensor::RangeSensor]: cone-shaped range
//!   sensor producing a clipped view polygon and a scalar reading.

pub mod raycast;
pub mod sensor;

pub use raycast::{RayHit, cast_ray};
pub use sensor::{RangeSensor, ReadingModel, SensorSpec};
