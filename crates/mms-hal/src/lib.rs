//! `mms-hal` – the mouse hardware layer.
//!
//! # Modules
//!
//! - [`mouse`] – the [`Mouse`][mouse::Mouse] and
//!   [`Integrator`][mouse::Integrator] traits the control facade programs
//!   against.
//! - [`sensors`] – [`SensorRegistry`][sensors::SensorRegistry]: named range
//!   sensors refreshed on every pose change.
//! - [`sim`] – [`SimMouse`][sim::SimMouse]: a differential-drive mouse
//!   integrated from wheel speeds.

pub mod mouse;
pub mod sensors;
pub mod sim;

pub use mouse::{Integrator, Mouse};
pub use sensors::SensorRegistry;
pub use sim::{SimMouse, SimMouseBuilder};
