//! `mms-runtime` – the algorithm-facing side of the simulator.
//!
//! Everything an algorithm touches goes through [`MouseInterface`]; the
//! rest of this crate is what that facade needs to run.
//!
//! # Modules
//!
//! - [`interface`] – [`MouseInterface`]: discrete moves with
//!   command-sleep-check loops, continuous wheel control with frame-paced
//!   sensor reads, tile annotations and interface-mode enforcement.
//! - [`motion`] – destinations, wheel commands and one-sided stop
//!   predicates for forward moves and quarter turns.
//! - [`overlay`] – [`MazeGraphic`] sink for annotations and the in-memory
//!   [`MazeOverlay`] that mirrors them onto the event bus.
//! - [`lockstep`] – [`LockstepClock`], simulated time that steps the mouse
//!   on every sleep. Deterministic runs and tests use it instead of
//!   [`SystemClock`][mms_kernel::SystemClock].
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging plus an optional OTLP span exporter.

pub mod interface;
pub mod lockstep;
pub mod motion;
pub mod overlay;
pub mod telemetry;

pub use interface::MouseInterface;
pub use lockstep::LockstepClock;
pub use motion::Turn;
pub use overlay::{MazeGraphic, MazeOverlay};
pub use telemetry::{LogFormat, TelemetryGuard, init_tracing};
