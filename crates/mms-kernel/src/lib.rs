//! `mms-kernel` – simulation state and rule enforcement.
//!
//! # Modules
//!
//! - [`clock`] – [`Clock`][clock::Clock]: injectable time source used by every
//!   motion loop and timed read.
//! - [`mode_guard`] – [`ModeGuard`][mode_guard::ModeGuard]: write-once
//!   interface declaration and per-operation mode checks.
//! - [`sim_state`] – [`SimState`][sim_state::SimState]: paused, crashed, quit,
//!   speed and input-button flags shared across threads.

pub mod clock;
pub mod mode_guard;
pub mod sim_state;

pub use clock::{Clock, SystemClock};
pub use mode_guard::ModeGuard;
pub use sim_state::{INPUT_BUTTON_COUNT, SimState};
