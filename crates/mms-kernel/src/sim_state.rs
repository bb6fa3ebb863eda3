//! [`SimState`] – process-wide simulation flags shared between the harness
//! and the control facade.
//!
//! All fields are atomics so the harness (UI thread, Ctrl-C handler) can
//! flip them while an algorithm is blocked inside a motion loop. The state
//! is passed around explicitly as `Arc<SimState>`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::{info, warn};

use mms_types::{InterfaceMode, MmsError};

use crate::mode_guard::ModeGuard;

/// Number of input buttons exposed to algorithms (indices `0..=9`).
pub const INPUT_BUTTON_COUNT: usize = 10;

/// Shared simulation flags.
#[derive(Debug)]
pub struct SimState {
    paused: AtomicBool,
    crashed: AtomicBool,
    quit: AtomicBool,
    // f64 bit pattern.
    sim_speed: AtomicU64,
    input_buttons: [AtomicBool; INPUT_BUTTON_COUNT],
    mode: ModeGuard,
}

impl Default for SimState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SimState {
    /// Create a running, uncrashed state with the given speed multiplier.
    /// Non-positive speeds fall back to `1.0`.
    pub fn new(sim_speed: f64) -> Self {
        let speed = if sim_speed.is_finite() && sim_speed > 0.0 { sim_speed } else { 1.0 };
        Self {
            paused: AtomicBool::new(false),
            crashed: AtomicBool::new(false),
            quit: AtomicBool::new(false),
            sim_speed: AtomicU64::new(speed.to_bits()),
            input_buttons: std::array::from_fn(|_| AtomicBool::new(false)),
            mode: ModeGuard::new(),
        }
    }

    // ── Pause ────────────────────────────────────────────────────────────

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    // ── Crash ────────────────────────────────────────────────────────────

    pub fn crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }

    /// Mark the mouse as crashed. Returns `true` only for the call that
    /// actually set the flag.
    pub fn set_crashed(&self) -> bool {
        let newly = !self.crashed.swap(true, Ordering::SeqCst);
        if newly {
            warn!("mouse crashed into a wall");
        }
        newly
    }

    // ── Quit ─────────────────────────────────────────────────────────────

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    pub fn request_quit(&self) {
        if !self.quit.swap(true, Ordering::SeqCst) {
            info!("simulation quit requested");
        }
    }

    // ── Speed ────────────────────────────────────────────────────────────

    pub fn sim_speed(&self) -> f64 {
        f64::from_bits(self.sim_speed.load(Ordering::SeqCst))
    }

    /// Change the speed multiplier picked up by running motion loops.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::InvalidParameter`] for non-positive speeds.
    pub fn set_sim_speed(&self, speed: f64) -> Result<(), MmsError> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(MmsError::InvalidParameter {
                name: "sim_speed".to_string(),
                details: format!("must be positive, got {speed}"),
            });
        }
        self.sim_speed.store(speed.to_bits(), Ordering::SeqCst);
        Ok(())
    }

    // ── Input buttons ────────────────────────────────────────────────────

    /// Record a press of input button `index` (harness side).
    pub fn press_input_button(&self, index: i32) -> Result<(), MmsError> {
        self.button(index)?.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Whether button `index` has been pressed and not yet acknowledged.
    pub fn input_button_pressed(&self, index: i32) -> Result<bool, MmsError> {
        Ok(self.button(index)?.load(Ordering::SeqCst))
    }

    /// Clear the pressed flag of button `index`.
    pub fn acknowledge_input_button(&self, index: i32) -> Result<(), MmsError> {
        self.button(index)?.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn button(&self, index: i32) -> Result<&AtomicBool, MmsError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.input_buttons.get(i))
            .ok_or(MmsError::InputButtonOutOfRange(index))
    }

    // ── Interface mode ───────────────────────────────────────────────────

    pub fn mode_guard(&self) -> &ModeGuard {
        &self.mode
    }

    /// Declare the interface mode for this run.
    pub fn declare_interface(&self, mode: InterfaceMode) -> Result<(), MmsError> {
        self.mode.declare(mode)?;
        info!(%mode, "interface declared");
        Ok(())
    }
}
