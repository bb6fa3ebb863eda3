//! [`ModeGuard`] – enforces the one-interface-per-run rule.
//!
//! The guard starts uninitialised. An algorithm declares its
//! [`InterfaceMode`] exactly once; afterwards every mode-specific operation
//! calls [`ModeGuard::check`] and must not run if it fails. The first
//! failed check ends the run: every later check fails with
//! [`MmsError::RunTerminated`], whatever mode it asks for.
//!
//! ```text
//! Uninitialized ──declare(Discrete)──▶ Discrete
//!       │
//!       └────────declare(Continuous)──▶ Continuous
//! ```

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use mms_types::{InterfaceMode, MmsError};

/// Write-once record of the declared interface mode.
///
/// # Example
///
/// ```
/// use mms_kernel::mode_guard::ModeGuard;
/// use mms_types::{InterfaceMode, MmsError};
///
/// let guard = ModeGuard::new();
/// guard.declare(InterfaceMode::Discrete).unwrap();
///
/// assert!(guard.check("move_forward", InterfaceMode::Discrete).is_ok());
/// assert!(matches!(
///     guard.check("read", InterfaceMode::Continuous),
///     Err(MmsError::ModeViolation { .. })
/// ));
/// ```
#[derive(Debug, Default)]
pub struct ModeGuard {
    mode: OnceLock<InterfaceMode>,
    violated: AtomicBool,
}

impl ModeGuard {
    /// Create an uninitialised guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the interface mode for this run. Declaring the same mode
    /// again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::ModeAlreadyDeclared`] when a different mode was
    /// declared earlier.
    pub fn declare(&self, mode: InterfaceMode) -> Result<(), MmsError> {
        let existing = *self.mode.get_or_init(|| mode);
        if existing == mode {
            Ok(())
        } else {
            Err(MmsError::ModeAlreadyDeclared {
                existing,
                requested: mode,
            })
        }
    }

    /// The declared mode, or `None` while uninitialised.
    pub fn mode(&self) -> Option<InterfaceMode> {
        self.mode.get().copied()
    }

    /// Whether a check has ever failed with a mode violation.
    pub fn violated(&self) -> bool {
        self.violated.load(Ordering::SeqCst)
    }

    /// Return `Ok(())` when `required` is the declared mode, or
    /// [`MmsError::ModeViolation`] otherwise (including before any
    /// declaration). After the first violation every call returns
    /// [`MmsError::RunTerminated`].
    pub fn check(&self, operation: &str, required: InterfaceMode) -> Result<(), MmsError> {
        if self.violated() {
            return Err(MmsError::RunTerminated {
                operation: operation.to_string(),
            });
        }
        if self.mode() == Some(required) {
            Ok(())
        } else {
            self.violated.store(true, Ordering::SeqCst);
            Err(MmsError::ModeViolation {
                operation: operation.to_string(),
                required,
            })
        }
    }
}
