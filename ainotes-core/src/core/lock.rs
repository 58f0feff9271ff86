//! Lock-gate rules: PIN validation and comparison.
//!
//! A single PIN guards all locked notes. It is stored in plaintext and
//! compared byte-for-byte; the threat model is casual peeking, not a
//! cryptographic boundary.

use crate::{AinotesError, Result};

/// Minimum length accepted when setting a new PIN.
pub const MIN_PIN_LENGTH: usize = 4;

/// Validates a PIN before it is stored.
///
/// # Errors
///
/// Returns [`AinotesError::InvalidPin`] for an empty or too-short PIN.
pub fn validate_new_pin(pin: &str) -> Result<()> {
    if pin.is_empty() {
        return Err(AinotesError::InvalidPin("Please enter a PIN".to_string()));
    }
    if pin.len() < MIN_PIN_LENGTH {
        return Err(AinotesError::InvalidPin(format!(
            "PIN must be at least {MIN_PIN_LENGTH} digits"
        )));
    }
    Ok(())
}

/// Byte-for-byte comparison of a candidate PIN against the stored one.
///
/// Always `false` when no PIN has been stored.
#[must_use]
pub fn pin_matches(stored: Option<&str>, candidate: &str) -> bool {
    matches!(stored, Some(stored) if stored.as_bytes() == candidate.as_bytes())
}
