//! Error taxonomy shared by every actor.
//!
//! Each actor has its own error enum; [`ErrorKind`] is the common classification callers
//! (an HTTP layer, the demo, tests) switch on.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or negative fields, merchant mismatch, quantity above stock. Never retried.
    Validation,
    /// Unknown order, item, payment or shipment.
    NotFound,
    /// A transition requested from an illegal predecessor state.
    StateConflict,
    /// A retryable external failure that outlived its retries.
    TransientExternal,
    /// A required write to the persistence gateway failed.
    Persistence,
    /// The actor could not be reached or dropped the request.
    Communication,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::StateConflict => "state_conflict",
            ErrorKind::TransientExternal => "transient_external",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Communication => "communication",
        };
        f.write_str(name)
    }
}

/// Validates a monetary amount or unit price.
pub(crate) fn check_amount(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{field} must be a non-negative number, got {value}"));
    }
    Ok(())
}

/// Validates a signed quantity and narrows it to stock units.
pub(crate) fn check_quantity(field: &str, value: i64) -> Result<u32, String> {
    if value < 0 {
        return Err(format!("{field} cannot be negative, got {value}"));
    }
    u32::try_from(value).map_err(|_| format!("{field} is too large: {value}"))
}
