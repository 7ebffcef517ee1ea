//! Request-layer commands.
//!
//! Each command validates and coerces caller input, acquires one validated
//! connection from `CoreState` and runs exactly one record operation. Errors
//! are flattened to strings for display, as adapters only show them.

pub mod correlation;
pub mod demo;
pub mod medications;
pub mod patients;
pub mod symptoms;
pub mod vitals;

use std::str::FromStr;

use crate::core_state::CoreState;

/// Verifies a connection can be acquired; returns its generation number.
pub fn health_check(state: &CoreState) -> Result<u64, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    tracing::debug!(generation = conn.generation(), "Health check passed");
    Ok(conn.generation())
}

/// Parse an optional form field: blank means absent.
pub(crate) fn parse_optional<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid {field}: {value}")),
    }
}
