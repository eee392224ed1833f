// ── Core error types ──
//
// Session-level errors from heatlink-core. Callers never see raw transport
// failures: connect folds them into `ConnectionFailed`, the retry loop into
// `RetriesExhausted`. Decode failures never surface at all.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to heater at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Heater not connected")]
    NotConnected,

    #[error("Heater not found: {address}")]
    DeviceNotFound { address: String },

    // ── Dispatch errors ──────────────────────────────────────────────
    #[error("Command {command} failed after {attempts} attempt(s): {reason}")]
    RetriesExhausted {
        command: &'static str,
        attempts: u32,
        reason: String,
    },
}
