//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use heatlink_config::ConfigError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFIG: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid frame hex: {reason}")]
    #[diagnostic(
        code(heatlink::invalid_hex),
        help("Pass the frame as hex bytes, e.g. 0001000100010023...")
    )]
    InvalidHex { reason: String },

    #[error("Frame is not a usable status frame: {reason}")]
    #[diagnostic(
        code(heatlink::not_status),
        help("Status frames are at least 25 bytes with 0x23 at offset 7.")
    )]
    NotStatus { reason: String },

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(heatlink::validation))]
    Validation { field: String, reason: String },

    // ── Profiles ─────────────────────────────────────────────────────
    #[error("Device '{name}' not found")]
    #[diagnostic(
        code(heatlink::device_not_found),
        help("Run: heatlink config list")
    )]
    DeviceNotFound { name: String },

    #[error("No device selected")]
    #[diagnostic(
        code(heatlink::no_device),
        help(
            "Pass --device, set HEATLINK_DEVICE, or run:\n\
             heatlink config use <name>"
        )
    )]
    NoDevice,

    #[error("Configuration error: {0}")]
    #[diagnostic(code(heatlink::config))]
    Config(ConfigError),

    // ── Output ───────────────────────────────────────────────────────
    #[error("Failed to render output: {0}")]
    #[diagnostic(code(heatlink::output))]
    Output(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownDevice { name } => Self::DeviceNotFound { name },
            ConfigError::NoDevice => Self::NoDevice,
            other => Self::Config(other),
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidHex { .. } | Self::NotStatus { .. } | Self::Validation { .. } => {
                exit_code::USAGE
            }
            Self::DeviceNotFound { .. } | Self::NoDevice => exit_code::NOT_FOUND,
            Self::Config(_) => exit_code::CONFIG,
            Self::Output(_) => exit_code::GENERAL,
        }
    }
}
