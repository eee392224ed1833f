//! Output helpers shared by command handlers.

use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Print `value` as JSON, or fall back to the plain renderer.
pub fn render<T: Serialize>(
    global: &GlobalOpts,
    value: &T,
    plain: impl FnOnce(&T) -> String,
) -> Result<(), CliError> {
    let text = match global.output {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Plain => plain(value),
    };
    println!("{text}");
    Ok(())
}

/// `-` for absent values.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}
