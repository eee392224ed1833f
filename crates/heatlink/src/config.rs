//! CLI-side config helpers: `--config` and `--device` overrides on top of
//! `heatlink-config`.

use std::path::PathBuf;

use heatlink_config::{Config, Device};
use heatlink_core::HeaterConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(heatlink_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(heatlink_config::load_config_from(&config_file(global))?)
}

pub fn save(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    Ok(heatlink_config::save_config_to(cfg, &config_file(global))?)
}

/// Pick a device: explicit name, then `--device`, then `default_device`.
pub fn select_device<'a>(
    cfg: &'a Config,
    global: &GlobalOpts,
    name: Option<&str>,
) -> Result<(String, &'a Device), CliError> {
    let name = name.or(global.device.as_deref());
    Ok(cfg.device(name)?)
}

/// Session settings for the selected device, if one is selected at all.
pub fn selected_heater_config(global: &GlobalOpts) -> Result<Option<HeaterConfig>, CliError> {
    let cfg = load(global)?;
    if global.device.is_none() && cfg.default_device.is_none() {
        return Ok(None);
    }
    let (name, device) = select_device(&cfg, global, None)?;
    let heater = heatlink_config::device_to_heater_config(device, &name, &cfg.defaults)?;
    Ok(Some(heater))
}
