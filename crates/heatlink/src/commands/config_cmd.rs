//! Config subcommand handlers.

use heatlink_config::{ConfigError, Device, device_to_heater_config};
use serde::Serialize;
use tracing::info;

use crate::cli::{AddDeviceArgs, ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DeviceRow {
    name: String,
    address: String,
    layout: String,
    default: bool,
}

#[derive(Serialize)]
struct ResolvedDevice {
    name: String,
    address: String,
    layout: String,
    status_query: Option<String>,
    settle_delay_ms: u128,
    retry_attempts: u32,
    retry_delay_ms: u128,
    poll_interval_secs: u64,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_file(global).display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let text = toml::to_string_pretty(&cfg).map_err(ConfigError::from)?;
            print!("{text}");
            Ok(())
        }

        ConfigCommand::List => {
            let cfg = config::load(global)?;
            let rows: Vec<DeviceRow> = cfg
                .devices
                .iter()
                .map(|(name, device)| DeviceRow {
                    name: name.clone(),
                    address: device.address.clone(),
                    layout: device.layout.clone(),
                    default: cfg.default_device.as_deref() == Some(name.as_str()),
                })
                .collect();
            output::render(global, &rows, |rows| {
                if rows.is_empty() {
                    return "no devices configured".into();
                }
                rows.iter()
                    .map(|r| {
                        let marker = if r.default { "*" } else { " " };
                        format!("{marker} {:<16} {:<36} {}", r.name, r.address, r.layout)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }

        ConfigCommand::Add(add) => add_device(add, global),

        ConfigCommand::Remove { name } => {
            let mut cfg = config::load(global)?;
            if cfg.devices.remove(&name).is_none() {
                return Err(CliError::DeviceNotFound { name });
            }
            if cfg.default_device.as_deref() == Some(name.as_str()) {
                cfg.default_device = None;
            }
            config::save(&cfg, global)?;
            info!(device = %name, "device removed");
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            if !cfg.devices.contains_key(&name) {
                return Err(CliError::DeviceNotFound { name });
            }
            cfg.default_device = Some(name);
            config::save(&cfg, global)
        }

        ConfigCommand::Check { name } => {
            let cfg = config::load(global)?;
            let (name, device) = config::select_device(&cfg, global, name.as_deref())?;
            let heater = device_to_heater_config(device, &name, &cfg.defaults)?;
            let resolved = ResolvedDevice {
                name,
                address: heater.address.clone(),
                layout: heater.layout.to_string(),
                status_query: heater.status_query.as_deref().map(hex::encode),
                settle_delay_ms: heater.settle_delay.as_millis(),
                retry_attempts: heater.retry.attempts,
                retry_delay_ms: heater.retry.delay.as_millis(),
                poll_interval_secs: heater.poll_interval.as_secs(),
            };
            output::render(global, &resolved, |r| {
                format!(
                    "device:        {}\n\
                     address:       {}\n\
                     layout:        {}\n\
                     status query:  {}\n\
                     settle delay:  {} ms\n\
                     retries:       {} x {} ms\n\
                     poll interval: {} s",
                    r.name,
                    r.address,
                    r.layout,
                    output::or_dash(r.status_query.as_deref()),
                    r.settle_delay_ms,
                    r.retry_attempts,
                    r.retry_delay_ms,
                    r.poll_interval_secs,
                )
            })
        }
    }
}

fn add_device(add: AddDeviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global)?;

    let mut device = Device::new(add.address);
    device.name = add.label;
    device.layout = add.layout;
    device.status_query = add.status_query;
    // Reject before writing anything.
    device_to_heater_config(&device, &add.name, &cfg.defaults)?;

    if add.default || cfg.default_device.is_none() {
        cfg.default_device = Some(add.name.clone());
    }
    cfg.devices.insert(add.name.clone(), device);
    config::save(&cfg, global)?;
    info!(device = %add.name, "device saved");
    Ok(())
}
