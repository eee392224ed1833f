//! Device profiles for heatlink tools.
//!
//! TOML profiles merged with `HEATLINK_`-prefixed environment variables,
//! and translation to `heatlink_core::HeaterConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use heatlink_core::{
    DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY, DEFAULT_SETTLE_DELAY,
    HeaterConfig, LayoutPolicy, RetryPolicy,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no device named '{name}' in config")]
    UnknownDevice { name: String },

    #[error("no device selected and no default_device configured")]
    NoDevice,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Device used when none is named on the command line.
    pub default_device: Option<String>,

    /// Timing shared by every device unless overridden.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named heaters.
    #[serde(default)]
    pub devices: BTreeMap<String, Device>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    u64::try_from(DEFAULT_SETTLE_DELAY.as_millis()).unwrap_or(500)
}
fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_COUNT
}
fn default_retry_delay_ms() -> u64 {
    u64::try_from(DEFAULT_RETRY_DELAY.as_millis()).unwrap_or(1_000)
}
fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

/// A named heater.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Device {
    /// BLE address: `AA:BB:CC:DD:EE:FF`, or a platform UUID.
    pub address: String,

    /// Friendly name for logs.
    pub name: Option<String>,

    /// Firmware layout: "auto", "live-target" or "stored-target".
    #[serde(default = "default_layout")]
    pub layout: String,

    /// Replacement keepalive frame as a hex string.
    pub status_query: Option<String>,

    pub settle_delay_ms: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub poll_interval_secs: Option<u64>,
}

fn default_layout() -> String {
    "auto".into()
}

impl Device {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            layout: default_layout(),
            status_query: None,
            settle_delay_ms: None,
            retry_attempts: None,
            retry_delay_ms: None,
            poll_interval_secs: None,
        }
    }
}

impl Config {
    /// Pick a device by name, falling back to `default_device`.
    pub fn device(&self, name: Option<&str>) -> Result<(String, &Device), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_device.clone())
            .ok_or(ConfigError::NoDevice)?;
        let device = self
            .devices
            .get(&name)
            .ok_or_else(|| ConfigError::UnknownDevice { name: name.clone() })?;
        Ok((name, device))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "heatlink", "heatlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("heatlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HEATLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Accepts colon-separated MACs and 36-character platform UUIDs.
pub fn validate_address(address: &str) -> Result<(), ConfigError> {
    let is_mac = {
        let parts: Vec<&str> = address.split(':').collect();
        parts.len() == 6
            && parts
                .iter()
                .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
    };
    let is_uuid = address.len() == 36
        && address
            .chars()
            .enumerate()
            .all(|(i, c)| match i {
                8 | 13 | 18 | 23 => c == '-',
                _ => c.is_ascii_hexdigit(),
            });

    if is_mac || is_uuid {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            field: "address".into(),
            reason: format!("expected AA:BB:CC:DD:EE:FF or a UUID, got '{address}'"),
        })
    }
}

pub fn parse_layout(layout: &str) -> Result<LayoutPolicy, ConfigError> {
    layout
        .parse::<LayoutPolicy>()
        .map_err(|reason| ConfigError::Validation {
            field: "layout".into(),
            reason,
        })
}

/// Decode a hex frame, tolerating a `0x` prefix and spaces or colons
/// between bytes.
pub fn parse_frame_hex(raw: &str) -> Result<Vec<u8>, ConfigError> {
    let trimmed = raw.trim();
    let unprefixed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let compact: String = unprefixed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let bytes = hex::decode(&compact).map_err(|e| ConfigError::Validation {
        field: "status_query".into(),
        reason: e.to_string(),
    })?;
    if bytes.is_empty() {
        return Err(ConfigError::Validation {
            field: "status_query".into(),
            reason: "frame is empty".into(),
        });
    }
    Ok(bytes)
}

/// Build a `HeaterConfig` from a device profile. Per-device timing wins
/// over `[defaults]`.
pub fn device_to_heater_config(
    device: &Device,
    device_name: &str,
    defaults: &Defaults,
) -> Result<HeaterConfig, ConfigError> {
    validate_address(&device.address)?;
    let layout = parse_layout(&device.layout)?;
    let status_query = device
        .status_query
        .as_deref()
        .map(parse_frame_hex)
        .transpose()?;

    let mut config = HeaterConfig::new(device.address.clone());
    config.name = Some(device.name.clone().unwrap_or_else(|| device_name.to_owned()));
    config.layout = layout;
    config.status_query = status_query;
    config.settle_delay = Duration::from_millis(
        device.settle_delay_ms.unwrap_or(defaults.settle_delay_ms),
    );
    config.retry = RetryPolicy {
        attempts: device.retry_attempts.unwrap_or(defaults.retry_attempts),
        delay: Duration::from_millis(device.retry_delay_ms.unwrap_or(defaults.retry_delay_ms)),
    };
    config.poll_interval = Duration::from_secs(
        device
            .poll_interval_secs
            .unwrap_or(defaults.poll_interval_secs),
    );
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use heatlink_proto::FrameLayout;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn addresses() {
        validate_address("AA:BB:CC:DD:EE:FF").unwrap();
        validate_address("aa:bb:cc:dd:ee:0f").unwrap();
        validate_address("6E400001-B5A3-F393-E0A9-E50E24DCCA9E").unwrap();
        assert!(validate_address("AA:BB:CC:DD:EE").is_err());
        assert!(validate_address("heater").is_err());
        assert!(validate_address("").is_err());
    }

    #[test]
    fn frame_hex_tolerates_separators() {
        assert_eq!(parse_frame_hex("00 02:0a").unwrap(), vec![0x00, 0x02, 0x0a]);
        assert!(parse_frame_hex("0g").is_err());
        assert!(parse_frame_hex("abc").is_err());
        assert!(parse_frame_hex("  ").is_err());
        assert_eq!(parse_frame_hex("0x0023").unwrap(), vec![0x00, 0x23]);
        assert_eq!(parse_frame_hex(" 0XAA bb").unwrap(), vec![0xaa, 0xbb]);
    }

    #[test]
    fn device_overrides_defaults() {
        let mut device = Device::new("AA:BB:CC:DD:EE:FF");
        device.layout = "stored-target".into();
        device.retry_attempts = Some(5);
        let config = device_to_heater_config(&device, "garage", &Defaults::default()).unwrap();

        assert_eq!(config.name.as_deref(), Some("garage"));
        assert_eq!(config.layout, LayoutPolicy::Fixed(FrameLayout::StoredTarget));
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.delay, DEFAULT_RETRY_DELAY);
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn bad_layout_is_validation_error() {
        let mut device = Device::new("AA:BB:CC:DD:EE:FF");
        device.layout = "sideways".into();
        let err = device_to_heater_config(&device, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "layout"));
    }

    #[test]
    fn device_selection() {
        let mut config = Config::default();
        assert!(matches!(config.device(None), Err(ConfigError::NoDevice)));

        config
            .devices
            .insert("van".into(), Device::new("AA:BB:CC:DD:EE:FF"));
        config.default_device = Some("van".into());
        assert_eq!(config.device(None).unwrap().0, "van");
        assert!(matches!(
            config.device(Some("boat")),
            Err(ConfigError::UnknownDevice { .. })
        ));
    }
}
