#![allow(clippy::unwrap_used)]
// File-level config behaviour: loading, validation and save round-trips.

use std::time::Duration;

use heatlink_config::{
    Config, ConfigError, Device, device_to_heater_config, load_config_from, save_config_to,
};
use heatlink_core::LayoutPolicy;
use heatlink_proto::FrameLayout;
use pretty_assertions::assert_eq;

const SAMPLE: &str = r#"
default_device = "van"

[defaults]
retry_delay_ms = 250
poll_interval_secs = 60

[devices.van]
address = "AA:BB:CC:DD:EE:01"
name = "Van heater"
layout = "live-target"
status_query = "00 02 00 01 00 01 00 0a 0c 00 00 05 01 00 00 00 00 12"
retry_attempts = 4

[devices.cabin]
address = "AA:BB:CC:DD:EE:02"
"#;

fn write_sample(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn profile_translates_to_heater_config() {
    let (_dir, path) = write_sample(SAMPLE);
    let config = load_config_from(&path).unwrap();

    let (name, device) = config.device(None).unwrap();
    let heater = device_to_heater_config(device, &name, &config.defaults).unwrap();

    assert_eq!(heater.address, "AA:BB:CC:DD:EE:01");
    assert_eq!(heater.name.as_deref(), Some("Van heater"));
    assert_eq!(heater.layout, LayoutPolicy::Fixed(FrameLayout::LiveTarget));
    assert_eq!(heater.status_query.as_ref().unwrap().len(), 18);
    assert_eq!(heater.retry.attempts, 4);
    assert_eq!(heater.retry.delay, Duration::from_millis(250));
    assert_eq!(heater.poll_interval, Duration::from_secs(60));
    assert_eq!(heater.settle_delay, Duration::from_millis(500));
}

#[test]
fn unspecified_fields_fall_back_to_defaults() {
    let (_dir, path) = write_sample(SAMPLE);
    let config = load_config_from(&path).unwrap();

    let (name, device) = config.device(Some("cabin")).unwrap();
    let heater = device_to_heater_config(device, &name, &config.defaults).unwrap();

    assert_eq!(heater.name.as_deref(), Some("cabin"));
    assert_eq!(heater.layout, LayoutPolicy::Auto);
    assert_eq!(heater.status_query, None);
    assert_eq!(heater.retry.attempts, 3);
}

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert!(config.devices.is_empty());
    assert_eq!(config.defaults.retry_attempts, 3);
    assert_eq!(config.defaults.settle_delay_ms, 500);
}

#[test]
fn bad_hex_is_rejected() {
    let (_dir, path) = write_sample(
        r#"
[devices.bad]
address = "AA:BB:CC:DD:EE:03"
status_query = "zz"
"#,
    );
    let config = load_config_from(&path).unwrap();
    let (name, device) = config.device(Some("bad")).unwrap();
    let err = device_to_heater_config(device, &name, &config.defaults).unwrap_err();

    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "status_query"));
}

#[test]
fn malformed_toml_is_a_load_error() {
    let (_dir, path) = write_sample("[devices.broken\naddress = 1");
    assert!(matches!(
        load_config_from(&path),
        Err(ConfigError::Figment(_))
    ));
}

#[test]
fn save_then_load_keeps_devices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut device = Device::new("AA:BB:CC:DD:EE:04");
    device.layout = "stored-target".into();
    let mut config = Config::default();
    config.default_device = Some("shed".into());
    config.devices.insert("shed".into(), device);
    save_config_to(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let (name, device) = loaded.device(None).unwrap();
    assert_eq!(name, "shed");
    assert_eq!(device.address, "AA:BB:CC:DD:EE:04");
    assert_eq!(device.layout, "stored-target");
}
