//! `heatlink decode`: parse a captured status frame.

use heatlink_config::ConfigError;
use heatlink_core::{HeaterState, LayoutPolicy};
use heatlink_proto::{FrameLayout, parse_status};
use serde::Serialize;

use crate::cli::{DecodeArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output::{self, or_dash};

#[derive(Serialize)]
struct DecodedStatus {
    layout: FrameLayout,
    state: HeaterState,
    is_on: bool,
    target_temp: Option<u8>,
    body_temp: Option<u16>,
    ambient_temp: Option<u8>,
}

/// Bad hex is a usage error of this command, not a config problem.
fn parse_hex(raw: &str) -> Result<Vec<u8>, CliError> {
    heatlink_config::parse_frame_hex(raw).map_err(|e| match e {
        ConfigError::Validation { reason, .. } => CliError::InvalidHex { reason },
        other => other.into(),
    })
}

fn layout_for(args: &DecodeArgs, global: &GlobalOpts) -> Result<LayoutPolicy, CliError> {
    if let Some(raw) = &args.layout {
        return Ok(heatlink_config::parse_layout(raw)?);
    }
    Ok(config::selected_heater_config(global)?.map_or(LayoutPolicy::Auto, |h| h.layout))
}

pub fn handle(args: &DecodeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let frame = parse_hex(&args.frame)?;
    let policy = layout_for(args, global)?;
    let delta = parse_status(&frame, policy).map_err(|e| CliError::NotStatus {
        reason: e.to_string(),
    })?;
    let state = delta.state.unwrap_or_default();

    let decoded = DecodedStatus {
        layout: policy.resolve(&frame),
        state,
        is_on: state.is_on(),
        target_temp: delta.target_temp,
        body_temp: delta.body_temp,
        ambient_temp: delta.ambient_temp,
    };

    output::render(global, &decoded, |d| {
        let layout = match d.layout {
            FrameLayout::LiveTarget => "live-target",
            FrameLayout::StoredTarget => "stored-target",
        };
        format!(
            "layout:  {layout}\n\
             state:   {}\n\
             target:  {}\n\
             body:    {}\n\
             ambient: {}",
            d.state,
            or_dash(d.target_temp),
            or_dash(d.body_temp),
            or_dash(d.ambient_temp),
        )
    })
}
