//! `heatlink encode`: print outbound frames as hex.

use heatlink_core::Command;
use heatlink_proto::ProtocolCodec;
use serde::Serialize;
use tracing::debug;

use crate::cli::{EncodeArgs, EncodeFrame, GlobalOpts, PowerState};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct EncodedFrame {
    command: &'static str,
    frame: String,
    len: usize,
}

fn to_command(frame: &EncodeFrame) -> Command {
    match frame {
        EncodeFrame::Init => Command::Init,
        EncodeFrame::StatusQuery => Command::StatusQuery,
        EncodeFrame::Power { state } => match state {
            PowerState::On => Command::PowerOn,
            PowerState::Off => Command::PowerOff,
        },
        EncodeFrame::Temp { celsius } => Command::SetTemperature(*celsius),
    }
}

pub fn handle(args: &EncodeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Only the keepalive frame can differ per device.
    let codec = if matches!(args.frame, EncodeFrame::StatusQuery) {
        config::selected_heater_config(global)?
            .map(|heater| heater.codec())
            .unwrap_or_default()
    } else {
        ProtocolCodec::default()
    };

    let command = to_command(&args.frame);
    let bytes = codec.encode(&command);
    debug!(command = command.name(), frame = %hex::encode(&bytes), "encoded");

    let encoded = EncodedFrame {
        command: command.name(),
        frame: hex::encode(&bytes),
        len: bytes.len(),
    };
    output::render(global, &encoded, |e| e.frame.clone())
}
