// ── Outbound frame templates ──
//
// Every command the heater understands is a fixed 7-byte header followed by
// an operation payload. The payloads were captured from the vendor app and
// are kept verbatim; only the temperature frame carries a computed checksum.

use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Wire constants ───────────────────────────────────────────────────

/// Outer header shared by every outbound frame.
pub const PROTOCOL_HEADER: [u8; 7] = [0x00, 0x02, 0x00, 0x01, 0x00, 0x01, 0x00];

/// Wake frame sent right after subscribing. Includes the outer header.
pub const INIT_FRAME: [u8; 18] = [
    0x00, 0x02, 0x00, 0x01, 0x00, 0x01, 0x00, 0x0a, 0x0c, 0x00, 0x00, 0x05, 0x01, 0x00, 0x00,
    0x00, 0x00, 0x12,
];

/// Default refresh frame. The heater answers the wake frame with a full
/// status notification, so the refresh reuses it byte for byte.
pub const STATUS_QUERY_FRAME: [u8; 18] = INIT_FRAME;

/// Power-on payload (after the header). The trailing `0x0f` is a literal
/// captured from the vendor app, not derived from [`checksum`].
pub const POWER_ON_PAYLOAD: [u8; 15] = [
    0x0e, 0x04, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x0f,
];

/// Power-off payload (after the header). Trailing `0x0e` is a literal too.
pub const POWER_OFF_PAYLOAD: [u8; 15] = [
    0x0e, 0x04, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x0e,
];

/// Length byte that opens the set-temperature payload.
pub const TEMP_LENGTH_BYTE: u8 = 0x07;

/// First four inner bytes of the set-temperature payload.
pub const TEMP_INNER_PREFIX: [u8; 4] = [0x06, 0x00, 0x00, 0x02];

/// Lowest target temperature the heater accepts (°C).
pub const MIN_TEMP: u8 = 8;
/// Highest target temperature the heater accepts (°C).
pub const MAX_TEMP: u8 = 36;
/// Target temperature assumed before the heater reports one (°C).
pub const DEFAULT_TEMP: u8 = 16;

// ── Checksum ─────────────────────────────────────────────────────────

/// Additive checksum: sum of all bytes, modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Clamp a requested temperature into `[MIN_TEMP, MAX_TEMP]`.
///
/// Out-of-range requests are a validation concern, never an error.
pub fn clamp_temperature(requested: i32) -> u8 {
    let clamped = requested.clamp(i32::from(MIN_TEMP), i32::from(MAX_TEMP));
    if clamped != requested {
        debug!(requested, clamped, "target temperature clamped");
    }
    u8::try_from(clamped).unwrap_or(DEFAULT_TEMP)
}

// ── Encoders ─────────────────────────────────────────────────────────

fn with_header(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(PROTOCOL_HEADER.len() + payload.len());
    frame.extend_from_slice(&PROTOCOL_HEADER);
    frame.extend_from_slice(payload);
    frame
}

/// Full power frame. On and off differ only in the action byte and its
/// companion literal.
pub fn encode_power(on: bool) -> Vec<u8> {
    if on {
        with_header(&POWER_ON_PAYLOAD)
    } else {
        with_header(&POWER_OFF_PAYLOAD)
    }
}

/// Full set-temperature frame, clamping `temp` first.
///
/// Layout: header, `0x07`, `06 00 00 02 [temp] 00`, checksum of the six
/// inner bytes.
pub fn encode_temperature(temp: i32) -> Vec<u8> {
    let temp = clamp_temperature(temp);

    let mut inner = [0u8; 6];
    inner[..4].copy_from_slice(&TEMP_INNER_PREFIX);
    inner[4] = temp;
    inner[5] = 0x00;

    let mut payload = Vec::with_capacity(1 + inner.len() + 1);
    payload.push(TEMP_LENGTH_BYTE);
    payload.extend_from_slice(&inner);
    payload.push(checksum(&inner));

    with_header(&payload)
}

/// The wake frame.
pub fn encode_init() -> Vec<u8> {
    INIT_FRAME.to_vec()
}

/// The default keepalive/refresh frame.
pub fn encode_status_query() -> Vec<u8> {
    STATUS_QUERY_FRAME.to_vec()
}

// ── Command ──────────────────────────────────────────────────────────

/// One outbound operation. Constructed per call, encoded once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "temp")]
pub enum Command {
    Init,
    StatusQuery,
    PowerOn,
    PowerOff,
    /// Target temperature in °C; clamped when encoded.
    SetTemperature(i32),
}

impl Command {
    /// Encode with the built-in frame templates.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Init => encode_init(),
            Self::StatusQuery => encode_status_query(),
            Self::PowerOn => encode_power(true),
            Self::PowerOff => encode_power(false),
            Self::SetTemperature(temp) => encode_temperature(*temp),
        }
    }

    /// Short lowercase name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::StatusQuery => "status_query",
            Self::PowerOn => "power_on",
            Self::PowerOff => "power_off",
            Self::SetTemperature(_) => "set_temperature",
        }
    }
}
