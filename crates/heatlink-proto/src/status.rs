// ── Inbound status frames ──
//
// The notify characteristic pushes status frames whose layout was
// reverse-engineered from captures. Firmware revisions disagree on where
// the target temperature lives, so decoding goes through a `FrameLayout`
// chosen per frame by `LayoutPolicy`.
//
// Observed frame (43 bytes on the reference unit):
//
//   0..7    header            00 01 00 01 00 01 00
//   7       message type      0x23 = status
//   11      stored target     (stored-target firmware only)
//   20      running indicator 0x00 off, 0x42 transitional, 0x8x running
//   22      live target       valid only while running
//   23      layout signature  0x02 on live-target firmware
//   24..26  body temperature  u16 little-endian
//   26      ambient temperature

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::frame::{MAX_TEMP, MIN_TEMP};

/// Frames shorter than this never carry a full status block.
pub const MIN_STATUS_FRAME_LEN: usize = 25;
/// Offset of the message-type marker.
pub const MESSAGE_TYPE_OFFSET: usize = 7;
/// Marker value identifying a status message.
pub const STATUS_MESSAGE_TYPE: u8 = 0x23;

const RUNNING_INDICATOR_OFFSET: usize = 20;
const LIVE_TARGET_OFFSET: usize = 22;
const LAYOUT_SIGNATURE_OFFSET: usize = 23;
const LIVE_TARGET_SIGNATURE: u8 = 0x02;
const STORED_TARGET_OFFSET: usize = 11;
const BODY_TEMP_OFFSET: usize = 24;
const AMBIENT_TEMP_OFFSET: usize = 26;

/// Exclusive upper bound for a plausible body temperature (°C).
pub const BODY_TEMP_LIMIT: u16 = 500;
/// Exclusive upper bound for a plausible ambient temperature (°C).
pub const AMBIENT_TEMP_LIMIT: u8 = 60;

// ── HeaterState ──────────────────────────────────────────────────────

/// Operating state of the heater.
///
/// Raw state codes:
///
/// | raw  | variant        |
/// |------|----------------|
/// | 0x00 | `Off`          |
/// | 0x01 | `Starting`     |
/// | 0x02 | `Preheating`   |
/// | 0x03 | `Running`      |
/// | 0x04 | `ShuttingDown` |
/// | else | `Unknown(raw)` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaterState {
    #[default]
    Off,
    Starting,
    Preheating,
    Running,
    ShuttingDown,
    Unknown(u8),
}

impl HeaterState {
    /// Map a raw state code using the table above.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Off,
            0x01 => Self::Starting,
            0x02 => Self::Preheating,
            0x03 => Self::Running,
            0x04 => Self::ShuttingDown,
            other => Self::Unknown(other),
        }
    }

    /// Map the running-indicator byte of a status frame.
    ///
    /// | raw              | variant        |
    /// |------------------|----------------|
    /// | 0x00             | `Off`          |
    /// | 0x42             | `Starting`     |
    /// | 0x80, 0x81, 0x83 | `Running`      |
    /// | other            | `Unknown(raw)` |
    ///
    /// Unrecognized non-zero values still count as on.
    pub fn from_running_indicator(raw: u8) -> Self {
        match raw {
            0x00 => Self::Off,
            0x42 => Self::Starting,
            0x80 | 0x81 | 0x83 => Self::Running,
            other => Self::Unknown(other),
        }
    }

    /// True unless the heater is off or winding down.
    pub fn is_on(&self) -> bool {
        !matches!(self, Self::Off | Self::ShuttingDown)
    }
}

impl fmt::Display for HeaterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Starting => f.write_str("starting"),
            Self::Preheating => f.write_str("preheating"),
            Self::Running => f.write_str("running"),
            Self::ShuttingDown => f.write_str("shutting_down"),
            Self::Unknown(raw) => write!(f, "unknown_{raw:02x}"),
        }
    }
}

// ── StatusDelta ──────────────────────────────────────────────────────

/// The fields one status frame validated. `None` means "leave as is".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDelta {
    pub state: Option<HeaterState>,
    pub target_temp: Option<u8>,
    pub body_temp: Option<u16>,
    pub ambient_temp: Option<u8>,
}

impl StatusDelta {
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.target_temp.is_none()
            && self.body_temp.is_none()
            && self.ambient_temp.is_none()
    }
}

// ── Layouts ──────────────────────────────────────────────────────────

/// Where a given firmware puts the target temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameLayout {
    /// Target at offset 22, only meaningful while the heater runs.
    LiveTarget,
    /// Target at offset 11, reported in every state.
    StoredTarget,
}

impl FrameLayout {
    fn target_offset(self) -> usize {
        match self {
            Self::LiveTarget => LIVE_TARGET_OFFSET,
            Self::StoredTarget => STORED_TARGET_OFFSET,
        }
    }

    fn target_requires_running(self) -> bool {
        matches!(self, Self::LiveTarget)
    }

    /// Guess the layout from the signature byte.
    pub fn detect(frame: &[u8]) -> Self {
        match frame.get(LAYOUT_SIGNATURE_OFFSET) {
            Some(&LIVE_TARGET_SIGNATURE) => Self::LiveTarget,
            _ => Self::StoredTarget,
        }
    }
}

/// How the decoder picks a [`FrameLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPolicy {
    /// Detect per frame from the signature byte.
    #[default]
    Auto,
    /// Always use the given layout.
    Fixed(FrameLayout),
}

impl LayoutPolicy {
    pub fn resolve(self, frame: &[u8]) -> FrameLayout {
        match self {
            Self::Auto => FrameLayout::detect(frame),
            Self::Fixed(layout) => layout,
        }
    }
}

impl fmt::Display for LayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(FrameLayout::LiveTarget) => f.write_str("live-target"),
            Self::Fixed(FrameLayout::StoredTarget) => f.write_str("stored-target"),
        }
    }
}

impl std::str::FromStr for LayoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "live-target" | "live" => Ok(Self::Fixed(FrameLayout::LiveTarget)),
            "stored-target" | "stored" => Ok(Self::Fixed(FrameLayout::StoredTarget)),
            other => Err(format!(
                "expected 'auto', 'live-target' or 'stored-target', got '{other}'"
            )),
        }
    }
}

// ── Parsing ──────────────────────────────────────────────────────────

fn byte_at(frame: &[u8], offset: usize) -> Result<u8, FrameError> {
    frame
        .get(offset)
        .copied()
        .ok_or(FrameError::MissingField { offset })
}

fn valid_target(raw: u8) -> Option<u8> {
    (MIN_TEMP..=MAX_TEMP).contains(&raw).then_some(raw)
}

fn body_temp(frame: &[u8]) -> Option<u16> {
    let bytes = frame.get(BODY_TEMP_OFFSET..BODY_TEMP_OFFSET + 2)?;
    let value = u16::from_le_bytes([bytes[0], bytes[1]]);
    (value > 0 && value < BODY_TEMP_LIMIT).then_some(value)
}

fn ambient_temp(frame: &[u8]) -> Option<u8> {
    let value = *frame.get(AMBIENT_TEMP_OFFSET)?;
    (value > 0 && value < AMBIENT_TEMP_LIMIT).then_some(value)
}

/// Parse a status frame under `policy`.
///
/// Length and marker failures are errors; individual fields that are
/// absent or implausible simply stay `None` in the delta.
pub fn parse_status(frame: &[u8], policy: LayoutPolicy) -> Result<StatusDelta, FrameError> {
    if frame.len() < MIN_STATUS_FRAME_LEN {
        return Err(FrameError::TooShort {
            len: frame.len(),
            min: MIN_STATUS_FRAME_LEN,
        });
    }

    let marker = byte_at(frame, MESSAGE_TYPE_OFFSET)?;
    if marker != STATUS_MESSAGE_TYPE {
        return Err(FrameError::NotStatus { marker });
    }

    let layout = policy.resolve(frame);
    let state = HeaterState::from_running_indicator(byte_at(frame, RUNNING_INDICATOR_OFFSET)?);

    // Live-target firmware leaves stale data at 22 while off; keep the
    // last known target instead.
    let target_temp = if layout.target_requires_running() && !state.is_on() {
        None
    } else {
        frame.get(layout.target_offset()).copied().and_then(valid_target)
    };

    Ok(StatusDelta {
        state: Some(state),
        target_temp,
        body_temp: body_temp(frame),
        ambient_temp: ambient_temp(frame),
    })
}
