//! Wire protocol for HBU1S-family diesel parking heaters.
//!
//! The heater exposes an undocumented write/notify protocol over BLE. This
//! crate owns the parts that need no I/O:
//!
//! - **Frames** ([`frame`]) — named constant templates for every outbound
//!   command plus the shared additive [`checksum`].
//! - **Status decoding** ([`status`]) — defensive parsing of notify frames
//!   with a swappable [`LayoutPolicy`], since firmware revisions disagree on
//!   byte offsets.
//! - **[`ProtocolCodec`]** — per-device binding of the two.
//! - **Transport seam** ([`Transport`], [`TransportResolver`]) — the traits a
//!   platform BLE backend implements.

pub mod codec;
pub mod error;
pub mod frame;
pub mod status;
pub mod transport;

pub use codec::ProtocolCodec;
pub use error::{FrameError, TransportError};
pub use frame::{
    Command, DEFAULT_TEMP, MAX_TEMP, MIN_TEMP, checksum, clamp_temperature, encode_init,
    encode_power, encode_status_query, encode_temperature,
};
pub use status::{FrameLayout, HeaterState, LayoutPolicy, StatusDelta, parse_status};
pub use transport::{Notifications, Transport, TransportResolver};
