use thiserror::Error;

/// Failures reported by a [`Transport`](crate::Transport) implementation.
///
/// Covers every stage of a write/notify link: establishing it, subscribing
/// to notifications, writing a frame, and tearing it down.
/// `heatlink-core` maps these into session-level errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    // ── Link lifecycle ──────────────────────────────────────────────
    /// The link could not be established.
    #[error("connect to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    /// Subscribing to the notify characteristic failed.
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    /// Teardown reported an error. The link is gone either way.
    #[error("disconnect failed: {0}")]
    Disconnect(String),

    // ── Data path ───────────────────────────────────────────────────
    /// A frame write was rejected or the link dropped mid-write.
    #[error("write failed: {0}")]
    Write(String),

    /// An operation needed a live link and there was none.
    #[error("transport is not connected")]
    NotConnected,
}

/// Reasons an inbound frame produced no status update.
///
/// These never leave the codec as failures: [`crate::ProtocolCodec::decode_status`]
/// logs them and returns `None`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame too short: {len} bytes (need at least {min})")]
    TooShort { len: usize, min: usize },

    #[error("not a status frame: marker 0x{marker:02x}")]
    NotStatus { marker: u8 },

    #[error("field at offset {offset} is missing")]
    MissingField { offset: usize },
}
