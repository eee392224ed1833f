// ── Runtime session configuration ──
//
// Describes *how* to drive one heater: firmware layout, refresh frame, and
// timing. Never touches disk; `heatlink-config` builds one of these from a
// profile and hands it in.

use std::time::Duration;

use heatlink_proto::{LayoutPolicy, ProtocolCodec};

/// Grace period after the wake frame before the heater answers reliably.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Attempts per command before giving up.
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Pause between failed write attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Keepalive/refresh cadence of the background poller.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Bounded retry with fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_COUNT,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Configuration for a single heater session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaterConfig {
    /// Device address the session is bound to.
    pub address: String,
    /// Friendly name, used only in logs.
    pub name: Option<String>,
    /// Status-frame layout selection.
    pub layout: LayoutPolicy,
    /// Replacement keepalive frame, if the firmware needs a different one.
    pub status_query: Option<Vec<u8>>,
    pub settle_delay: Duration,
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
}

impl HeaterConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            layout: LayoutPolicy::default(),
            status_query: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            retry: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build the codec this configuration describes.
    pub fn codec(&self) -> ProtocolCodec {
        let codec = ProtocolCodec::new(self.layout);
        match &self.status_query {
            Some(frame) => codec.with_status_query(frame.clone()),
            None => codec,
        }
    }

    /// Name for log lines: the friendly name, else the address.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}
