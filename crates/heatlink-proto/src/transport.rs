//! Transport seam.
//!
//! The heater speaks over a GATT link with one write characteristic and one
//! notify characteristic. Discovery and the radio stack live outside this
//! workspace; a platform integration implements [`Transport`] for its BLE
//! backend and [`TransportResolver`] for its scanner.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Primary GATT service of the heater.
pub const SERVICE_UUID: &str = "0000bd39-0000-1000-8000-00805f9b34fb";
/// Characteristic that accepts command frames (write without response).
pub const WRITE_CHAR_UUID: &str = "0000bdf7-0000-1000-8000-00805f9b34fb";
/// Characteristic that pushes status frames.
pub const NOTIFY_CHAR_UUID: &str = "0000bdf8-0000-1000-8000-00805f9b34fb";

/// Inbound frames from the notify characteristic.
///
/// The sender side is dropped when the link goes away, so a `None` from
/// `recv()` doubles as the link-loss signal.
pub type Notifications = mpsc::Receiver<Bytes>;

/// A write/notify link to one physical heater.
///
/// Implementations must be cheap to share (`Arc<dyn Transport>`) and must
/// tolerate `disconnect()` on a link that is already down.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Device address this handle points at (e.g. `AA:BB:CC:DD:EE:FF`).
    fn address(&self) -> &str;

    /// Whether the underlying link is currently up.
    fn is_connected(&self) -> bool;

    /// Establish the link.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Start notifications on [`NOTIFY_CHAR_UUID`].
    async fn subscribe(&self) -> Result<Notifications, TransportError>;

    /// Write one frame to [`WRITE_CHAR_UUID`] without response.
    async fn write(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Tear the link down.
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Address-to-handle lookup provided by the platform's scanner.
#[async_trait]
pub trait TransportResolver: Send + Sync {
    /// Resolve a connectable handle for `address`, if the device is in range.
    async fn resolve(&self, address: &str) -> Option<Arc<dyn Transport>>;
}
