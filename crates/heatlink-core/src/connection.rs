// ── Connection manager ──
//
// Owns the transport handle and the live link for one heater. Every
// connect/disconnect/rebind runs under a single lifecycle lock, so
// concurrent callers collapse onto one underlying connect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use heatlink_proto::{Notifications, ProtocolCodec, Transport, TransportError};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::CoreError;
use crate::store::StatusStore;

// ── ConnectionState ──────────────────────────────────────────────

/// Link state as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    /// First connect of this session.
    Connecting,
    Connected,
    /// Connect after the link was up at least once.
    Reconnecting,
}

// ── ConnectionManager ────────────────────────────────────────────

/// Cheaply cloneable handle onto one heater's link.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    lifecycle: Mutex<Lifecycle>,
    /// Link frames are written to. Only replaced under the lifecycle lock.
    live: RwLock<Option<Arc<dyn Transport>>>,
    state: watch::Sender<ConnectionState>,
    ever_connected: AtomicBool,
    store: Arc<StatusStore>,
    codec: Arc<ProtocolCodec>,
    settle_delay: Duration,
}

struct Lifecycle {
    /// Handle used by the next connect. Rebinds replace it.
    handle: Arc<dyn Transport>,
    pump: Option<Pump>,
}

struct Pump {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ConnectionManager {
    pub fn new(
        handle: Arc<dyn Transport>,
        store: Arc<StatusStore>,
        codec: Arc<ProtocolCodec>,
        settle_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ConnectionInner {
                lifecycle: Mutex::new(Lifecycle { handle, pump: None }),
                live: RwLock::new(None),
                state,
                ever_connected: AtomicBool::new(false),
                store,
                codec,
                settle_delay,
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.state.borrow() == ConnectionState::Connected
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Bring the link up. Idempotent; concurrent callers share one attempt.
    ///
    /// Sequence: transport connect, subscribe to notifications, write the
    /// wake frame, then wait out the settle delay.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        if self.is_connected() {
            return Ok(());
        }

        // Leftovers of a link that died underneath us.
        if let Some(pump) = lifecycle.pump.take() {
            pump.stop().await;
        }
        if self.inner.live.write().await.take().is_some() {
            debug!("discarded stale link");
        }

        let transport = Arc::clone(&lifecycle.handle);
        let address = transport.address().to_owned();
        let phase = if self.inner.ever_connected.load(Ordering::Relaxed) {
            ConnectionState::Reconnecting
        } else {
            ConnectionState::Connecting
        };
        self.inner.set_state(phase);
        debug!(%address, ?phase, "connecting to heater");

        match self.open(&transport, &mut lifecycle).await {
            Ok(()) => {
                *self.inner.live.write().await = Some(transport);
                self.inner.ever_connected.store(true, Ordering::Relaxed);
                self.inner.set_state(ConnectionState::Connected);
                self.inner.store.set_connected(true);
                info!(%address, "connected to heater");
                Ok(())
            }
            Err(e) => {
                if let Some(pump) = lifecycle.pump.take() {
                    pump.stop().await;
                }
                if let Err(cleanup) = transport.disconnect().await {
                    debug!(%address, error = %cleanup, "cleanup after failed connect");
                }
                self.inner.set_state(ConnectionState::Disconnected);
                self.inner.store.set_connected(false);
                error!(%address, error = %e, "failed to connect to heater");
                Err(CoreError::ConnectionFailed {
                    address,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn open(
        &self,
        transport: &Arc<dyn Transport>,
        lifecycle: &mut Lifecycle,
    ) -> Result<(), TransportError> {
        transport.connect().await?;
        let notifications = transport.subscribe().await?;
        lifecycle.pump = Some(Pump::spawn(notifications, Arc::downgrade(&self.inner)));

        let wake = self.inner.codec.encode_init();
        debug!(frame = %hex::encode(&wake), "sending wake frame");
        transport.write(&wake).await?;
        tokio::time::sleep(self.inner.settle_delay).await;

        // The link may have dropped while settling; the pump has then already
        // exited without anyone noticing.
        let pump_alive = lifecycle
            .pump
            .as_ref()
            .is_some_and(|pump| !pump.task.is_finished());
        if !pump_alive || !transport.is_connected() {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }

    /// Tear the link down. A no-op when nothing is connected.
    pub async fn disconnect(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        if let Some(pump) = lifecycle.pump.take() {
            pump.stop().await;
        }

        let Some(link) = self.inner.live.write().await.take() else {
            debug!("disconnect requested with no live link");
            return;
        };
        if let Err(e) = link.disconnect().await {
            warn!(address = %link.address(), error = %e, "error while disconnecting");
        }
        self.inner.set_state(ConnectionState::Disconnected);
        self.inner.store.set_connected(false);
        info!(address = %link.address(), "disconnected from heater");
    }

    /// Swap in a fresh transport handle for the same device. The live link
    /// is left alone; the next connect uses the new handle.
    pub async fn rebind(&self, handle: Arc<dyn Transport>) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        debug!(address = %handle.address(), "transport handle rebound");
        lifecycle.handle = handle;
    }

    /// Address of the current transport handle.
    pub async fn address(&self) -> String {
        self.inner.lifecycle.lock().await.handle.address().to_owned()
    }

    /// Single write on the live link. On failure, a link that reports itself
    /// down marks the session disconnected so the next attempt reconnects.
    pub async fn write(&self, frame: &[u8]) -> Result<(), TransportError> {
        let link = self.inner.live.read().await.clone();
        let Some(link) = link else {
            return Err(TransportError::NotConnected);
        };
        debug!(frame = %hex::encode(frame), "writing frame");
        match link.write(frame).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if !link.is_connected() {
                    self.inner.link_lost();
                }
                Err(e)
            }
        }
    }
}

impl ConnectionInner {
    /// Stores the state even while nobody is watching.
    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn link_lost(&self) {
        let was_connected = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connected {
                *state = ConnectionState::Disconnected;
                true
            } else {
                false
            }
        });
        if was_connected {
            self.store.set_connected(false);
            warn!("heater link lost");
        }
    }
}

// ── Notification pump ────────────────────────────────────────────

impl Pump {
    fn spawn(notifications: Notifications, conn: Weak<ConnectionInner>) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(notification_pump(notifications, conn, cancel.clone()));
        Self { cancel, task }
    }

    async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Decodes inbound frames into the store until cancelled or the transport
/// closes the stream. A closed stream means the link dropped.
async fn notification_pump(
    mut notifications: Notifications,
    conn: Weak<ConnectionInner>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = notifications.recv() => {
                let Some(inner) = conn.upgrade() else { break };
                match frame {
                    Some(frame) => {
                        if let Some(delta) = inner.codec.decode_status(&frame) {
                            inner.store.merge(delta);
                        }
                    }
                    None => {
                        if !cancel.is_cancelled() {
                            inner.link_lost();
                        }
                        break;
                    }
                }
            }
        }
    }
    debug!("notification pump stopped");
}
