// ── Heater session facade ──
//
// Full lifecycle for one heater: connection, dispatch, status, polling and
// handle rebinding. Cheaply cloneable via `Arc<HeaterInner>`.

use std::sync::Arc;

use heatlink_proto::{Command, Transport, TransportResolver};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::HeaterConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::dispatcher::CommandDispatcher;
use crate::error::CoreError;
use crate::model::HeaterStatus;
use crate::poller::{Poller, PollerHandle};
use crate::store::{ObserverId, StatusStore, StatusStream};

/// The main entry point for consumers.
///
/// ```no_run
/// # async fn demo(resolver: &dyn heatlink_proto::TransportResolver) -> Result<(), heatlink_core::CoreError> {
/// use heatlink_core::{Heater, HeaterConfig};
///
/// let address = "AA:BB:CC:DD:EE:FF";
/// let heater = Heater::open(resolver, address, HeaterConfig::new(address)).await?;
/// heater.start_polling().await;
/// heater.set_temperature(21).await?;
/// heater.turn_on().await?;
/// println!("{:?}", heater.status());
/// heater.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Heater {
    inner: Arc<HeaterInner>,
}

struct HeaterInner {
    config: HeaterConfig,
    store: Arc<StatusStore>,
    connection: ConnectionManager,
    dispatcher: Arc<CommandDispatcher>,
    poller: Mutex<Option<PollerHandle>>,
    /// Parent of every background task this session spawns.
    cancel: CancellationToken,
}

impl Heater {
    /// Build a session around a transport handle. Does not connect.
    pub fn new(handle: Arc<dyn Transport>, config: HeaterConfig) -> Self {
        let store = Arc::new(StatusStore::new());
        let codec = Arc::new(config.codec());
        let connection = ConnectionManager::new(
            handle,
            Arc::clone(&store),
            Arc::clone(&codec),
            config.settle_delay,
        );
        let dispatcher = Arc::new(CommandDispatcher::new(
            connection.clone(),
            Arc::clone(&store),
            codec,
            config.retry,
        ));

        Self {
            inner: Arc::new(HeaterInner {
                config,
                store,
                connection,
                dispatcher,
                poller: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Resolve `address` to a transport handle, build the session and try an
    /// initial connect.
    pub async fn open(
        resolver: &dyn TransportResolver,
        address: &str,
        mut config: HeaterConfig,
    ) -> Result<Self, CoreError> {
        let handle = resolver
            .resolve(address)
            .await
            .ok_or_else(|| CoreError::DeviceNotFound {
                address: address.to_owned(),
            })?;
        address.clone_into(&mut config.address);

        let heater = Self::new(handle, config);
        heater.connect().await?;
        Ok(heater)
    }

    pub fn config(&self) -> &HeaterConfig {
        &self.inner.config
    }

    // ── Status ───────────────────────────────────────────────────────

    pub fn status(&self) -> HeaterStatus {
        self.inner.store.snapshot()
    }

    pub fn watch(&self) -> StatusStream {
        self.inner.store.watch()
    }

    /// Register a change observer. It runs synchronously after every merge
    /// and every connection flip, so keep it short.
    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&HeaterStatus) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.inner.store.unsubscribe(id)
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.state()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn turn_on(&self) -> Result<(), CoreError> {
        info!(heater = %self.inner.config.label(), "turning heater on");
        self.inner.dispatcher.send(Command::PowerOn).await
    }

    pub async fn turn_off(&self) -> Result<(), CoreError> {
        info!(heater = %self.inner.config.label(), "turning heater off");
        self.inner.dispatcher.send(Command::PowerOff).await
    }

    /// Out-of-range values are clamped to 8..=36, not rejected.
    pub async fn set_temperature(&self, temp: i32) -> Result<(), CoreError> {
        info!(heater = %self.inner.config.label(), temp, "setting target temperature");
        self.inner.dispatcher.send(Command::SetTemperature(temp)).await
    }

    /// Ask for a fresh status frame. Never connects on its own.
    pub async fn request_status(&self) -> Result<(), CoreError> {
        if !self.inner.connection.is_connected() {
            return Err(CoreError::NotConnected);
        }
        self.inner.dispatcher.send(Command::StatusQuery).await
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.connection.connect().await
    }

    pub async fn disconnect(&self) {
        self.inner.connection.disconnect().await;
    }

    pub async fn rebind(&self, handle: Arc<dyn Transport>) {
        self.inner.connection.rebind(handle).await;
    }

    /// Consume a source of replacement handles. Handles for other devices
    /// are ignored. Ends when the source closes or the session shuts down.
    pub fn follow_rebinds(&self, mut source: mpsc::Receiver<Arc<dyn Transport>>) -> JoinHandle<()> {
        let heater = self.clone();
        let cancel = self.inner.cancel.child_token();
        tokio::spawn(async move {
            loop {
                let handle = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    handle = source.recv() => handle,
                };
                let Some(handle) = handle else { break };
                if handle
                    .address()
                    .eq_ignore_ascii_case(&heater.inner.config.address)
                {
                    heater.rebind(handle).await;
                } else {
                    debug!(address = %handle.address(), "ignoring handle for another device");
                }
            }
            debug!("rebind follower stopped");
        })
    }

    pub async fn start_polling(&self) {
        let mut slot = self.inner.poller.lock().await;
        if slot.as_ref().is_some_and(|p| !p.is_finished()) {
            return;
        }
        let poller = Poller::new(
            self.inner.connection.clone(),
            Arc::clone(&self.inner.dispatcher),
            self.inner.config.poll_interval,
        );
        *slot = Some(poller.spawn(self.inner.cancel.child_token()));
    }

    pub async fn stop_polling(&self) {
        let handle = self.inner.poller.lock().await.take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    /// Stop every background task, then disconnect.
    pub async fn shutdown(&self) {
        self.stop_polling().await;
        self.inner.cancel.cancel();
        self.disconnect().await;
        info!(heater = %self.inner.config.label(), "session shut down");
    }
}
