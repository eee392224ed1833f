// ── Background poller ──
//
// Periodic keepalive: refreshes status while the link is up and retries the
// connection while it is down. Errors are logged, never propagated.

use std::sync::Arc;
use std::time::Duration;

use heatlink_proto::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connection::ConnectionManager;
use crate::dispatcher::CommandDispatcher;

pub struct Poller {
    connection: ConnectionManager,
    dispatcher: Arc<CommandDispatcher>,
    interval: Duration,
}

impl Poller {
    pub fn new(
        connection: ConnectionManager,
        dispatcher: Arc<CommandDispatcher>,
        interval: Duration,
    ) -> Self {
        Self {
            connection,
            dispatcher,
            interval,
        }
    }

    /// Run one poll cycle.
    pub async fn tick(&self) {
        if self.connection.is_connected() {
            if let Err(e) = self.dispatcher.send(Command::StatusQuery).await {
                warn!(error = %e, "status poll failed");
            }
        } else if let Err(e) = self.connection.connect().await {
            warn!(error = %e, "reconnect attempt failed");
        }
    }

    /// Start the loop. It sleeps first, so the first tick lands one interval
    /// after spawning.
    pub fn spawn(self, cancel: CancellationToken) -> PollerHandle {
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            debug!(interval_secs = self.interval.as_secs(), "poller started");
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(self.interval) => {
                        self.tick().await;
                    }
                }
            }
            debug!("poller stopped");
        });
        PollerHandle { cancel, task }
    }
}

/// Owner of a running poll loop.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Cancel and wait for the loop to exit. A tick in progress finishes
    /// first; no further tick starts.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
