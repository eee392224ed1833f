// ── Command dispatcher ──
//
// Serialized, retrying command delivery. One command is in flight at a
// time; a second caller waits for the first to finish its whole retry
// loop. Lock order is always dispatcher, then connection lifecycle.

use std::sync::Arc;

use heatlink_proto::{Command, ProtocolCodec, clamp_temperature};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::connection::ConnectionManager;
use crate::error::CoreError;
use crate::store::StatusStore;

pub struct CommandDispatcher {
    connection: ConnectionManager,
    store: Arc<StatusStore>,
    codec: Arc<ProtocolCodec>,
    retry: RetryPolicy,
    in_flight: Mutex<()>,
}

impl CommandDispatcher {
    pub fn new(
        connection: ConnectionManager,
        store: Arc<StatusStore>,
        codec: Arc<ProtocolCodec>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            connection,
            store,
            codec,
            retry,
            in_flight: Mutex::new(()),
        }
    }

    /// Deliver a command, reconnecting and retrying as needed.
    ///
    /// Connect failures move straight to the next attempt; write failures
    /// pause for the retry delay first, except after the final attempt.
    pub async fn send(&self, command: Command) -> Result<(), CoreError> {
        let _guard = self.in_flight.lock().await;
        let frame = self.codec.encode(&command);
        let attempts = self.retry.attempts;
        let mut last_error = String::from("no attempts configured");

        for attempt in 1..=attempts {
            if !self.connection.is_connected() {
                if let Err(e) = self.connection.connect().await {
                    warn!(
                        command = command.name(),
                        attempt,
                        max = attempts,
                        error = %e,
                        "connect failed before command"
                    );
                    last_error = e.to_string();
                    continue;
                }
            }

            match self.connection.write(&frame).await {
                Ok(()) => {
                    debug!(command = command.name(), attempt, "command delivered");
                    if let Command::SetTemperature(requested) = command {
                        self.store.set_target_temp(clamp_temperature(requested));
                    }
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        command = command.name(),
                        attempt,
                        max = attempts,
                        error = %e,
                        "command write failed"
                    );
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        Err(CoreError::RetriesExhausted {
            command: command.name(),
            attempts,
            reason: last_error,
        })
    }
}
