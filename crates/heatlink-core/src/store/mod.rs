// ── Status store ──
//
// Single owner of the heater's latest known status. Decoded deltas, link
// transitions and optimistic command updates all funnel through here so
// observers see one consistent sequence of snapshots.

mod stream;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use heatlink_proto::{HeaterState, StatusDelta};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::model::HeaterStatus;

pub use stream::{StatusStream, StatusWatchStream};

/// Callback invoked with a fresh snapshot after every status change.
///
/// Observers run in write order, one write at a time. They must not write
/// back into the store.
pub type Observer = Arc<dyn Fn(&HeaterStatus) + Send + Sync>;

/// Handle returned by [`StatusStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

pub struct StatusStore {
    status: watch::Sender<HeaterStatus>,
    observers: DashMap<ObserverId, Observer>,
    next_id: AtomicU64,
    /// Held from a write until its observers have run.
    ordering: Mutex<()>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (status, _) = watch::channel(HeaterStatus::default());
        Self {
            status,
            observers: DashMap::new(),
            next_id: AtomicU64::new(1),
            ordering: Mutex::new(()),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> HeaterStatus {
        *self.status.borrow()
    }

    pub fn watch(&self) -> StatusStream {
        StatusStream::new(self.status.subscribe())
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&HeaterStatus) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.insert(id, Arc::new(observer));
        debug!(%id, "observer registered");
        id
    }

    /// Returns `false` if the id was unknown.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Apply a decoded delta. Absent fields keep their prior values.
    /// Observers fire exactly once per call.
    pub fn merge(&self, delta: StatusDelta) {
        let _ordered = self.write_turn();
        let mut transition: Option<(HeaterState, HeaterState)> = None;
        let mut snapshot = HeaterStatus::default();

        self.status.send_modify(|status| {
            if let Some(state) = delta.state {
                if status.state != state {
                    transition = Some((status.state, state));
                }
                status.state = state;
            }
            if let Some(target) = delta.target_temp {
                status.target_temp = target;
            }
            if let Some(body) = delta.body_temp {
                status.body_temp = body;
            }
            if let Some(ambient) = delta.ambient_temp {
                status.ambient_temp = ambient;
            }
            snapshot = *status;
        });

        if let Some((from, to)) = transition {
            info!(%from, %to, "heater state changed");
        }
        debug!(?snapshot, "status merged");
        self.notify(&snapshot);
    }

    /// Record a link transition. Observers fire only when the flag flips.
    pub fn set_connected(&self, connected: bool) {
        let _ordered = self.write_turn();
        let mut snapshot = None;
        self.status.send_if_modified(|status| {
            if status.connected == connected {
                return false;
            }
            status.connected = connected;
            snapshot = Some(*status);
            true
        });
        if let Some(snapshot) = snapshot {
            self.notify(&snapshot);
        }
    }

    /// Optimistic target update after a successful set-temperature write.
    pub fn set_target_temp(&self, target: u8) {
        let _ordered = self.write_turn();
        let mut snapshot = HeaterStatus::default();
        self.status.send_modify(|status| {
            status.target_temp = target;
            snapshot = *status;
        });
        self.notify(&snapshot);
    }

    fn write_turn(&self) -> MutexGuard<'_, ()> {
        self.ordering.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, snapshot: &HeaterStatus) {
        // Clone out first so callbacks run without holding any shard lock.
        let observers: Vec<Observer> = self
            .observers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for observer in observers {
            observer(snapshot);
        }
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
