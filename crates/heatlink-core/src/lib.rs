//! Session runtime for HBU1S-family parking heaters.
//!
//! `heatlink-core` sits between a platform BLE backend (anything
//! implementing [`heatlink_proto::Transport`]) and whatever presents the
//! heater to users. It owns:
//!
//! - **[`Heater`]** — the session facade. Cheaply cloneable; every consumer
//!   operation goes through it.
//! - **[`ConnectionManager`]** — link lifecycle under one lock, plus the
//!   notification pump that feeds decoded frames into the store.
//! - **[`CommandDispatcher`]** — single-flight command delivery with
//!   bounded retry.
//! - **[`StatusStore`]** — latest known [`HeaterStatus`], observer
//!   callbacks and a watch-backed [`StatusStream`].
//! - **[`Poller`]** — periodic keepalive and reconnect.

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod heater;
pub mod model;
pub mod poller;
pub mod store;

pub use config::{
    DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY, DEFAULT_SETTLE_DELAY,
    HeaterConfig, RetryPolicy,
};
pub use connection::{ConnectionManager, ConnectionState};
pub use dispatcher::CommandDispatcher;
pub use error::CoreError;
pub use heater::Heater;
pub use model::HeaterStatus;
pub use poller::{Poller, PollerHandle};
pub use store::{Observer, ObserverId, StatusStore, StatusStream, StatusWatchStream};

pub use heatlink_proto::{Command, HeaterState, LayoutPolicy};
