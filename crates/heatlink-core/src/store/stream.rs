// ── Reactive status stream ──

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::HeaterStatus;

/// A subscription to the heater's status.
///
/// Provides both point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct StatusStream {
    current: HeaterStatus,
    receiver: watch::Receiver<HeaterStatus>,
}

impl StatusStream {
    pub(crate) fn new(receiver: watch::Receiver<HeaterStatus>) -> Self {
        let current = *receiver.borrow();
        Self { current, receiver }
    }

    /// Snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> HeaterStatus {
        self.current
    }

    /// Latest snapshot, which may be newer than `current()`.
    pub fn latest(&self) -> HeaterStatus {
        *self.receiver.borrow()
    }

    /// Wait for the next change. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<HeaterStatus> {
        self.receiver.changed().await.ok()?;
        let snap = *self.receiver.borrow_and_update();
        self.current = snap;
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StatusWatchStream {
        StatusWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a status snapshot after every change.
pub struct StatusWatchStream {
    inner: WatchStream<HeaterStatus>,
}

impl Stream for StatusWatchStream {
    type Item = HeaterStatus;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
