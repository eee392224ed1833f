// Scripted in-memory transport shared by the integration tests.
#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use heatlink_proto::{Notifications, Transport, TransportError};
use tokio::sync::mpsc;

pub const ADDRESS: &str = "AA:BB:CC:DD:EE:01";

pub struct MockTransport {
    address: String,
    connected: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    failing_connects: AtomicUsize,
    failing_writes: AtomicUsize,
    /// A failed write also takes the link down.
    fatal_write_failures: AtomicBool,
    connect_delay: Duration,
    writes: Mutex<Vec<Vec<u8>>>,
    notifier: Mutex<Option<mpsc::Sender<Bytes>>>,
}

impl MockTransport {
    pub fn new(address: &str) -> Self {
        Self::with_connect_delay(address, Duration::ZERO)
    }

    pub fn with_connect_delay(address: &str, connect_delay: Duration) -> Self {
        Self {
            address: address.to_owned(),
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            failing_connects: AtomicUsize::new(0),
            failing_writes: AtomicUsize::new(0),
            fatal_write_failures: AtomicBool::new(false),
            connect_delay,
            writes: Mutex::new(Vec::new()),
            notifier: Mutex::new(None),
        }
    }

    // ── Scripting ────────────────────────────────────────────────────

    pub fn fail_next_connects(&self, n: usize) {
        self.failing_connects.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    pub fn write_failures_drop_link(&self, fatal: bool) {
        self.fatal_write_failures.store(fatal, Ordering::SeqCst);
    }

    /// Push an inbound frame as if the heater had notified it.
    pub async fn notify(&self, frame: &[u8]) {
        let sender = self.notifier.lock().unwrap().clone();
        if let Some(sender) = sender {
            let _ = sender.send(Bytes::copy_from_slice(frame)).await;
        }
    }

    /// Simulate the radio link going away.
    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.notifier.lock().unwrap().take();
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    fn take_one(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), TransportError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if Self::take_one(&self.failing_connects) {
            return Err(TransportError::Connect {
                address: self.address.clone(),
                reason: "scripted failure".into(),
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self) -> Result<Notifications, TransportError> {
        let (tx, rx) = mpsc::channel(16);
        *self.notifier.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn write(&self, frame: &[u8]) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if Self::take_one(&self.failing_writes) {
            if self.fatal_write_failures.load(Ordering::SeqCst) {
                self.drop_link();
            }
            return Err(TransportError::Write("scripted failure".into()));
        }
        self.writes.lock().unwrap().push(frame.to_vec());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        self.notifier.lock().unwrap().take();
        Ok(())
    }
}

/// A 43-byte status frame in live-target layout.
pub fn status_frame(running: u8, target: u8, ambient: u8) -> Vec<u8> {
    let mut frame = vec![0u8; 43];
    frame[..7].copy_from_slice(&[0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00]);
    frame[7] = 0x23;
    frame[20] = running;
    frame[22] = target;
    frame[23] = 0x02;
    frame[24..26].copy_from_slice(&150u16.to_le_bytes());
    frame[26] = ambient;
    frame
}
