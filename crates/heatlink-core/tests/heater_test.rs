#![allow(clippy::unwrap_used)]
// Session facade: opening via a resolver, polling, rebinding and shutdown.

mod support;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use heatlink_core::{CoreError, Heater, HeaterConfig, HeaterState};
use heatlink_proto::{Transport, TransportResolver, encode_init};
use pretty_assertions::assert_eq;
use support::{ADDRESS, MockTransport, status_frame};
use tokio::sync::mpsc;

// ── Helpers ─────────────────────────────────────────────────────────

const QUERY: [u8; 2] = [0xaa, 0xbb];

struct MapResolver(HashMap<String, Arc<MockTransport>>);

#[async_trait]
impl TransportResolver for MapResolver {
    async fn resolve(&self, address: &str) -> Option<Arc<dyn Transport>> {
        self.0
            .get(address)
            .map(|mock| Arc::clone(mock) as Arc<dyn Transport>)
    }
}

fn polling_config() -> HeaterConfig {
    let mut config = HeaterConfig::new(ADDRESS);
    config.poll_interval = Duration::from_secs(30);
    config.status_query = Some(QUERY.to_vec());
    config
}

fn heater_on(mock: &Arc<MockTransport>, config: HeaterConfig) -> Heater {
    let handle: Arc<dyn Transport> = mock.clone();
    Heater::new(handle, config)
}

// ── Open ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn open_unknown_address_is_not_found() {
    let resolver = MapResolver(HashMap::new());
    let err = Heater::open(&resolver, ADDRESS, HeaterConfig::new(ADDRESS))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, CoreError::DeviceNotFound { address } if address == ADDRESS));
}

#[tokio::test(start_paused = true)]
async fn open_connects_immediately() {
    let mock = Arc::new(MockTransport::new(ADDRESS));
    let resolver = MapResolver(HashMap::from([(ADDRESS.to_owned(), Arc::clone(&mock))]));

    let heater = Heater::open(&resolver, ADDRESS, HeaterConfig::new("ignored"))
        .await
        .unwrap();

    assert!(heater.status().connected);
    assert_eq!(heater.config().address, ADDRESS);
    assert_eq!(mock.writes(), vec![encode_init()]);
}

#[tokio::test(start_paused = true)]
async fn open_reports_unreachable_device() {
    let mock = Arc::new(MockTransport::new(ADDRESS));
    mock.fail_next_connects(1);
    let resolver = MapResolver(HashMap::from([(ADDRESS.to_owned(), Arc::clone(&mock))]));

    let err = Heater::open(&resolver, ADDRESS, HeaterConfig::new(ADDRESS))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, CoreError::ConnectionFailed { .. }));
}

// ── Observers and streams ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn observers_see_connection_and_status_changes() {
    let mock = Arc::new(MockTransport::new(ADDRESS));
    let heater = heater_on(&mock, HeaterConfig::new(ADDRESS));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = heater.subscribe(move |s| sink.lock().unwrap().push((s.connected, s.state)));

    heater.connect().await.unwrap();
    let mut stream = heater.watch().into_stream();
    // WatchStream yields the current value first.
    stream.next().await.unwrap();

    mock.notify(&status_frame(0x83, 20, 5)).await;
    let status = stream.next().await.unwrap();
    assert_eq!(status.state, HeaterState::Running);
    assert_eq!(status.target_temp, 20);

    assert!(heater.unsubscribe(id));
    heater.disconnect().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(true, HeaterState::Off), (true, HeaterState::Running)]
    );
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn poller_reconnects_then_refreshes() {
    let mock = Arc::new(MockTransport::new(ADDRESS));
    let heater = heater_on(&mock, polling_config());
    heater.start_polling().await;
    assert!(heater.is_polling().await);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(mock.connect_calls(), 1);
    assert!(heater.status().connected);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(mock.writes(), vec![encode_init(), QUERY.to_vec()]);

    heater.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn poller_survives_failed_ticks() {
    let mock = Arc::new(MockTransport::new(ADDRESS));
    mock.fail_next_connects(1);
    let heater = heater_on(&mock, polling_config());
    heater.start_polling().await;

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(!heater.status().connected);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(mock.connect_calls(), 2);
    assert!(heater.status().connected);

    heater.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn stopping_a_sleeping_poller_is_prompt() {
    let mock = Arc::new(MockTransport::new(ADDRESS));
    let heater = heater_on(&mock, polling_config());
    heater.start_polling().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    tokio::time::timeout(Duration::from_millis(100), heater.stop_polling())
        .await
        .unwrap();
    assert!(!heater.is_polling().await);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(mock.connect_calls(), 0);

    // Neither lock was left held.
    heater.connect().await.unwrap();
    heater.turn_on().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling_and_disconnects() {
    let mock = Arc::new(MockTransport::new(ADDRESS));
    let heater = heater_on(&mock, polling_config());
    heater.connect().await.unwrap();
    heater.start_polling().await;

    heater.shutdown().await;

    assert!(!heater.is_polling().await);
    assert!(!heater.status().connected);
    assert_eq!(mock.disconnect_calls(), 1);
}

// ── Rebinding ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn follow_rebinds_filters_by_address() {
    let original = Arc::new(MockTransport::new(ADDRESS));
    let stranger = Arc::new(MockTransport::new("11:22:33:44:55:66"));
    let replacement = Arc::new(MockTransport::new(&ADDRESS.to_lowercase()));
    let heater = heater_on(&original, HeaterConfig::new(ADDRESS));

    let (tx, rx) = mpsc::channel::<Arc<dyn Transport>>(4);
    let follower = heater.follow_rebinds(rx);
    tx.send(stranger.clone()).await.unwrap();
    tx.send(replacement.clone()).await.unwrap();
    drop(tx);
    follower.await.unwrap();

    heater.connect().await.unwrap();
    assert_eq!(original.connect_calls(), 0);
    assert_eq!(stranger.connect_calls(), 0);
    assert_eq!(replacement.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn follow_rebinds_ends_on_shutdown() {
    let mock = Arc::new(MockTransport::new(ADDRESS));
    let heater = heater_on(&mock, HeaterConfig::new(ADDRESS));
    let (_tx, rx) = mpsc::channel::<Arc<dyn Transport>>(1);
    let follower = heater.follow_rebinds(rx);

    heater.shutdown().await;
    tokio::time::timeout(Duration::from_secs(1), follower)
        .await
        .unwrap()
        .unwrap();
}
