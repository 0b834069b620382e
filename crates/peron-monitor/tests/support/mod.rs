//! Shared fixtures for the engine's integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, mpsc};

use peron_monitor::{
    MonitorConfig, Notifier, Registry, SnapshotStore, WatchEvent, WatchRequest,
};
use peron_tcdd::{
    CabinAvailability, CabinClass, FareInfo, RouteQuery, Segment, TcddError, TicketSearch, Train,
    TrainAvailability, TrainLeg, TrainResponse,
};

/// A search client that replays a script of responses, then keeps returning
/// an empty (no seats) result. Records the instant of every call.
pub struct ScriptedSearch {
    script: Mutex<VecDeque<Result<TrainResponse, TcddError>>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedSearch {
    pub fn new(script: Vec<Result<TrainResponse, TcddError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub async fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl TicketSearch for ScriptedSearch {
    async fn search_trains(&self, _query: &RouteQuery) -> Result<TrainResponse, TcddError> {
        self.calls.lock().await.push(Instant::now());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(empty_response()))
    }
}

/// Notifier that forwards every event into a channel for assertions.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<(i64, WatchEvent)>,
}

impl ChannelNotifier {
    pub fn pair() -> (Arc<Self>, mpsc::UnboundedReceiver<(i64, WatchEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, chat_id: i64, event: WatchEvent) {
        let _ = self.tx.send((chat_id, event));
    }
}

/// Wait for the next notification, failing the test after one second.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<(i64, WatchEvent)>) -> (i64, WatchEvent) {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("notifier channel closed")
}

pub fn request(chat_id: i64) -> WatchRequest {
    WatchRequest {
        chat_id,
        from_id: 98,
        from_name: "ANKARA GAR".to_string(),
        to_id: 1325,
        to_name: "İSTANBUL(SÖĞÜTLÜÇEŞME)".to_string(),
        date: "01-01-2030".to_string(),
        filter_start: -1,
        filter_end: -1,
        start_time: Utc::now(),
    }
}

/// Millisecond-scale timings so lifecycle tests run fast.
pub fn fast_config() -> MonitorConfig {
    MonitorConfig {
        base_interval: Duration::from_millis(10),
        max_backoff: Duration::from_millis(80),
        jitter: Duration::ZERO,
        job_timeout: Duration::from_secs(3600),
        confirm_timeout: Duration::from_secs(3600),
    }
}

pub fn registry_in(dir: &tempfile::TempDir) -> Arc<Registry> {
    Arc::new(Registry::new(SnapshotStore::new(
        dir.path().join("watches.json"),
    )))
}

pub fn empty_response() -> TrainResponse {
    TrainResponse::default()
}

/// A response with one economy train departing 09:00 timetable-local.
pub fn found_response(seats: f64) -> TrainResponse {
    // 09:00 at UTC+3 on an arbitrary date.
    let departure_ms = 1_756_101_600_000i64;
    TrainResponse {
        train_legs: vec![TrainLeg {
            train_availabilities: vec![TrainAvailability {
                trains: vec![Train {
                    id: 1,
                    name: "YHT 8102".to_string(),
                    train_number: "8102".to_string(),
                    min_price: None,
                    segments: vec![Segment {
                        departure_time: departure_ms,
                        arrival_time: departure_ms + 4 * 3600 * 1000,
                    }],
                    available_fare_info: vec![FareInfo {
                        cabin_classes: vec![CabinAvailability {
                            availability_count: seats,
                            cabin_class: Some(CabinClass {
                                name: "EKONOMİ".to_string(),
                            }),
                            min_price: 375.5,
                        }],
                    }],
                }],
            }],
        }],
    }
}
