//! The authoritative in-memory set of active watches.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::warn;

use crate::{MonitorError, SnapshotStore, WatchRequest};

/// Control-signal receivers handed to the monitor task that owns a watch.
#[derive(Debug)]
pub struct WatchSignals {
    /// Flips to true when the watch should stop.
    pub stop: watch::Receiver<bool>,
    /// Delivers continuation confirmations.
    pub confirm: mpsc::Receiver<()>,
}

/// A registered watch: the persisted view plus its transient signal senders.
struct WatchHandle {
    request: WatchRequest,
    stop: watch::Sender<bool>,
    confirm: mpsc::Sender<()>,
}

/// Lock-guarded registry of active watches, mirrored to a snapshot file.
///
/// Every mutation takes the lock, applies the change, captures a full
/// snapshot, and writes it to the store after the lock is released. Write
/// failures are logged and do not affect in-memory state.
pub struct Registry {
    watches: Mutex<HashMap<i64, WatchHandle>>,
    store: SnapshotStore,
}

impl Registry {
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            watches: Mutex::new(HashMap::new()),
            store,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Register a watch and allocate fresh control signals for it.
    ///
    /// A second request for the same chat is rejected; the caller must cancel
    /// the existing watch first.
    pub async fn insert(&self, request: WatchRequest) -> Result<WatchSignals, MonitorError> {
        let chat_id = request.chat_id;
        let (signals, snapshot) = {
            let mut watches = self.watches.lock().await;
            if watches.contains_key(&chat_id) {
                return Err(MonitorError::AlreadyWatching(chat_id));
            }

            let (stop_tx, stop_rx) = watch::channel(false);
            let (confirm_tx, confirm_rx) = mpsc::channel(1);
            watches.insert(
                chat_id,
                WatchHandle {
                    request,
                    stop: stop_tx,
                    confirm: confirm_tx,
                },
            );

            (
                WatchSignals {
                    stop: stop_rx,
                    confirm: confirm_rx,
                },
                Self::collect(&watches),
            )
        };

        self.persist(&snapshot).await;
        Ok(signals)
    }

    /// Remove a watch. Returns whether it was present. Idempotent.
    pub async fn remove(&self, chat_id: i64) -> bool {
        let (removed, snapshot) = {
            let mut watches = self.watches.lock().await;
            let removed = watches.remove(&chat_id).is_some();
            (removed, Self::collect(&watches))
        };

        if removed {
            self.persist(&snapshot).await;
        }
        removed
    }

    /// Reset a watch's timeout window to `start_time`. Returns whether the
    /// watch was present.
    pub async fn touch(&self, chat_id: i64, start_time: DateTime<Utc>) -> bool {
        let (touched, snapshot) = {
            let mut watches = self.watches.lock().await;
            let touched = match watches.get_mut(&chat_id) {
                Some(handle) => {
                    handle.request.start_time = start_time;
                    true
                }
                None => false,
            };
            (touched, Self::collect(&watches))
        };

        if touched {
            self.persist(&snapshot).await;
        }
        touched
    }

    /// Look up the persisted view of a watch.
    pub async fn get(&self, chat_id: i64) -> Option<WatchRequest> {
        self.watches
            .lock()
            .await
            .get(&chat_id)
            .map(|h| h.request.clone())
    }

    /// All active watches, ordered by chat id for deterministic fixtures.
    pub async fn snapshot(&self) -> Vec<WatchRequest> {
        Self::collect(&*self.watches.lock().await)
    }

    pub async fn len(&self) -> usize {
        self.watches.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.watches.lock().await.is_empty()
    }

    /// Signal a watch to stop. The owning task observes this at its next
    /// suspension point and removes the watch itself.
    pub async fn stop(&self, chat_id: i64) -> Result<(), MonitorError> {
        let stop = {
            let watches = self.watches.lock().await;
            watches
                .get(&chat_id)
                .map(|h| h.stop.clone())
                .ok_or(MonitorError::NotWatching(chat_id))?
        };
        // Receiver side only disappears with the task itself.
        let _ = stop.send(true);
        Ok(())
    }

    /// Deliver a continuation confirmation to a watch.
    pub async fn confirm(&self, chat_id: i64) -> Result<(), MonitorError> {
        let confirm = {
            let watches = self.watches.lock().await;
            watches
                .get(&chat_id)
                .map(|h| h.confirm.clone())
                .ok_or(MonitorError::NotWatching(chat_id))?
        };
        // A full channel means a confirmation is already pending; dropping
        // the duplicate keeps the signal one-shot per window.
        let _ = confirm.try_send(());
        Ok(())
    }

    fn collect(watches: &HashMap<i64, WatchHandle>) -> Vec<WatchRequest> {
        let mut all: Vec<WatchRequest> = watches.values().map(|h| h.request.clone()).collect();
        all.sort_by_key(|w| w.chat_id);
        all
    }

    async fn persist(&self, snapshot: &[WatchRequest]) {
        if let Err(e) = self.store.write(snapshot).await {
            warn!(path = %self.store.path().display(), error = %e, "failed to write watch snapshot");
        }
    }
}
