//! Durable snapshot of the watch registry.
//!
//! A flat JSON file, rewritten whole on every registry mutation. The file is
//! a best-effort mirror: while the process is live, the in-memory registry is
//! authoritative and write failures are survivable.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{MonitorError, WatchRequest};

/// Whole-file JSON store for watch snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last snapshot. A missing file is an empty registry.
    pub async fn load(&self) -> Result<Vec<WatchRequest>, MonitorError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the snapshot with the given watches.
    pub async fn write(&self, watches: &[WatchRequest]) -> Result<(), MonitorError> {
        let bytes = serde_json::to_vec_pretty(watches)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(chat_id: i64) -> WatchRequest {
        WatchRequest {
            chat_id,
            from_id: 98,
            from_name: "ANKARA GAR".to_string(),
            to_id: 1325,
            to_name: "İSTANBUL(SÖĞÜTLÜÇEŞME)".to_string(),
            date: "25-08-2026".to_string(),
            filter_start: 540,
            filter_end: 600,
            start_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("watches.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("watches.json"));

        let watches = vec![sample(1), sample(2)];
        store.write(&watches).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, watches);
    }

    #[tokio::test]
    async fn test_write_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("watches.json"));

        store.write(&[sample(1), sample(2)]).await.unwrap();
        store.write(&[sample(3)]).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].chat_id, 3);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watches.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = SnapshotStore::new(path);
        assert!(matches!(
            store.load().await,
            Err(MonitorError::SnapshotCodec(_))
        ));
    }
}
