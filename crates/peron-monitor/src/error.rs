//! Error types for the monitoring engine.

use thiserror::Error;

/// Errors that can occur in registry and recovery operations.
///
/// Upstream search errors never appear here: they are resolved inside the
/// owning monitor task and classified by `peron_tcdd::TcddError`.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A watch already exists for this recipient.
    #[error("already watching for chat {0}")]
    AlreadyWatching(i64),

    /// No active watch for this recipient.
    #[error("no active watch for chat {0}")]
    NotWatching(i64),

    /// Snapshot file could not be read or written.
    #[error("snapshot io error: {0}")]
    SnapshotIo(#[from] std::io::Error),

    /// Snapshot contents could not be encoded or decoded.
    #[error("snapshot codec error: {0}")]
    SnapshotCodec(#[from] serde_json::Error),
}
