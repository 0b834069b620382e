//! Seat-availability monitoring engine for peron.
//!
//! This crate provides the per-job monitoring core:
//! - An in-memory [`Registry`] of active watches, mirrored to a snapshot file
//! - One monitor task per watch, with polling, exponential backoff, and a
//!   timeout/confirmation state machine
//! - A recovery loader that relaunches eligible watches after a restart
//! - A pure availability evaluator over upstream search responses

mod error;
mod evaluator;
mod recovery;
mod registry;
mod store;
mod types;
mod watch;

pub use error::MonitorError;
pub use evaluator::{DepartureFilter, Evaluation, NO_FILTER, evaluate};
pub use recovery::recover;
pub use registry::{Registry, WatchSignals};
pub use store::SnapshotStore;
pub use types::{MonitorConfig, Notifier, WatchEvent, WatchRequest, timed_out};
pub use watch::spawn_watch;
