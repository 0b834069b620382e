//! Daemon wiring: recovery at boot, then run until shutdown.
//!
//! The chat front-end that creates, cancels, and confirms watches is a
//! separate process boundary; it drives the registry through
//! `peron_monitor::spawn_watch`, `Registry::stop`, and `Registry::confirm`.
//! This binary hosts the engine itself: it rebuilds state from the snapshot
//! file, keeps the monitor tasks running, and logs their notifications.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use miette::Result;
use tokio::sync::watch;
use tracing::info;

use peron_monitor::{
    MonitorConfig, Notifier, Registry, SnapshotStore, WatchEvent, recover,
};
use peron_tcdd::{TcddClient, TicketSearch};

use crate::allowlist;

/// Configuration for the daemon.
pub struct DaemonConfig {
    pub api_url: String,
    pub db_file: PathBuf,
    pub users_file: PathBuf,
    pub admin_id: i64,
    pub monitor: MonitorConfig,
}

/// Notification sink that writes events to the log.
///
/// Stands in for the chat front-end; every event carries the data that
/// front-end needs to render a message.
struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, chat_id: i64, event: WatchEvent) {
        match event {
            WatchEvent::Started { listing } => {
                info!(chat_id, %listing, "no seats yet, monitoring started")
            }
            WatchEvent::Found { listing } => info!(chat_id, %listing, "ticket found"),
            WatchEvent::ConfirmRequired => {
                info!(chat_id, "watch timed out, confirmation required")
            }
            WatchEvent::Extended => info!(chat_id, "watch extended"),
            WatchEvent::ConfirmExpired => info!(chat_id, "confirmation expired, watch ended"),
            WatchEvent::BadRequest => info!(chat_id, "search request rejected, watch aborted"),
            WatchEvent::ServerError => info!(chat_id, "upstream error on first check, retrying"),
            WatchEvent::Resumed => info!(chat_id, "watch resumed after restart"),
        }
    }
}

/// Run the daemon.
pub async fn run(config: DaemonConfig) -> Result<()> {
    info!(api_url = %config.api_url, admin_id = config.admin_id, "starting peron daemon");

    let allowed = allowlist::load(&config.users_file).await;
    info!(count = allowed.len(), "allowlist loaded");

    let registry = Arc::new(Registry::new(SnapshotStore::new(&config.db_file)));
    let client: Arc<dyn TicketSearch> = Arc::new(TcddClient::new(&config.api_url));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let resumed = recover(&registry, &client, &notifier, &config.monitor)
        .await
        .map_err(|e| miette::miette!("recovery failed: {}", e))?;
    info!(resumed, "watches resumed from snapshot");

    // Create shutdown channel
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    // Handle shutdown signals
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    // Wait for shutdown signal
    loop {
        if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
            break;
        }
    }

    // Active watches stay in the snapshot file and come back on the next
    // boot through the recovery loader; stopping them here would erase them.
    let active = registry.len().await;
    info!(active, "daemon shut down, active watches remain persisted");
    Ok(())
}
