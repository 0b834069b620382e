//! The per-watch monitor task.
//!
//! One task per active watch, spawned on creation and on recovery. The task
//! owns its backoff state and the timeout/confirmation state machine, and is
//! the only writer of its watch's lifecycle: it removes the watch from the
//! registry on every terminal transition.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use peron_tcdd::TicketSearch;

use crate::registry::WatchSignals;
use crate::types::timed_out;
use crate::{MonitorConfig, MonitorError, Notifier, Registry, WatchEvent, WatchRequest, evaluate};

/// Register a new watch and launch its monitor task.
///
/// Fails with [`MonitorError::AlreadyWatching`] if the recipient already has
/// an active watch.
pub async fn spawn_watch(
    registry: Arc<Registry>,
    client: Arc<dyn TicketSearch>,
    notifier: Arc<dyn Notifier>,
    config: MonitorConfig,
    request: WatchRequest,
) -> Result<JoinHandle<()>, MonitorError> {
    launch(registry, client, notifier, config, request, true).await
}

/// Shared launch path for fresh and resumed watches. Resumed watches skip the
/// first-run notices (a "resumed" notice has already been sent) but otherwise
/// run the same state machine.
pub(crate) async fn launch(
    registry: Arc<Registry>,
    client: Arc<dyn TicketSearch>,
    notifier: Arc<dyn Notifier>,
    config: MonitorConfig,
    request: WatchRequest,
    announce: bool,
) -> Result<JoinHandle<()>, MonitorError> {
    let signals = registry.insert(request.clone()).await?;
    Ok(tokio::spawn(run_watch(
        registry, client, notifier, config, request, signals, announce,
    )))
}

/// The monitor loop: first check, then poll/backoff until a terminal
/// transition. Within one watch, checks are strictly sequential.
async fn run_watch(
    registry: Arc<Registry>,
    client: Arc<dyn TicketSearch>,
    notifier: Arc<dyn Notifier>,
    config: MonitorConfig,
    request: WatchRequest,
    mut signals: WatchSignals,
    announce: bool,
) {
    let chat_id = request.chat_id;
    let route = request.route();
    let filter = request.filter();
    let mut start_time = request.start_time;
    let mut errors: u32 = 0;

    info!(chat_id, from = %route.from_name, to = %route.to_name, date = %route.date, "watch started");

    // First run: an immediate check before any wait.
    match client.search_trains(&route).await {
        Ok(response) => {
            let result = evaluate(&response, filter);
            if result.found {
                notifier
                    .notify(chat_id, WatchEvent::Found { listing: result.listing })
                    .await;
                finish(&registry, chat_id, "ticket found on first run").await;
                return;
            }
            if announce {
                notifier
                    .notify(chat_id, WatchEvent::Started { listing: result.listing })
                    .await;
            }
        }
        Err(e) if e.is_terminal() => {
            warn!(chat_id, error = %e, "search request rejected, aborting watch");
            notifier.notify(chat_id, WatchEvent::BadRequest).await;
            finish(&registry, chat_id, "bad request").await;
            return;
        }
        Err(e) => {
            // The only transient error the recipient ever hears about.
            warn!(chat_id, error = %e, "first check failed, will retry");
            if announce {
                notifier.notify(chat_id, WatchEvent::ServerError).await;
            }
            errors = 1;
        }
    }

    loop {
        let delay = poll_delay(&config, errors);
        debug!(chat_id, errors, delay_ms = delay.as_millis() as u64, "waiting for next check");

        tokio::select! {
            biased;

            _ = stop_requested(&mut signals.stop) => {
                finish(&registry, chat_id, "stopped").await;
                return;
            }

            _ = sleep(delay) => {}
        }

        // Waking up past the timeout window forces a continuation decision
        // before any further upstream traffic.
        if timed_out(start_time, config.job_timeout, Utc::now()) {
            // Confirmations sent while still polling are stale. The window
            // opens now; only a signal arriving inside it counts.
            while signals.confirm.try_recv().is_ok() {}
            notifier.notify(chat_id, WatchEvent::ConfirmRequired).await;

            tokio::select! {
                biased;

                _ = stop_requested(&mut signals.stop) => {
                    finish(&registry, chat_id, "stopped while awaiting confirmation").await;
                    return;
                }

                confirmed = signals.confirm.recv() => {
                    if confirmed.is_none() {
                        // Sender gone: the watch was dropped from the registry.
                        finish(&registry, chat_id, "confirmation channel closed").await;
                        return;
                    }
                    start_time = Utc::now();
                    errors = 0;
                    registry.touch(chat_id, start_time).await;
                    notifier.notify(chat_id, WatchEvent::Extended).await;
                    info!(chat_id, "watch extended");
                    continue;
                }

                _ = sleep(config.confirm_timeout) => {
                    notifier.notify(chat_id, WatchEvent::ConfirmExpired).await;
                    finish(&registry, chat_id, "confirmation window elapsed").await;
                    return;
                }
            }
        }

        match client.search_trains(&route).await {
            Ok(response) => {
                errors = 0;
                let result = evaluate(&response, filter);
                if result.found {
                    notifier
                        .notify(chat_id, WatchEvent::Found { listing: result.listing })
                        .await;
                    finish(&registry, chat_id, "ticket found").await;
                    return;
                }
                debug!(chat_id, "no seats yet");
            }
            Err(e) if e.is_terminal() => {
                warn!(chat_id, error = %e, "search request rejected, aborting watch");
                notifier.notify(chat_id, WatchEvent::BadRequest).await;
                finish(&registry, chat_id, "bad request").await;
                return;
            }
            Err(e) => {
                errors = errors.saturating_add(1);
                // Silent towards the recipient: backoff handles it.
                warn!(chat_id, errors, error = %e, "transient search failure, backing off");
            }
        }
    }
}

async fn finish(registry: &Registry, chat_id: i64, reason: &str) {
    registry.remove(chat_id).await;
    info!(chat_id, reason, "watch terminated");
}

/// Resolves once the stop flag flips to true (or its sender is gone).
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Backoff before the next check: the base interval, doubled per consecutive
/// transient error up to the configured ceiling.
fn backoff(base: Duration, max: Duration, errors: u32) -> Duration {
    if errors == 0 {
        return base;
    }
    let doubled = base.as_nanos().saturating_mul(1u128 << errors.min(127));
    if doubled >= max.as_nanos() {
        return max;
    }
    u64::try_from(doubled).map_or(max, Duration::from_nanos)
}

/// Full wait between checks: backoff plus uniform jitter from `[0, jitter)`.
fn poll_delay(config: &MonitorConfig, errors: u32) -> Duration {
    let mut delay = backoff(config.base_interval, config.max_backoff, errors);
    let jitter_ms = config.jitter.as_millis() as u64;
    if jitter_ms > 0 {
        delay += Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms));
    }
    delay
}
