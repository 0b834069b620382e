//! Rebuilding the registry from the snapshot file after a restart.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use peron_tcdd::TicketSearch;

use crate::types::timed_out;
use crate::watch::launch;
use crate::{MonitorConfig, MonitorError, Notifier, Registry, WatchEvent};

/// How far past its travel date a stored watch may be before it is dropped.
const DEPARTURE_GRACE_HOURS: i64 = 24;

/// Rebuild the registry from the snapshot file and relaunch eligible watches.
///
/// Runs exactly once at boot, before any live monitoring activity. Stored
/// watches are skipped when their timeout window has already been crossed or
/// their travel date lies more than a day in the past; an unparseable travel
/// date cannot prove staleness and keeps the watch. Every retained watch gets
/// fresh control signals, a "resumed" notice, and its own monitor task.
///
/// Returns the number of watches resumed.
pub async fn recover(
    registry: &Arc<Registry>,
    client: &Arc<dyn TicketSearch>,
    notifier: &Arc<dyn Notifier>,
    config: &MonitorConfig,
) -> Result<usize, MonitorError> {
    let stored = registry.store().load().await?;
    let now = Utc::now();
    let mut resumed = 0;

    for request in stored {
        let chat_id = request.chat_id;

        if timed_out(request.start_time, config.job_timeout, now) {
            info!(chat_id, start_time = %request.start_time, "dropping stored watch: timeout window crossed");
            continue;
        }
        if request.departed_before(now - chrono::Duration::hours(DEPARTURE_GRACE_HOURS)) {
            info!(chat_id, date = %request.date, "dropping stored watch: travel date elapsed");
            continue;
        }

        // Notice first: the relaunched task may notify immediately on its
        // first check, and the resumed notice must precede that.
        notifier.notify(chat_id, WatchEvent::Resumed).await;

        match launch(
            Arc::clone(registry),
            Arc::clone(client),
            Arc::clone(notifier),
            config.clone(),
            request,
            false,
        )
        .await
        {
            Ok(_handle) => resumed += 1,
            Err(e) => {
                // Duplicate chat ids in a hand-edited snapshot land here.
                warn!(chat_id, error = %e, "failed to relaunch stored watch");
            }
        }
    }

    info!(resumed, "recovery complete");
    Ok(resumed)
}
