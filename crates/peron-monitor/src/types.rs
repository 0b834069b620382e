//! Watch entity, notification events, and engine configuration.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use peron_tcdd::RouteQuery;
use serde::{Deserialize, Serialize};

use crate::evaluator::DepartureFilter;

/// Travel date formats accepted on the wire, most specific first.
const DATE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";
const DATE_FORMAT: &str = "%d-%m-%Y";

/// One monitored route/date search on behalf of one recipient.
///
/// This is the persisted view of a watch: exactly the fields mirrored to the
/// snapshot file. Transient control state (stop/continuation signals, the
/// consecutive-error counter) lives in the registry handle and the monitor
/// task, and is recreated fresh on every launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRequest {
    /// Recipient identifier; also the registry key.
    pub chat_id: i64,
    pub from_id: i64,
    pub from_name: String,
    pub to_id: i64,
    pub to_name: String,
    /// Travel date in `DD-MM-YYYY[ HH:MM:SS]` form.
    pub date: String,
    /// Inclusive minute-of-day bounds; both `-1` means no filter.
    pub filter_start: i32,
    pub filter_end: i32,
    /// Start of the current timeout window; reset when the watch is extended.
    pub start_time: DateTime<Utc>,
}

impl WatchRequest {
    /// The upstream search query for this watch.
    pub fn route(&self) -> RouteQuery {
        RouteQuery {
            from_id: self.from_id,
            from_name: self.from_name.clone(),
            to_id: self.to_id,
            to_name: self.to_name.clone(),
            date: self.date.clone(),
        }
    }

    /// The departure time-of-day filter for this watch.
    pub fn filter(&self) -> DepartureFilter {
        DepartureFilter::new(self.filter_start, self.filter_end)
    }

    /// Parse the travel date, if it is well-formed.
    pub fn travel_date(&self) -> Option<NaiveDateTime> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&self.date, DATE_TIME_FORMAT) {
            return Some(dt);
        }
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    /// Whether the travel date is known to lie before `cutoff`.
    ///
    /// An unparseable date cannot prove staleness, so it returns false.
    pub fn departed_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.travel_date()
            .map(|dt| dt.and_utc() < cutoff)
            .unwrap_or(false)
    }
}

/// Whether the timeout window starting at `start` has been crossed at `now`.
///
/// An elapsed time exactly equal to the timeout does not count as crossed.
pub fn timed_out(start: DateTime<Utc>, timeout: Duration, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(start)
        .to_std()
        .is_ok_and(|elapsed| elapsed > timeout)
}

/// Outbound notifications produced by the monitoring core.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// First run found no seats; monitoring has started.
    Started { listing: String },
    /// A notifiable seat exists; monitoring ends.
    Found { listing: String },
    /// The job timeout was crossed; continuation must be confirmed.
    ConfirmRequired,
    /// Continuation confirmed; the timeout window was reset.
    Extended,
    /// The confirmation window elapsed without a signal.
    ConfirmExpired,
    /// The search request was rejected; monitoring aborts.
    BadRequest,
    /// First run hit a transient upstream failure; retrying.
    ServerError,
    /// The watch was resumed after a process restart.
    Resumed,
}

/// Notification sink implemented by the chat front-end.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat_id: i64, event: WatchEvent);
}

/// Timing configuration for the monitoring engine.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base interval between availability checks.
    pub base_interval: Duration,
    /// Backoff ceiling under consecutive transient errors.
    pub max_backoff: Duration,
    /// Upper bound of the uniform jitter added to every wait.
    pub jitter: Duration,
    /// How long a watch may run before continuation must be confirmed.
    pub job_timeout: Duration,
    /// How long the recipient has to confirm continuation.
    pub confirm_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(90),
            max_backoff: Duration::from_secs(30 * 60),
            jitter: Duration::from_secs(20),
            job_timeout: Duration::from_secs(18 * 3600),
            confirm_timeout: Duration::from_secs(10 * 60),
        }
    }
}
