//! HTTP client for the TCDD ticket-search service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::{RouteQuery, Station, TcddError, TrainResponse};

/// The search operation the monitoring engine depends on.
///
/// Implemented by [`TcddClient`] in production and by scripted stubs in the
/// engine's tests.
#[async_trait]
pub trait TicketSearch: Send + Sync {
    /// Search for trains on one route/date.
    ///
    /// Returns [`TcddError::BadRequest`] only for a rejected request; every
    /// other failure mode is [`TcddError::Transient`].
    async fn search_trains(&self, query: &RouteQuery) -> Result<TrainResponse, TcddError>;
}

/// Client for the TCDD ticket-search gateway.
pub struct TcddClient {
    http: Client,
    base_url: String,
}

impl TcddClient {
    /// Create a new client for the given gateway URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch the full station list.
    ///
    /// Not used by the monitoring loop itself; the command front-end needs it
    /// to resolve station names to ids.
    pub async fn list_stations(&self) -> Result<Vec<Station>, TcddError> {
        let url = format!("{}/station/station-list-all", self.base_url);

        let response = self.http.post(&url).json(&serde_json::json!({})).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TcddError::Transient(format!(
                "station list returned {}",
                status
            )));
        }

        let stations: Vec<Station> = response
            .json()
            .await
            .map_err(|e| TcddError::Transient(format!("station list parse failed: {}", e)))?;

        debug!(count = stations.len(), "fetched station list");
        Ok(stations)
    }
}

#[async_trait]
impl TicketSearch for TcddClient {
    async fn search_trains(&self, query: &RouteQuery) -> Result<TrainResponse, TcddError> {
        let url = format!("{}/train/train-availability", self.base_url);

        let response = self.http.post(&url).json(&query.to_request()).send().await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(TcddError::BadRequest(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            // Rate limits, gateway errors, maintenance pages: all retryable.
            return Err(TcddError::Transient(format!("search returned {}", status)));
        }

        // A 2xx body that does not parse is treated as transient: prefer a
        // retry over silently dropping an availability window.
        let result: TrainResponse = response
            .json()
            .await
            .map_err(|e| TcddError::Transient(format!("search response parse failed: {}", e)))?;

        debug!(
            from = %query.from_name,
            to = %query.to_name,
            date = %query.date,
            legs = result.train_legs.len(),
            "search completed"
        );
        Ok(result)
    }
}
