//! Error types for the TCDD client.

use thiserror::Error;

/// Errors that can occur when talking to the ticket-search service.
///
/// The monitoring engine only distinguishes two cases: a terminal rejection
/// of the search request itself, and everything else, which is retried under
/// backoff.
#[derive(Debug, Error)]
pub enum TcddError {
    /// The search request was rejected as malformed. Not retried.
    #[error("search request rejected: {0}")]
    BadRequest(String),

    /// Timeouts, server errors, and unparseable responses. Retried.
    #[error("transient upstream failure: {0}")]
    Transient(String),
}

impl TcddError {
    /// Whether this error ends monitoring instead of triggering a retry.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TcddError::BadRequest(_))
    }
}

impl From<reqwest::Error> for TcddError {
    fn from(err: reqwest::Error) -> Self {
        // Network failures and client-side timeouts are always worth a retry.
        TcddError::Transient(err.to_string())
    }
}
