//! Flat-file allowlist of chat ids permitted to create watches.
//!
//! The authorization check itself happens in the chat front-end; this module
//! only loads the list. An absent file is an empty allowlist.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

/// Load the allowlist: one integer chat id per line, blank lines and
/// unparseable lines skipped.
pub async fn load(path: &Path) -> HashSet<i64> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text
            .lines()
            .filter_map(|line| line.trim().parse().ok())
            .collect(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "allowlist file absent, treating as empty");
            HashSet::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read allowlist");
            HashSet::new()
        }
    }
}
