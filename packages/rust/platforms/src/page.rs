//! Page snapshots: the URL and serialized DOM of one open chat tab.

use chatsync_shared::{ChatSyncError, Result};
use url::Url;

/// The URL and HTML of a chat page at the moment of capture.
///
/// Parsing happens per extraction, so a snapshot is cheap to share across
/// tasks.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    url: String,
    html: String,
}

impl PageSnapshot {
    /// Build a snapshot, rejecting URLs that do not parse.
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Result<Self> {
        let url = url.into();
        Url::parse(url.trim())
            .map_err(|e| ChatSyncError::validation(format!("invalid page URL {url:?}: {e}")))?;
        Ok(Self {
            url: url.trim().to_string(),
            html: html.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}
