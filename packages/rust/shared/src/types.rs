//! Core domain types shared by the extraction and delivery crates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SyncId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one sync attempt (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncId(pub Uuid);

impl SyncId {
    /// Generate a new time-sortable sync identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SyncId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SyncId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SyncId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role for the message at 1-based `position` in a strictly alternating
    /// thread that starts with the user.
    pub fn alternating(position: usize) -> Self {
        if position % 2 == 1 { Role::User } else { Role::Assistant }
    }
}

/// One message found while walking a conversation page.
///
/// Exists only for the duration of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Who wrote it.
    pub role: Role,
    /// Raw inner HTML of the message body.
    pub body_html: String,
    /// Reading-order key: document position, or vertical offset when known.
    pub order_key: f64,
    /// Image sources attached to the message, in document order.
    pub images: Vec<String>,
}

// ---------------------------------------------------------------------------
// ExtractionResult
// ---------------------------------------------------------------------------

/// Title and normalized Markdown produced for one conversation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Stable platform identifier (`openai`, `claude`, ...).
    pub platform: String,
    /// Conversation title (user override, page title, or platform fallback).
    pub title: String,
    /// The joined Markdown document, or the platform's apology text.
    pub markdown: String,
}
