//! Error types for chatsync.
//!
//! Library crates use [`ChatSyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all chatsync operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatSyncError {
    /// Configuration loading or validation error (including a missing webhook).
    #[error("config error: {message}")]
    Config { message: String },

    /// No registered platform accepts the page URL.
    #[error("unsupported platform: {url}")]
    UnsupportedPlatform { url: String },

    /// The page has no recognizable conversation container.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The Flomo sink answered with a non-zero code.
    #[error("delivery failed: {message}")]
    Delivery { message: String },

    /// Network/HTTP error while talking to the sink.
    #[error("network error: {0}")]
    Network(String),

    /// A context port was closed before it answered.
    #[error("channel error: {0}")]
    Channel(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, malformed input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ChatSyncError>;

impl ChatSyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a delivery error carrying the sink's message.
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The message shown to the user for this failure.
    ///
    /// Delivery errors surface the sink's own text untouched; everything else
    /// uses the `Display` form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Delivery { message } => message.clone(),
            Self::Config { message } | Self::Validation { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ChatSyncError::config("webhook missing");
        assert_eq!(err.to_string(), "config error: webhook missing");

        let err = ChatSyncError::UnsupportedPlatform {
            url: "https://example.com/".into(),
        };
        assert!(err.to_string().contains("example.com"));
    }

    #[test]
    fn delivery_user_message_is_sink_text() {
        let err = ChatSyncError::delivery("bad");
        assert_eq!(err.user_message(), "bad");
        assert_eq!(err.to_string(), "delivery failed: bad");
    }
}
