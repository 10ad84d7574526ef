//! Shared types, error model, and configuration for chatsync.
//!
//! Every other chatsync crate depends on this one for [`ChatSyncError`],
//! the domain types ([`ChatMessage`], [`Role`], [`ExtractionResult`],
//! [`SyncId`]) and configuration loading ([`AppConfig`], [`ExtensionConfig`]).

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_TAG_PREFIX, ExtensionConfig, FlomoConfig, WEBHOOK_PREFIXES, config_dir,
    config_file_path, init_config, load_config, load_config_from, save_config, save_config_to,
    validate_webhook_url,
};
pub use error::{ChatSyncError, Result};
pub use types::{ChatMessage, ExtractionResult, Role, SyncId};
