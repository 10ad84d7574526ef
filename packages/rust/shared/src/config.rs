//! Application configuration for chatsync.
//!
//! User config lives at `~/.chatsync/chatsync.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChatSyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "chatsync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".chatsync";

/// Tag prefix used when none is configured.
pub const DEFAULT_TAG_PREFIX: &str = "#ai-chat";

/// Webhook URL prefixes accepted by Flomo.
pub const WEBHOOK_PREFIXES: [&str; 2] = ["https://flomoapp.com/iwh/", "https://v.flomoapp.com/jwh/"];

// ---------------------------------------------------------------------------
// Config structs (matching chatsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Flomo sink settings.
    #[serde(default)]
    pub flomo: FlomoConfig,
}

/// `[flomo]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlomoConfig {
    /// Incoming-webhook URL of the user's Flomo account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// First segment of every tag path.
    #[serde(default = "default_tag")]
    pub default_tag: String,
}

impl Default for FlomoConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            default_tag: default_tag(),
        }
    }
}

fn default_tag() -> String {
    DEFAULT_TAG_PREFIX.into()
}

// ---------------------------------------------------------------------------
// Extension config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime sync configuration, merged from the config file and CLI flags.
///
/// Read once when a coordinator starts and never mutated by the core.
#[derive(Debug, Clone, Default)]
pub struct ExtensionConfig {
    /// Flomo webhook endpoint, if configured.
    pub webhook_url: Option<String>,
    /// Tag prefix; an empty value falls back to [`DEFAULT_TAG_PREFIX`].
    pub default_tag: String,
}

impl From<&AppConfig> for ExtensionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            webhook_url: config.flomo.webhook_url.clone(),
            default_tag: config.flomo.default_tag.clone(),
        }
    }
}

impl ExtensionConfig {
    /// Apply CLI/env overrides on top of the file values.
    pub fn with_overrides(mut self, webhook_url: Option<String>, default_tag: Option<String>) -> Self {
        if let Some(url) = webhook_url.filter(|u| !u.trim().is_empty()) {
            self.webhook_url = Some(url.trim().to_string());
        }
        if let Some(tag) = default_tag {
            self.default_tag = tag.trim().to_string();
        }
        self
    }

    /// The tag prefix to use for delivery.
    pub fn tag_prefix(&self) -> &str {
        if self.default_tag.trim().is_empty() {
            DEFAULT_TAG_PREFIX
        } else {
            self.default_tag.trim()
        }
    }

    /// Return the validated webhook URL, or a config error when it is absent or malformed.
    pub fn require_webhook(&self) -> Result<&str> {
        let url = self
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ChatSyncError::config(
                    "Flomo webhook not configured. Run `chatsync config set --webhook-url <URL>` \
                     or set FLOMO_WEBHOOK_URL.",
                )
            })?;
        validate_webhook_url(url)?;
        Ok(url)
    }
}

/// Check that a webhook URL starts with one of the known Flomo prefixes.
pub fn validate_webhook_url(url: &str) -> Result<()> {
    if WEBHOOK_PREFIXES.iter().any(|prefix| url.starts_with(prefix)) {
        Ok(())
    } else {
        Err(ChatSyncError::config(format!(
            "Invalid Flomo webhook URL format: {url}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.chatsync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ChatSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.chatsync/chatsync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ChatSyncError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ChatSyncError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write `config` to `path`, creating parent directories as needed.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ChatSyncError::io(dir, e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| ChatSyncError::config(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| ChatSyncError::io(path, e))
}

/// Write `config` to the default config file location.
pub fn save_config(config: &AppConfig) -> Result<PathBuf> {
    let path = config_file_path()?;
    save_config_to(config, &path)?;
    tracing::info!(?path, "saved config file");
    Ok(path)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    save_config_to(&AppConfig::default(), &path)?;
    tracing::info!(?path, "created default config file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("default_tag"));
        assert!(toml_str.contains("#ai-chat"));
        assert!(!toml_str.contains("webhook_url"));
    }

    #[test]
    fn config_with_webhook() {
        let toml_str = r##"
[flomo]
webhook_url = "https://flomoapp.com/iwh/abc/def/"
default_tag = "#notes"
"##;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let ext = ExtensionConfig::from(&config);
        assert_eq!(ext.require_webhook().unwrap(), "https://flomoapp.com/iwh/abc/def/");
        assert_eq!(ext.tag_prefix(), "#notes");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert!(config.flomo.webhook_url.is_none());
        assert_eq!(config.flomo.default_tag, DEFAULT_TAG_PREFIX);
    }

    #[test]
    fn missing_webhook_is_config_error() {
        let ext = ExtensionConfig::default();
        let err = ext.require_webhook().unwrap_err();
        assert!(matches!(err, ChatSyncError::Config { .. }));
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn webhook_prefix_validation() {
        assert!(validate_webhook_url("https://flomoapp.com/iwh/x/y/").is_ok());
        assert!(validate_webhook_url("https://v.flomoapp.com/jwh/x/").is_ok());
        assert!(validate_webhook_url("https://evil.example.com/iwh/").is_err());
        assert!(validate_webhook_url("http://flomoapp.com/iwh/x").is_err());
    }

    #[test]
    fn blank_tag_falls_back_to_default() {
        let ext = ExtensionConfig {
            webhook_url: None,
            default_tag: "  ".into(),
        };
        assert_eq!(ext.tag_prefix(), "#ai-chat");
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut app = AppConfig::default();
        app.flomo.webhook_url = Some("https://flomoapp.com/iwh/file/".into());
        let ext = ExtensionConfig::from(&app).with_overrides(
            Some("https://v.flomoapp.com/jwh/flag/".into()),
            Some("#flag".into()),
        );
        assert_eq!(ext.webhook_url.as_deref(), Some("https://v.flomoapp.com/jwh/flag/"));
        assert_eq!(ext.tag_prefix(), "#flag");
    }

    #[test]
    fn save_then_load_keeps_webhook() {
        let dir = std::env::temp_dir().join(format!("chatsync-config-{}", uuid::Uuid::now_v7()));
        let path = dir.join(CONFIG_FILE_NAME);
        let mut config = AppConfig::default();
        config.flomo.webhook_url = Some("https://flomoapp.com/iwh/a/b/".into());

        save_config_to(&config, &path).expect("save");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.flomo.webhook_url, config.flomo.webhook_url);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
