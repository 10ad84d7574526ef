//! Ordered list of supported chat platforms.

use tracing::debug;

use crate::{ChatPlatform, ClaudePlatform, DeepSeekPlatform, KimiPlatform, OpenAiPlatform};

/// Holds the registered platforms in matching order.
pub struct PlatformRegistry {
    platforms: Vec<Box<dyn ChatPlatform>>,
}

impl PlatformRegistry {
    /// Create a registry with all built-in platforms.
    pub fn new() -> Self {
        Self {
            platforms: vec![
                Box::new(OpenAiPlatform),
                Box::new(ClaudePlatform),
                Box::new(KimiPlatform),
                Box::new(DeepSeekPlatform),
            ],
        }
    }

    /// The first platform whose domains match `url`, if any.
    pub fn detect(&self, url: &str) -> Option<&dyn ChatPlatform> {
        let found = self
            .platforms
            .iter()
            .find(|p| p.matches(url))
            .map(|p| p.as_ref());
        debug!(url, platform = found.map(|p| p.name()), "platform detection");
        found
    }

    /// All platforms, in matching order.
    pub fn platforms(&self) -> impl Iterator<Item = &dyn ChatPlatform> {
        self.platforms.iter().map(|p| p.as_ref())
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
