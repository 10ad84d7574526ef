//! Chat platform extractors for chatsync.
//!
//! Each supported web app (ChatGPT, Claude, Kimi, DeepSeek) implements
//! [`ChatPlatform`]: URL matching, title resolution, and a cascade of message
//! extraction strategies over a parsed [`PageSnapshot`]. The
//! [`PlatformRegistry`] picks the platform for a URL.

mod claude;
mod deepseek;
mod dom;
mod kimi;
mod openai;
mod page;
mod registry;
mod title;
mod transcript;
mod xpath;

use chatsync_shared::{ChatSyncError, ExtractionResult, Result};
use scraper::Html;
use tracing::{info, instrument};

pub use claude::ClaudePlatform;
pub use deepseek::DeepSeekPlatform;
pub use kimi::KimiPlatform;
pub use openai::OpenAiPlatform;
pub use page::PageSnapshot;
pub use registry::PlatformRegistry;
pub use transcript::{APOLOGY_PREFIX, apology, is_apology};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One supported chat web application.
///
/// Platforms are tried in registry order; the first whose [`matches`]
/// accepts the page URL handles it.
///
/// [`matches`]: ChatPlatform::matches
pub trait ChatPlatform: Send + Sync {
    /// Host fragments identifying this platform's pages.
    fn domains(&self) -> &'static [&'static str];

    /// Whether this platform handles `url` (substring test on [`domains`](Self::domains)).
    fn matches(&self, url: &str) -> bool {
        self.domains().iter().any(|d| url.contains(d))
    }

    /// Stable identifier used in tags and messages (`openai`, `claude`, ...).
    fn name(&self) -> &'static str;

    /// Human-readable brand name used in fallback titles and apologies.
    fn display_name(&self) -> &'static str;

    /// Conversation title: `user_title` when non-blank, else what the page shows.
    fn extract_title(&self, doc: &Html, user_title: &str) -> String;

    /// The transcript as Markdown, or the apology text when no message was found.
    ///
    /// Fails only when the page lacks the container the platform requires.
    fn extract_content(&self, doc: &Html) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Resolve the platform for `page` and extract its title and transcript.
#[instrument(skip_all, fields(url = %page.url()))]
pub fn extract_conversation(
    registry: &PlatformRegistry,
    page: &PageSnapshot,
    user_title: Option<&str>,
) -> Result<ExtractionResult> {
    let platform = registry
        .detect(page.url())
        .ok_or_else(|| ChatSyncError::UnsupportedPlatform {
            url: page.url().to_string(),
        })?;

    let doc = Html::parse_document(page.html());
    let title = platform.extract_title(&doc, user_title.unwrap_or_default());
    let markdown = platform.extract_content(&doc)?;

    info!(
        platform = platform.name(),
        title = %title,
        chars = markdown.chars().count(),
        apology = is_apology(&markdown),
        "extracted conversation"
    );

    Ok(ExtractionResult {
        platform: platform.name().to_string(),
        title,
        markdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> String {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/html")
            .join(name);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
    }

    fn extract(url: &str, fixture_name: &str, user_title: Option<&str>) -> ExtractionResult {
        let page = PageSnapshot::new(url, fixture(fixture_name)).unwrap();
        extract_conversation(&PlatformRegistry::new(), &page, user_title).unwrap()
    }

    #[test]
    fn two_message_page_yields_two_blocks_in_order() {
        let page = PageSnapshot::new(
            "https://chatgpt.com/c/42",
            r#"<html><body><main><div class="thread">
                <div data-message-author-role="user"><div class="markdown"><p>What is 2+2?</p></div></div>
                <div data-message-author-role="assistant"><div class="markdown"><p>It is <strong>4</strong>.</p></div></div>
            </div></main></body></html>"#,
        )
        .unwrap();
        let result = extract_conversation(&PlatformRegistry::new(), &page, None).unwrap();

        let body = result
            .markdown
            .strip_prefix("# ChatGPT Conversation\n\n")
            .expect("header first");
        let blocks: Vec<&str> = body.split("\n\n---\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], "### 👤 You\nWhat is 2+2?");
        assert_eq!(blocks[1], "### 🤖 ChatGPT\nIt is **4**.");
        assert_eq!(result.platform, "openai");
        assert_eq!(result.title, "ChatGPT Conversation");
    }

    #[test]
    fn unsupported_url_is_error() {
        let page = PageSnapshot::new("https://example.com/chat", "<html></html>").unwrap();
        let err = extract_conversation(&PlatformRegistry::new(), &page, None).unwrap_err();
        assert!(matches!(err, ChatSyncError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn chatgpt_fixture() {
        let result = extract("https://chatgpt.com/c/abc", "chatgpt.html", None);
        assert_eq!(result.title, "Borrow checker basics");
        assert!(result.markdown.starts_with("# ChatGPT Conversation\n\n### 👤 You\n"));
        assert!(result.markdown.contains("```rust\nfn longest<'a>(x: &'a str, y: &'a str) -> &'a str {"));
        assert!(result.markdown.contains("![Image](https://files.example.com/diagram.png)"));
        assert_eq!(result.markdown.matches("\n\n---\n\n").count(), 3);
    }

    #[test]
    fn claude_fixture_with_user_title() {
        let result = extract("https://claude.ai/chat/123", "claude.html", Some("My notes"));
        assert_eq!(result.title, "My notes");
        assert!(result.markdown.starts_with("# Claude Conversation\n\n### 👤 You\n"));
        assert!(result.markdown.contains("### 🤖 Claude\n"));
        assert!(result.markdown.contains("- Ownership"));
    }

    #[test]
    fn claude_fixture_title_from_header() {
        let result = extract("https://claude.ai/chat/123", "claude.html", None);
        assert_eq!(result.title, "Ownership in Rust");
    }

    #[test]
    fn kimi_fixture_orders_by_offset() {
        let result = extract("https://kimi.moonshot.cn/chat/1", "kimi.html", None);
        assert_eq!(result.title, "Weekend plans");
        let first_user = result.markdown.find("Suggest a weekend hike").expect("user message");
        let reply = result.markdown.find("Try the ridge trail").expect("assistant reply");
        assert!(first_user < reply);
        assert!(result.markdown.starts_with("# Kimi Chat Conversation\n\n### 👤 User\n"));
    }

    #[test]
    fn deepseek_fixture() {
        let result = extract("https://chat.deepseek.com/a/chat/s/1", "deepseek.html", None);
        assert_eq!(result.title, "Tokio channels");
        assert!(result.markdown.starts_with("# DeepSeek Conversation\n\n### 👤 You\n"));
        assert!(result.markdown.contains("### 🤖 DeepSeek\n"));
        assert!(!result.markdown.contains("avatar"));
    }
}
