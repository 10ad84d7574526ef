//! DeepSeek (`deepseek.com`) extractor.

use chatsync_shared::{ChatSyncError, Result, Role};
use scraper::{ElementRef, Html};

use crate::title::{TitleSource, resolve_title};
use crate::transcript::{Labels, MessageCollector, Strategy, apology, run_cascade};
use crate::{ChatPlatform, dom};

const LABELS: Labels = Labels {
    header: "DeepSeek Conversation",
    user: "You",
    assistant: "DeepSeek",
};

const TITLE_SOURCES: &[TitleSource] = &[
    TitleSource::DocumentTitle { exclude: "DeepSeek" },
    TitleSource::Selector(".chat-title"),
    TitleSource::Selector(".conversation-title"),
];

const CONTAINERS: &[&str] = &[".chat-messages", ".conversation-container", "main"];

const BODY_SELECTORS: &[&str] = &[".message-content", ".content"];

const STRATEGIES: &[(&str, Strategy)] = &[
    ("message-items", by_item_class),
    ("class-pattern", by_class_pattern),
];

/// DeepSeek chat pages.
pub struct DeepSeekPlatform;

impl ChatPlatform for DeepSeekPlatform {
    fn domains(&self) -> &'static [&'static str] {
        &["deepseek.com"]
    }

    fn name(&self) -> &'static str {
        "deepseek"
    }

    fn display_name(&self) -> &'static str {
        "DeepSeek"
    }

    fn extract_title(&self, doc: &Html, user_title: &str) -> String {
        resolve_title(doc, user_title, TITLE_SOURCES, self.display_name())
    }

    fn extract_content(&self, doc: &Html) -> Result<String> {
        let container = dom::first_of(doc.root_element(), CONTAINERS)
            .ok_or_else(|| ChatSyncError::Extraction("could not find chat messages container".into()))?;

        Ok(match run_cascade(self.name(), doc, container, STRATEGIES) {
            Some(found) => found.render(&LABELS),
            None => apology(self.display_name()),
        })
    }
}

fn role_of(message: ElementRef<'_>) -> Role {
    if dom::has_class(message, "user-message")
        || dom::has_class(message, "user")
        || dom::attr_is(message, "data-role", "user")
    {
        Role::User
    } else {
        Role::Assistant
    }
}

fn collect(found: Vec<ElementRef<'_>>) -> MessageCollector {
    let mut collector = MessageCollector::new();
    for (position, message) in found.into_iter().enumerate() {
        let body = dom::first_of(message, BODY_SELECTORS).unwrap_or(message);
        collector.push(
            role_of(message),
            body,
            position as f64,
            dom::image_sources(message, "img:not(.avatar)"),
        );
    }
    collector
}

fn by_item_class<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    collect(dom::select_all(scope, ".message, .chat-item, .conversation-item"))
}

fn by_class_pattern<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    collect(dom::select_all(scope, r#"div[class*="message"]"#))
}
