//! ChatGPT (`chat.openai.com`, `chatgpt.com`) extractor.

use chatsync_shared::{ChatSyncError, Result, Role};
use scraper::{ElementRef, Html};

use crate::title::{TitleSource, resolve_title};
use crate::transcript::{Labels, MessageCollector, Strategy, apology, run_cascade};
use crate::{ChatPlatform, dom, xpath};

const LABELS: Labels = Labels {
    header: "ChatGPT Conversation",
    user: "You",
    assistant: "ChatGPT",
};

const TITLE_SOURCES: &[TitleSource] = &[
    TitleSource::DocumentTitle { exclude: "ChatGPT" },
    TitleSource::Selector("nav a.flex h3"),
];

const THREAD_CONTAINERS: &[&str] = &[
    r#"main div[class*="thread"]"#,
    "main div div div:nth-child(2)",
    "main",
];

const BODY_SELECTORS: &[&str] = &[
    r#"div[data-message-text-content="true"]"#,
    ".markdown",
    ".content",
];

const IMAGES: &str = r#"img:not([aria-hidden="true"])"#;

const FIRST_ARTICLE_XPATH: &str =
    "/html/body/div[1]/div/div[1]/div[2]/main/div[1]/div/div[2]/div/div/div[2]/article[1]";

const STRATEGIES: &[(&str, Strategy)] = &[
    ("author-role", by_author_role),
    ("article", by_article),
    ("article-xpath", by_article_xpath),
];

/// ChatGPT conversation pages.
pub struct OpenAiPlatform;

impl ChatPlatform for OpenAiPlatform {
    fn domains(&self) -> &'static [&'static str] {
        &["chat.openai.com", "chatgpt.com"]
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "ChatGPT"
    }

    fn extract_title(&self, doc: &Html, user_title: &str) -> String {
        resolve_title(doc, user_title, TITLE_SOURCES, self.display_name())
    }

    fn extract_content(&self, doc: &Html) -> Result<String> {
        let container = dom::first_of(doc.root_element(), THREAD_CONTAINERS)
            .ok_or_else(|| ChatSyncError::Extraction("could not find chat thread container".into()))?;

        Ok(match run_cascade(self.name(), doc, container, STRATEGIES) {
            Some(found) => found.render(&LABELS),
            None => apology(self.display_name()),
        })
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn body_of(message: ElementRef<'_>) -> ElementRef<'_> {
    dom::first_of(message, BODY_SELECTORS).unwrap_or(message)
}

fn collect(found: &[ElementRef<'_>], role_of: impl Fn(ElementRef<'_>) -> Role) -> MessageCollector {
    let mut collector = MessageCollector::new();
    for (position, &message) in found.iter().enumerate() {
        collector.push(
            role_of(message),
            body_of(message),
            position as f64,
            dom::image_sources(message, IMAGES),
        );
    }
    collector
}

fn by_author_role<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    let found = dom::select_all(scope, "div[data-message-author-role]");
    collect(&found, |message| {
        if dom::attr_is(message, "data-message-author-role", "user") {
            Role::User
        } else {
            Role::Assistant
        }
    })
}

fn by_article<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    let mut found = dom::select_all(scope, "article");
    if found.is_empty() {
        found = dom::select_all(scope, ".message");
    }
    collect(&found, |message| {
        if dom::has_class(message, "user")
            || dom::has_descendant(message, ".user-avatar")
            || dom::has_descendant(message, "[data-user-message]")
        {
            Role::User
        } else {
            Role::Assistant
        }
    })
}

/// The first article at its absolute page position, then its element siblings.
fn by_article_xpath<'a>(doc: &'a Html, _scope: ElementRef<'a>) -> MessageCollector {
    let mut collector = MessageCollector::new();
    let Some(first) = xpath::select_first(doc, FIRST_ARTICLE_XPATH) else {
        return collector;
    };

    let articles = std::iter::once(first).chain(first.next_siblings().filter_map(ElementRef::wrap));
    for (index, article) in articles.enumerate() {
        let position = index + 1;
        collector.push(
            Role::alternating(position),
            article,
            position as f64,
            dom::image_sources(article, IMAGES),
        );
    }
    collector
}
