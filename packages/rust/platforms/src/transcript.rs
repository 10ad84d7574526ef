//! Message collection and Markdown assembly shared by all extractors.
//!
//! An extractor walks its cascade of strategies; each strategy fills a
//! [`MessageCollector`]. The first non-empty collector is rendered into the
//! final transcript document.

use std::collections::HashSet;

use chatsync_shared::{ChatMessage, Role};
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::dom;

/// Leading text of every "nothing found" answer.
pub const APOLOGY_PREFIX: &str = "Could not extract chat content from";

/// The fallback content returned when a page yields no messages.
pub fn apology(display_name: &str) -> String {
    format!("{APOLOGY_PREFIX} {display_name}. Try selecting and copying the content manually.")
}

/// Whether `content` is an apology rather than a transcript.
pub fn is_apology(content: &str) -> bool {
    content.trim_start().starts_with("Could not extract")
}

/// Header and role labels of one platform's transcript.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Labels {
    pub header: &'static str,
    pub user: &'static str,
    pub assistant: &'static str,
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Accumulates accepted messages for one strategy run.
#[derive(Debug, Default)]
pub(crate) struct MessageCollector {
    min_chars: usize,
    seen: HashSet<String>,
    messages: Vec<ChatMessage>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject message texts of `min_chars` characters or fewer.
    pub fn with_min_chars(min_chars: usize) -> Self {
        Self {
            min_chars,
            ..Self::default()
        }
    }

    /// Offer a message body. Returns `true` if it was accepted.
    ///
    /// Empty bodies, bodies at or under the length floor and bodies whose
    /// trimmed text equals an already accepted one are dropped.
    pub fn push(&mut self, role: Role, body: ElementRef<'_>, order_key: f64, images: Vec<String>) -> bool {
        let text = dom::text_of(body);
        if text.is_empty() && images.is_empty() {
            return false;
        }
        if self.min_chars > 0 && text.chars().count() <= self.min_chars {
            return false;
        }
        if !text.is_empty() && !self.seen.insert(text) {
            return false;
        }
        self.messages.push(ChatMessage {
            role,
            body_html: body.inner_html(),
            order_key,
            images,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Assemble the transcript document, sorted by reading order.
    pub fn render(mut self, labels: &Labels) -> String {
        self.messages.sort_by(|a, b| a.order_key.total_cmp(&b.order_key));

        let blocks: Vec<String> = self
            .messages
            .iter()
            .map(|msg| render_block(msg, labels))
            .collect();

        format!("# {}\n\n{}", labels.header, blocks.join("\n\n---\n\n"))
    }
}

fn render_block(msg: &ChatMessage, labels: &Labels) -> String {
    let marker = match msg.role {
        Role::User => format!("### 👤 {}", labels.user),
        Role::Assistant => format!("### 🤖 {}", labels.assistant),
    };

    let body = chatsync_markdown::normalize(&msg.body_html);
    let parts: Vec<String> = std::iter::once(body)
        .filter(|b| !b.is_empty())
        .chain(msg.images.iter().map(|src| format!("![Image]({src})")))
        .collect();

    format!("{marker}\n{}", parts.join("\n\n"))
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// One extraction strategy: walk `scope` and collect what it recognizes.
pub(crate) type Strategy = for<'a> fn(&'a Html, ElementRef<'a>) -> MessageCollector;

/// Try each strategy in order and keep the first that found messages.
pub(crate) fn run_cascade<'a>(
    platform: &str,
    doc: &'a Html,
    scope: ElementRef<'a>,
    strategies: &[(&str, Strategy)],
) -> Option<MessageCollector> {
    for (name, strategy) in strategies {
        let found = strategy(doc, scope);
        debug!(platform, strategy = name, messages = found.len(), "strategy finished");
        if !found.is_empty() {
            return Some(found);
        }
    }
    None
}
