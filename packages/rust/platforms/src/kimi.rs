//! Kimi (`kimi.moonshot.cn`, `kimi.com`) extractor.
//!
//! Kimi renders turns as "segments". Older layouts only distinguish the two
//! sides visually, so the fallbacks classify roles by alignment. Messages are
//! always emitted in vertical page order.

use chatsync_shared::{Result, Role};
use scraper::{ElementRef, Html};

use crate::title::{TitleSource, resolve_title};
use crate::transcript::{Labels, MessageCollector, Strategy, apology, run_cascade};
use crate::{ChatPlatform, dom, xpath};

const LABELS: Labels = Labels {
    header: "Kimi Chat Conversation",
    user: "User",
    assistant: "Kimi",
};

const TITLE_SOURCES: &[TitleSource] = &[
    TitleSource::XPath("/html/body/div[1]/div/div/div[2]/div/div/div/div[1]/div[1]/header/h2"),
    TitleSource::DocumentTitle { exclude: "Kimi" },
    TitleSource::Selector(".conversation-item.active .conversation-item-title"),
];

const SEGMENTS: &str = ".segment.segment-assistant, .segment.segment-user";
const SEGMENTS_XPATH: &str = "/html/body/div[1]/div/div/div[2]/div/div/div/div[1]/div[2]/div/div";

/// Texts this short are icons and counters, not messages.
const MIN_TEXT_CHARS: usize = 2;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("segments", by_segment_class),
    ("chat-container", by_chat_container),
    ("segments-xpath", by_segment_xpath),
    ("chat-children", by_chat_children),
];

/// Kimi conversation pages.
pub struct KimiPlatform;

impl ChatPlatform for KimiPlatform {
    fn domains(&self) -> &'static [&'static str] {
        &["kimi.moonshot.cn", "kimi.com"]
    }

    fn name(&self) -> &'static str {
        "kimi"
    }

    fn display_name(&self) -> &'static str {
        "Kimi"
    }

    fn extract_title(&self, doc: &Html, user_title: &str) -> String {
        resolve_title(doc, user_title, TITLE_SOURCES, self.display_name())
    }

    fn extract_content(&self, doc: &Html) -> Result<String> {
        Ok(match run_cascade(self.name(), doc, doc.root_element(), STRATEGIES) {
            Some(found) => found.render(&LABELS),
            None => apology(self.display_name()),
        })
    }
}

fn segment_role(segment: ElementRef<'_>) -> Option<Role> {
    if dom::has_class(segment, "segment-user") {
        Some(Role::User)
    } else if dom::has_class(segment, "segment-assistant") {
        Some(Role::Assistant)
    } else {
        None
    }
}

fn push_segments(segments: Vec<ElementRef<'_>>) -> MessageCollector {
    let mut collector = MessageCollector::with_min_chars(MIN_TEXT_CHARS);
    for (position, segment) in segments.into_iter().enumerate() {
        if let Some(role) = segment_role(segment) {
            collector.push(role, segment, dom::order_key(segment, position), Vec::new());
        }
    }
    collector
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn by_segment_class<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    push_segments(dom::select_all(scope, SEGMENTS))
}

fn by_chat_container<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    let mut collector = MessageCollector::with_min_chars(MIN_TEXT_CHARS);
    let Some(container) = dom::select_first(
        scope,
        r#".chat-container, .message-list, .conversation, [class*="conversation"], [class*="chat-list"]"#,
    ) else {
        return collector;
    };

    let blocks = dom::select_all(
        container,
        r#"div[class*="message"], div[class*="chat"], div > div > div[class]"#,
    );
    for (position, block) in blocks.into_iter().enumerate() {
        if dom::has_descendant(block, "button, input, textarea") {
            continue;
        }
        let role = if dom::is_right_aligned(block) {
            Role::User
        } else {
            Role::Assistant
        };
        collector.push(role, block, dom::order_key(block, position), Vec::new());
    }
    collector
}

fn by_segment_xpath<'a>(doc: &'a Html, _scope: ElementRef<'a>) -> MessageCollector {
    push_segments(xpath::select_all(doc, SEGMENTS_XPATH))
}

fn by_chat_children<'a>(doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    let mut collector = MessageCollector::with_min_chars(MIN_TEXT_CHARS);
    let root = doc.root_element();
    let nodes = dom::select_all(scope, r#"div[class*="chat"] > div, div[class*="message"] > div"#);
    for (position, node) in nodes.into_iter().enumerate() {
        let role = if dom::right_edge_past_midpoint(node, root) {
            Role::User
        } else {
            Role::Assistant
        };
        collector.push(role, node, dom::order_key(node, position), Vec::new());
    }
    collector
}
