//! Claude (`claude.ai`) extractor.

use chatsync_shared::{Result, Role};
use scraper::{ElementRef, Html};

use crate::title::{TitleSource, resolve_title};
use crate::transcript::{Labels, MessageCollector, Strategy, apology, run_cascade};
use crate::{ChatPlatform, dom, xpath};

const LABELS: Labels = Labels {
    header: "Claude Conversation",
    user: "You",
    assistant: "Claude",
};

const TITLE_SOURCES: &[TitleSource] = &[
    TitleSource::XPath("/html/body/div[2]/div/div/header/div[2]/div[1]/div/button/div/div"),
    TitleSource::DocumentTitle { exclude: "Claude" },
    TitleSource::Selector(r#"div[aria-label="conversation history"] button span"#),
    TitleSource::Selector(".conversation-title"),
    TitleSource::Selector("header button div div"),
];

/// Root of the turn list; each turn is a `div[i]` below it.
const IMAGES: &str = r#"img:not([aria-hidden="true"])"#;

const TURNS_XPATH: &str = "/html/body/div[2]/div/div/div/div[1]/div[1]";

/// Highest turn index probed by the positional strategy.
const MAX_TURN_INDEX: usize = 30;

/// General-strategy blocks at or under this length are UI chrome.
const MIN_BLOCK_CHARS: usize = 20;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("structural", by_test_id),
    ("class-pattern", by_class_pattern),
    ("turn-xpath", by_turn_xpath),
    ("text-blocks", by_text_blocks),
];

/// Claude conversation pages.
pub struct ClaudePlatform;

impl ChatPlatform for ClaudePlatform {
    fn domains(&self) -> &'static [&'static str] {
        &["claude.ai"]
    }

    fn name(&self) -> &'static str {
        "claude"
    }

    fn display_name(&self) -> &'static str {
        "Claude"
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

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn by_test_id<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    let mut collector = MessageCollector::new();
    let found = dom::select_all(scope, r#"div[data-testid="user-message"], div.font-claude-message"#);
    for (position, message) in found.into_iter().enumerate() {
        let role = if dom::attr_is(message, "data-testid", "user-message") {
            Role::User
        } else {
            Role::Assistant
        };
        collector.push(role, message, position as f64, dom::image_sources(message, IMAGES));
    }
    collector
}

fn by_class_pattern<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    let mut collector = MessageCollector::new();
    let found = dom::select_all(
        scope,
        r#"div[class*="message-container"], div[class*="Message"], div[class*="chat-message"]"#,
    );
    for (position, message) in found.into_iter().enumerate() {
        let is_user = dom::has_class(message, "user-message")
            || dom::has_descendant(message, r#"div[class*="UserMessage"]"#)
            || dom::attr_is(message, "data-author", "user")
            || dom::attr_is(message, "data-role", "user");
        let role = if is_user { Role::User } else { Role::Assistant };
        collector.push(role, message, position as f64, dom::image_sources(message, IMAGES));
    }
    collector
}

/// XPath of turn `index` (1-based). Odd turns are the user's, even turns Claude's.
fn turn_xpath(index: usize) -> String {
    match Role::alternating(index) {
        Role::User => format!("{TURNS_XPATH}/div[{index}]/div/div/div[1]/div[2]"),
        Role::Assistant => format!("{TURNS_XPATH}/div[{index}]/div/div/div[1]"),
    }
}

/// Probe turns by absolute position, stopping at the first gap.
fn by_turn_xpath<'a>(doc: &'a Html, _scope: ElementRef<'a>) -> MessageCollector {
    let mut collector = MessageCollector::new();
    for index in 1..=MAX_TURN_INDEX {
        let Some(turn) = xpath::select_first(doc, &turn_xpath(index)) else {
            break;
        };
        collector.push(Role::alternating(index), turn, index as f64, Vec::new());
    }
    collector
}

/// Last resort: long text blocks in the conversation area, roles alternating.
fn by_text_blocks<'a>(_doc: &'a Html, scope: ElementRef<'a>) -> MessageCollector {
    let mut collector = MessageCollector::with_min_chars(MIN_BLOCK_CHARS);
    let Some(container) = dom::select_first(scope, r#"div[class*="ConversationContent"], main"#) else {
        return collector;
    };

    let blocks = dom::select_all(
        container,
        r#"div[class*="content"], div[class*="text"], div > p, div > div > div > div"#,
    );
    for (position, block) in blocks.into_iter().enumerate() {
        let role = Role::alternating(collector.len() + 1);
        collector.push(role, block, position as f64, Vec::new());
    }
    collector
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> String {
        ClaudePlatform.extract_content(&Html::parse_document(html)).unwrap()
    }

    #[test]
    fn structural_messages() {
        let md = extract(
            r#"<div>
                <div data-testid="user-message"><p>Explain borrowing</p></div>
                <div class="font-claude-message"><p>Borrowing lends access.</p></div>
            </div>"#,
        );
        assert_eq!(
            md,
            "# Claude Conversation\n\n### 👤 You\nExplain borrowing\n\n---\n\n### 🤖 Claude\nBorrowing lends access."
        );
    }

    #[test]
    fn decorative_icons_are_not_images() {
        let md = extract(
            r#"<div>
                <div data-testid="user-message"><p>See attached</p>
                    <img aria-hidden="true" src="https://claude.ai/icons/copy.png">
                    <img src="https://files.example.com/plot.png">
                </div>
            </div>"#,
        );
        assert!(md.ends_with("See attached\n\n![Image](https://files.example.com/plot.png)"));
        assert!(!md.contains("copy.png"));
    }

    #[test]
    fn class_pattern_roles() {
        let md = extract(
            r#"<div class="chat-message" data-author="user">hey</div>
               <div class="chat-message">hello back</div>"#,
        );
        assert!(md.contains("### 👤 You\nhey\n\n---\n\n### 🤖 Claude\nhello back"));
    }

    #[test]
    fn turn_xpaths_alternate() {
        assert_eq!(
            turn_xpath(1),
            "/html/body/div[2]/div/div/div/div[1]/div[1]/div[1]/div/div/div[1]/div[2]"
        );
        assert_eq!(
            turn_xpath(2),
            "/html/body/div[2]/div/div/div/div[1]/div[1]/div[2]/div/div/div[1]"
        );
        assert!(turn_xpath(3).ends_with("/div[3]/div/div/div[1]/div[2]"));
    }

    #[test]
    fn turn_xpath_strategy_stops_at_gap() {
        let turn = |text: &str, user: bool| {
            if user {
                format!("<div><div><div><div><div>avatar</div><div>{text}</div></div></div></div></div>")
            } else {
                format!("<div><div><div><div>{text}</div></div></div></div>")
            }
        };
        let html = format!(
            "<html><body><div>nav</div><div><div><div><div><div><div>{}{}{}</div></div></div></div></div></div></body></html>",
            turn("first question", true),
            turn("first answer", false),
            turn("second question", true),
        );
        let doc = Html::parse_document(&html);
        let found = by_turn_xpath(&doc, doc.root_element());
        assert_eq!(found.len(), 3);
        let md = found.render(&LABELS);
        assert!(md.contains("### 👤 You\nfirst question"));
        assert!(md.contains("### 🤖 Claude\nfirst answer"));
        assert!(md.ends_with("### 👤 You\nsecond question"));
    }

    #[test]
    fn text_blocks_skip_short_chrome() {
        let md = extract(
            r#"<main><div>
                <p>Copy</p>
                <p>How do I read a file line by line?</p>
                <p>Use BufReader::lines on an opened File.</p>
            </div></main>"#,
        );
        assert!(md.contains("### 👤 You\nHow do I read a file line by line?"));
        assert!(md.contains("### 🤖 Claude\nUse BufReader::lines on an opened File."));
        assert!(!md.contains("Copy"));
    }

    #[test]
    fn nothing_found_is_apology() {
        let md = extract("<html><body><nav>menu</nav></body></html>");
        assert_eq!(
            md,
            "Could not extract chat content from Claude. Try selecting and copying the content manually."
        );
    }
}
