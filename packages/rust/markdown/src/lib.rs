//! HTML-fragment-to-Markdown normalization for chat message bodies.
//!
//! [`normalize`] applies a fixed, ordered series of substitution passes to a
//! message's inner HTML and returns plain Markdown. Code blocks are lifted out
//! first and restored last so that no later pass can touch their contents.

mod cleanup;

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

/// Marks a shielded code block inside the working text.
const CODE_SENTINEL: char = '\u{E000}';

/// Convert a chat message HTML fragment to Markdown.
///
/// Passes, in order:
/// 1. `<pre>` code blocks become fenced blocks (language from `language-<id>`)
/// 2. `<br>` becomes a newline
/// 3. `<p>` is dropped, `</p>` becomes a blank line
/// 4. `<li>` becomes `- `, list item and list container ends become newlines
/// 5. bold / italic / inline code become `**x**` / `*x*` / `` `x` ``
/// 6. every remaining tag is stripped
///
/// Entities are decoded and whitespace tidied before code blocks are restored.
/// Inline formatting is matched one level deep and non-greedily; nested
/// formatting is not guaranteed to come out right.
pub fn normalize(html: &str) -> String {
    let mut blocks = Vec::new();

    // The sentinel must only ever come from shielding.
    let html = html.replace(CODE_SENTINEL, "");
    let mut md = shield_code_blocks(&html, &mut blocks);
    md = convert_line_breaks(&md);
    md = convert_paragraphs(&md);
    md = convert_lists(&md);
    md = convert_inline_formatting(&md);
    md = strip_tags(&md);
    md = cleanup::decode_entities(&md);
    md = cleanup::normalize_whitespace(&md);
    md = cleanup::clean_blank_lines(&md);
    md = restore_code_blocks(&md, &blocks);

    let out = md.trim().to_string();
    trace!(in_len = html.len(), out_len = out.len(), code_blocks = blocks.len(), "normalized fragment");
    out
}

// ---------------------------------------------------------------------------
// Pass 1: Code blocks
// ---------------------------------------------------------------------------

/// Replace each `<pre>` block with a sentinel and store its fenced rendition.
fn shield_code_blocks(html: &str, blocks: &mut Vec<String>) -> String {
    static PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<pre\b([^>]*)>(.*?)</pre\s*>").expect("valid regex")
    });
    static CODE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<code\b([^>]*)>").expect("valid regex")
    });

    PRE_RE
        .replace_all(html, |caps: &Captures| {
            let pre_attrs = &caps[1];
            let inner = &caps[2];

            let code_attrs = CODE_OPEN_RE
                .captures(inner)
                .map(|c| c[1].to_string())
                .unwrap_or_default();
            let language = detect_language(&code_attrs)
                .or_else(|| detect_language(pre_attrs))
                .unwrap_or_default();

            let code = cleanup::decode_entities(&strip_tags(inner));
            let code = code.trim_end_matches(['\n', '\r']).trim_start_matches(['\n', '\r']);

            blocks.push(format!("```{language}\n{code}\n```"));
            format!("\n{CODE_SENTINEL}{}{CODE_SENTINEL}\n", blocks.len() - 1)
        })
        .to_string()
}

/// Pull a language hint out of an element's attribute string.
///
/// Recognizes `class="language-<id>"` and `data-language="<id>"`.
fn detect_language(attrs: &str) -> Option<String> {
    static CLASS_LANG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"language-([\w+#.-]+)").expect("valid regex")
    });
    static DATA_LANG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"data-language\s*=\s*["']([\w+#.-]+)["']"#).expect("valid regex")
    });

    CLASS_LANG_RE
        .captures(attrs)
        .or_else(|| DATA_LANG_RE.captures(attrs))
        .map(|c| c[1].to_string())
}

/// Put the fenced blocks back in place of their sentinels.
fn restore_code_blocks(md: &str, blocks: &[String]) -> String {
    static SENTINEL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new("\u{E000}(\\d+)\u{E000}").expect("valid regex")
    });

    SENTINEL_RE
        .replace_all(md, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| blocks.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Passes 2-4: Block structure
// ---------------------------------------------------------------------------

fn convert_line_breaks(md: &str) -> String {
    static BR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

    BR_RE.replace_all(md, "\n").to_string()
}

fn convert_paragraphs(md: &str) -> String {
    static P_OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<p\b[^>]*>").expect("valid regex"));
    static P_CLOSE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)</p\s*>").expect("valid regex"));

    let md = P_OPEN_RE.replace_all(md, "");
    P_CLOSE_RE.replace_all(&md, "\n\n").to_string()
}

fn convert_lists(md: &str) -> String {
    static LI_OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<li\b[^>]*>").expect("valid regex"));
    static LI_CLOSE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)</li\s*>").expect("valid regex"));
    static LIST_CLOSE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)</(?:ul|ol)\s*>").expect("valid regex"));

    let md = LI_OPEN_RE.replace_all(md, "- ");
    let md = LI_CLOSE_RE.replace_all(&md, "\n");
    LIST_CLOSE_RE.replace_all(&md, "\n").to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Inline formatting
// ---------------------------------------------------------------------------

fn convert_inline_formatting(md: &str) -> String {
    static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<(strong|b)\b[^>]*>(.*?)</(?:strong|b)\s*>").expect("valid regex")
    });
    static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<(em|i)\b[^>]*>(.*?)</(?:em|i)\s*>").expect("valid regex")
    });
    static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<code\b[^>]*>(.*?)</code\s*>").expect("valid regex")
    });

    let md = BOLD_RE.replace_all(md, "**${2}**");
    let md = ITALIC_RE.replace_all(&md, "*${2}*");
    CODE_RE.replace_all(&md, "`${1}`").to_string()
}

// ---------------------------------------------------------------------------
// Pass 6: Strip tags
// ---------------------------------------------------------------------------

/// Remove every remaining tag, keeping the text between them.
fn strip_tags(md: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    TAG_RE.replace_all(md, "").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
