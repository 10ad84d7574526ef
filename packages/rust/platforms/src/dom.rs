//! Selector, text and layout helpers shared by the platform extractors.
//!
//! Snapshots carry no layout engine. Vertical offsets and horizontal
//! positions come from optional annotations a capture tool may add
//! (`data-offset-top`, `data-offset-left`, `data-offset-width`, and
//! `data-viewport-width` on `<html>`) or from inline styles.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::warn;

/// Parse a CSS selector, logging instead of panicking on a bad one.
fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!(selector = css, error = %e, "invalid selector");
            None
        }
    }
}

/// All descendants of `scope` matching `css`, in document order.
pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    let Some(sel) = parse_selector(css) else {
        return Vec::new();
    };
    scope
        .select(&sel)
        .filter(|el| el.id() != scope.id())
        .collect()
}

/// First descendant of `scope` matching `css` in document order
/// (`querySelector` semantics, including comma-separated lists).
pub(crate) fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    select_all(scope, css).into_iter().next()
}

/// Try each selector in priority order and return the first hit.
pub(crate) fn first_of<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|css| select_first(scope, css))
}

/// Whether `el` has at least one descendant matching `css`.
pub(crate) fn has_descendant(el: ElementRef<'_>, css: &str) -> bool {
    select_first(el, css).is_some()
}

/// Trimmed text content of an element.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub(crate) fn attr_is(el: ElementRef<'_>, name: &str, value: &str) -> bool {
    el.value().attr(name) == Some(value)
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Image sources under `el` matching `css`, minus inline SVG and avatars.
pub(crate) fn image_sources(el: ElementRef<'_>, css: &str) -> Vec<String> {
    select_all(el, css)
        .into_iter()
        .filter(|img| !has_class(*img, "avatar"))
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .filter(|src| !src.contains("data:image/svg+xml") && !src.contains("avatar"))
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Layout hints
// ---------------------------------------------------------------------------

fn numeric_attr(el: ElementRef<'_>, name: &str) -> Option<f64> {
    el.value().attr(name)?.trim().trim_end_matches("px").parse().ok()
}

/// Compact, lowercase inline style (`text-align:right;...`).
fn inline_style(el: ElementRef<'_>) -> String {
    el.value()
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Vertical page offset of `el`, when the snapshot records one.
pub(crate) fn vertical_offset(el: ElementRef<'_>) -> Option<f64> {
    static TOP_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?:^|;)top:(-?\d+(?:\.\d+)?)px").expect("valid regex")
    });

    numeric_attr(el, "data-offset-top").or_else(|| {
        TOP_RE
            .captures(&inline_style(el))
            .and_then(|c| c[1].parse().ok())
    })
}

/// Reading-order key: vertical offset when known, else document position.
pub(crate) fn order_key(el: ElementRef<'_>, position: usize) -> f64 {
    vertical_offset(el).unwrap_or(position as f64)
}

/// Side-alignment heuristic for layouts that put the user's bubbles on the right.
pub(crate) fn is_right_aligned(el: ElementRef<'_>) -> bool {
    let style = inline_style(el);
    has_class(el, "right")
        || has_class(el, "user")
        || style.contains("text-align:right")
        || style.contains("align-self:flex-end")
}

/// Whether the element's right edge lies past the middle of the viewport.
///
/// Needs `data-offset-left` + `data-offset-width` on the element and
/// `data-viewport-width` on the document root; false otherwise.
pub(crate) fn right_edge_past_midpoint(el: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    let (Some(left), Some(width), Some(viewport)) = (
        numeric_attr(el, "data-offset-left"),
        numeric_attr(el, "data-offset-width"),
        numeric_attr(root, "data-viewport-width"),
    ) else {
        return false;
    };
    left + width > viewport / 2.0
}
