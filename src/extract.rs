//! Selector-based extraction helpers over `scraper`.
//!
//! Scraped upstreams ship malformed and inconsistent markup, so every helper
//! here is total: a selector that fails to parse or match yields an empty
//! string, empty vec or `None`, never an error. Adapters stack them into
//! ordered fallback chains and only treat transport failures as errors.

use scraper::{ElementRef, Html, Selector};

/// Text of the first element matching `selector`, trimmed. Empty when the
/// selector is invalid or matches nothing.
pub fn first_text(scope: ElementRef<'_>, selector: &str) -> String {
    if let Ok(sel) = Selector::parse(selector) {
        if let Some(el) = scope.select(&sel).next() {
            return el.text().collect::<String>().trim().to_string();
        }
    }
    String::new()
}

/// Trimmed text of every element matching `selector`, in document order.
pub fn all_texts(scope: ElementRef<'_>, selector: &str) -> Vec<String> {
    let mut out = Vec::new();
    if let Ok(sel) = Selector::parse(selector) {
        for el in scope.select(&sel) {
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                out.push(text);
            }
        }
    }
    out
}

/// First non-empty value among `attrs` on the first element matching
/// `selector`. Lazy-loading themes move the real URL into `data-src`, so
/// callers pass `&["src", "data-src"]`.
pub fn first_attr(scope: ElementRef<'_>, selector: &str, attrs: &[&str]) -> String {
    if let Ok(sel) = Selector::parse(selector) {
        if let Some(el) = scope.select(&sel).next() {
            for attr in attrs {
                if let Some(value) = el.value().attr(attr) {
                    if !value.trim().is_empty() {
                        return value.trim().to_string();
                    }
                }
            }
        }
    }
    String::new()
}

/// Inner HTML of the first element matched by an ordered selector list;
/// the first selector producing non-empty markup wins.
pub fn first_inner_html(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for selector in selectors {
        if let Ok(sel) = Selector::parse(selector) {
            if let Some(el) = scope.select(&sel).next() {
                let html = el.inner_html();
                if !html.trim().is_empty() {
                    return Some(html);
                }
            }
        }
    }
    None
}

/// Re-parse an HTML fragment, drop every element matching any of the
/// removal selectors (ads, scripts, trackers) and serialize the remainder.
/// The surrounding markup is preserved as-is.
pub fn strip_elements(fragment: &str, selectors: &[&str]) -> String {
    let banned: Vec<Selector> = selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect();
    let doc = Html::parse_fragment(fragment);
    let mut out = String::new();
    write_children(doc.root_element(), &banned, &mut out);
    out
}

fn write_children(scope: ElementRef<'_>, banned: &[Selector], out: &mut String) {
    for node in scope.children() {
        if let Some(el) = ElementRef::wrap(node) {
            if banned.iter().any(|sel| sel.matches(&el)) {
                continue;
            }
            let name = el.value().name();
            out.push('<');
            out.push_str(name);
            for (attr, value) in el.value().attrs() {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            out.push('>');
            if !is_void(name) {
                write_children(el, banned, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        } else if let Some(text) = node.value().as_text() {
            out.push_str(&escape_text(text));
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "param" | "source" | "track" | "wbr"
    )
}
