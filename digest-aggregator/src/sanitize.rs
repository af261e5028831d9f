//! Allow-list sanitizer for the rich text kept alongside channel posts.
//!
//! Script elements and comments are dropped whole, `on*` handlers and
//! `javascript:` links are removed, and unknown elements are rewritten to a
//! neutral `<span>` so their text survives.

use scraper::node::Node;
use scraper::{ElementRef, Html};

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "b", "strong", "i", "em", "u", "s", "a", "code", "pre", "blockquote", "ul", "ol",
    "li", "div", "span",
];
const VOID_TAGS: &[&str] = &["br"];
const NEUTRAL_TAG: &str = "span";
const DROPPED_TAGS: &[&str] = &["script", "noscript", "iframe", "object", "embed"];

pub fn sanitize_rich_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => escape_text(text, out),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if DROPPED_TAGS.contains(&name) {
        return;
    }

    let allowed = ALLOWED_TAGS.contains(&name);
    let tag = if allowed { name } else { NEUTRAL_TAG };

    out.push('<');
    out.push_str(tag);
    if allowed {
        for (attr, value) in element.value().attrs() {
            if !keep_attribute(attr, value) {
                continue;
            }
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID_TAGS.contains(&tag) {
        return;
    }

    write_children(element, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn keep_attribute(name: &str, value: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("on") {
        return false;
    }
    if !lower
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return false;
    }
    if matches!(lower.as_str(), "href" | "src") {
        let target: String = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        return !target.starts_with("javascript:");
    }
    true
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
