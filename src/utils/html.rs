//! HTML escaping and allow-list sanitizing for email bodies.

use scraper::{ElementRef, Html, Node};

/// Structural tags kept by [`sanitize_html`]. Attributes are always dropped.
const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "b", "strong", "i", "em", "br", "div",
];

/// Tags whose content is dropped along with the tag itself.
const DROPPED_CONTENT_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "title", "svg",
    "math",
];

/// Escape HTML special characters for safe rendering.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Strip all markup except a small set of structural tags.
///
/// Disallowed tags are removed but their text is kept, except for tags in
/// [`DROPPED_CONTENT_TAGS`] which are removed entirely. Comments are dropped
/// and all text is escaped.
pub fn sanitize_html(input: &str) -> String {
    if !input.contains(|c| matches!(c, '<' | '>' | '&')) {
        return input.to_string();
    }

    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&html_escape(&text.text)),
            Node::Element(element) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = element.name();

                if DROPPED_CONTENT_TAGS.contains(&name) {
                    continue;
                }

                if ALLOWED_TAGS.contains(&name) {
                    if name == "br" {
                        out.push_str("<br>");
                        continue;
                    }
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                    write_children(child_ref, out);
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                } else {
                    write_children(child_ref, out);
                }
            }
            _ => {}
        }
    }
}
