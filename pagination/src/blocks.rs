//! Top-level block parsing.
//!
//! The editor's output is a flat list of block elements, but pasted content
//! can leave stray text or inline elements at the top level. Runs of such
//! inline content are gathered into a single `<p>` so every block the engine
//! sees is a self-contained element.

#[cfg(test)]
#[path = "blocks_test.rs"]
mod blocks_test;

use scraper::{ElementRef, Html, Node};

/// Elements that stand on their own at the top level.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figure", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "img", "li", "main", "nav", "ol", "p", "pre", "section",
    "table", "ul",
];

#[must_use]
pub fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Split an HTML fragment into its top-level blocks, in document order.
///
/// Comments are dropped. Whitespace-only text between blocks is ignored;
/// other stray text and inline elements are wrapped in `<p>`.
#[must_use]
pub fn split_blocks(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let mut blocks = Vec::new();
    let mut inline = String::new();

    for child in fragment.root_element().children() {
        if let Some(el) = ElementRef::wrap(child) {
            if is_block_tag(el.value().name()) {
                flush_inline(&mut inline, &mut blocks);
                blocks.push(el.html());
            } else {
                inline.push_str(&el.html());
            }
        } else if let Node::Text(text) = child.value() {
            inline.push_str(&escape_text(text));
        }
    }
    flush_inline(&mut inline, &mut blocks);
    blocks
}

fn flush_inline(inline: &mut String, blocks: &mut Vec<String>) {
    let run = std::mem::take(inline);
    let trimmed = run.trim();
    if !trimmed.is_empty() {
        blocks.push(format!("<p>{trimmed}</p>"));
    }
}

/// Re-escape decoded text so it can be embedded back into markup.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
