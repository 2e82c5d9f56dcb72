//! Text cleanup helpers shared by the extractors.

use scraper::{ElementRef, Html, Node};
use unicode_segmentation::UnicodeSegmentation;

/// Subtrees that never contribute article text.
pub const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "embed", "object", "noscript", "nav", "aside", "form",
];

/// Elements that start a new line when flattened.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th",
    "section", "article", "blockquote", "header", "footer", "figure", "figcaption", "pre",
];

/// Collapse runs of whitespace (including non-breaking spaces) and drop
/// zero-width spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.replace('\u{200b}', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Single-line text of an element.
pub fn inline_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Multi-line text of an element, skipping the given subtrees.
/// Block elements become line breaks; blank lines are dropped.
pub fn element_text(element: ElementRef, skip: &[&str]) -> String {
    let mut raw = String::new();
    collect_text(element, skip, &mut raw);
    raw.lines()
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef, skip: &[&str], out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if skip.contains(&name) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    let block = BLOCK_TAGS.contains(&name);
                    if block {
                        out.push('\n');
                    }
                    collect_text(child_ref, skip, out);
                    if block {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Convert an HTML fragment (API `rendered` fields, feed summaries) to text.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    element_text(fragment.root_element(), SKIPPED_TAGS)
}

/// Keep at most `max` grapheme clusters.
pub fn truncate_graphemes(s: &str, max: usize) -> String {
    s.graphemes(true).take(max).collect()
}

/// One-line summary of at most `max` graphemes, cut on a word boundary.
pub fn excerpt(text: &str, max: usize) -> String {
    let flat = normalize_whitespace(text);
    if flat.graphemes(true).count() <= max {
        return flat;
    }
    let cut = truncate_graphemes(&flat, max);
    let head = match cut.rsplit_once(' ') {
        Some((head, _)) if !head.is_empty() => head,
        _ => cut.as_str(),
    };
    format!("{}...", head.trim_end_matches([',', ';', ':', '.']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a\u{a0}\n b\u{200b}c  "), "a bc");
    }

    #[test]
    fn test_html_to_text_skips_scripts_and_keeps_paragraphs() {
        let text = html_to_text(
            "<p>First &amp; <b>bold</b></p><script>var x = 1;</script><p>Second</p>",
        );
        assert_eq!(text, "First & bold\nSecond");
    }

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate_graphemes("héllo", 2), "hé");
        assert_eq!(truncate_graphemes("abc", 10), "abc");
    }

    #[test]
    fn test_excerpt_cuts_on_word_boundary() {
        let text = "Le gouvernement annonce de nouvelles mesures pour la rentrée";
        assert_eq!(excerpt(text, 30), "Le gouvernement annonce de...");
        assert_eq!(excerpt("short text", 30), "short text");
    }
}
