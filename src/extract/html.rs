//! HTML helpers shared by the local extractor and the store-page scraper.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text content is never shown to a reader.
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

static LEGAL_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(End User License Agreement|EULA|Legal Notice)")
        .expect("legal heading pattern is valid")
});

fn is_non_text_element(node: &scraper::Node) -> bool {
    node.as_element()
        .is_some_and(|e| NON_TEXT_ELEMENTS.contains(&e.name()))
}

fn joined_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips markup and joins the visible text blocks with newlines.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut blocks = Vec::new();
    for node in doc.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() || node.ancestors().any(|a| is_non_text_element(a.value())) {
            continue;
        }
        blocks.push(text.to_string());
    }
    blocks.join("\n")
}

/// First anchor whose `href` contains `needle` (case-insensitive).
pub fn find_anchor_href(html: &str, needle: &str) -> Option<String> {
    find_anchor_href_where(html, needle, |_| true)
}

/// First anchor whose `href` contains `needle` (case-insensitive) and also
/// satisfies `accept`. Rejected anchors do not stop the search.
pub fn find_anchor_href_where<F>(html: &str, needle: &str, accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let doc = Html::parse_document(html);
    let sel = Selector::parse("a[href]").ok()?;
    let needle = needle.to_lowercase();
    doc.select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| href.to_lowercase().contains(&needle) && accept(href))
        .map(str::to_string)
}

/// Text of the element enclosing the first visible "End User License
/// Agreement" / "EULA" / "Legal Notice" mention.
pub fn legal_notice_block(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    for node in doc.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !LEGAL_HEADING.is_match(text)
            || node.ancestors().any(|a| is_non_text_element(a.value()))
        {
            continue;
        }
        let block = node
            .parent()
            .and_then(ElementRef::wrap)
            .map(joined_text)
            .unwrap_or_else(|| text.trim().to_string());
        if !block.is_empty() {
            return Some(block);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE_PAGE: &str = r#"<html><head><title>Portal 2 on Steam</title>
<script>var eula = "not this";</script><style>.eula{}</style></head>
<body>
  <div class="nav"><a href="/about/">About</a></div>
  <div id="game_area_legal">
    <p>Legal Notice: <b>Valve</b> retains all rights.</p>
  </div>
</body></html>"#;

    #[test]
    fn text_skips_scripts_and_styles() {
        let text = html_to_text(STORE_PAGE);
        assert!(text.contains("Portal 2 on Steam"));
        assert!(text.contains("Valve"));
        assert!(!text.contains("not this"));
        assert!(!text.contains(".eula"));
    }

    #[test]
    fn text_blocks_are_newline_separated() {
        let text = html_to_text("<h1>EULA</h1><p>First clause.</p><p>Second clause.</p>");
        assert_eq!(text, "EULA\nFirst clause.\nSecond clause.");
    }

    #[test]
    fn anchor_match_is_case_insensitive() {
        let html = concat!(
            r#"<a href="/support">Support</a>"#,
            r#"<a href="https://example.com/Legal/EULA.html">Terms</a>"#,
        );
        assert_eq!(
            find_anchor_href(html, "eula").as_deref(),
            Some("https://example.com/Legal/EULA.html")
        );
        assert_eq!(find_anchor_href(STORE_PAGE, "eula"), None);
    }

    #[test]
    fn rejected_anchor_does_not_end_search() {
        let html = r#"<a href="/eula/1">A</a><a href="https://cdn.test/game_eula.pdf">B</a>"#;
        let absolute = |href: &str| href.starts_with("http");
        assert_eq!(
            find_anchor_href_where(html, "eula", absolute).as_deref(),
            Some("https://cdn.test/game_eula.pdf")
        );
        assert_eq!(find_anchor_href(html, "eula").as_deref(), Some("/eula/1"));
    }

    #[test]
    fn legal_block_is_enclosing_element_text() {
        let block = legal_notice_block(STORE_PAGE).unwrap();
        assert_eq!(block, "Legal Notice:\nValve\nretains all rights.");
    }

    #[test]
    fn no_legal_mention_yields_none() {
        assert_eq!(legal_notice_block("<p>Buy now</p>"), None);
    }
}
