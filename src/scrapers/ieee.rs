//! IEEE Xplore listing parser.
//!
//! Result items are `div.List-results-items`. The title anchor
//! (`a.document-title`) links to `/document/<id>/`. Authors are rendered as
//! one anchor per person inside `div.author`, so they are joined with `; `
//! rather than taken as raw text.

use super::{ListingParser, SelectorRules, element_text, title_href};
use crate::models::SourceTag;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use url::Url;

static AUTHOR_ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("static selector"));

pub fn parser(rules: SelectorRules, base_url: Url) -> ListingParser {
    ListingParser::new(SourceTag::Ieee, rules, base_url)
        .with_preferred_link(title_href)
        .with_authors(author_names)
}

fn author_names(author: ElementRef<'_>) -> String {
    let names: Vec<String> = author
        .select(&AUTHOR_ANCHOR)
        .map(|a| element_text(a).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        element_text(author)
    } else {
        names.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::super::SourceParser;
    use super::super::test_support::default_parser;
    use super::*;

    #[test]
    fn test_ieee_joins_author_anchors() {
        let parser = default_parser(SourceTag::Ieee);
        let html = r#"
<div class="List-results-items">
  <h3><a class="document-title" href="/document/10000001/">Low-power <span>RISC-V</span> cores</a></h3>
  <div class="author"><a href="/author/1">Ada Byron</a><span>;</span> <a href="/author/2">Alan Turing</a></div>
</div>
<div class="List-results-items">
  <h3><a class="document-title" href="/document/10000002/">Plain author text</a></h3>
  <div class="author">Grace Hopper</div>
</div>
"#;

        let page = parser.parse(html.as_bytes());

        assert_eq!(page.gaps, 0);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].authors.as_deref(), Some("Ada Byron; Alan Turing"));
        assert_eq!(
            page.records[0].link.as_deref(),
            Some("https://ieeexplore.ieee.org/document/10000001/")
        );
        assert_eq!(page.records[1].authors.as_deref(), Some("Grace Hopper"));
    }

    #[test]
    fn test_ieee_missing_author_still_yields_record() {
        let parser = default_parser(SourceTag::Ieee);
        let html = r#"<div class="List-results-items"><a class="document-title" href="/document/3/">Solo</a></div>"#;

        let page = parser.parse(html.as_bytes());
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].authors, None);
    }

    #[test]
    fn test_ieee_title_without_href_is_a_gap() {
        let parser = default_parser(SourceTag::Ieee);
        let html = r#"<div class="List-results-items"><a class="document-title">Dangling</a></div>"#;

        let page = parser.parse(html.as_bytes());
        assert!(page.records.is_empty());
        assert_eq!(page.gaps, 1);
    }
}
