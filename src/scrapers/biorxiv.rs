//! bioRxiv listing parser.
//!
//! Scrapes `https://www.biorxiv.org/content/early/recent`. Entries are
//! Highwire citation blocks (`div.highwire-cite`); the title span wraps the
//! article link, so the anchor inside the title is the abstract URL.

use super::{ListingParser, SelectorRules, resolved_href};
use crate::models::SourceTag;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

pub fn parser(rules: SelectorRules, base_url: Url) -> ListingParser {
    ListingParser::new(SourceTag::BioRxiv, rules, base_url).with_preferred_link(linked_title)
}

fn linked_title(_container: ElementRef<'_>, title: ElementRef<'_>, base_url: &Url) -> Option<String> {
    title
        .select(&ANCHOR)
        .find_map(|anchor| resolved_href(anchor, base_url))
}

#[cfg(test)]
mod tests {
    use super::super::SourceParser;
    use super::super::test_support::default_parser;
    use super::*;
    use crate::models::RawRecord;

    const LISTING: &str = r#"
<ul>
  <li><div class="highwire-cite">
    <a class="highwire-cite-linked-title" href="/content/10.1101/2025.01.01.000001v1">
      <span class="highwire-cite-title">Protein folding at scale</span>
    </a>
    <span class="highwire-citation-authors">Jane Roe, John Doe</span>
  </div></li>
  <li><div class="highwire-cite">
    <span class="highwire-cite-title"><a href="/content/10.1101/2025.01.02.000002v1">Cell atlas</a></span>
  </div></li>
  <li><div class="highwire-cite">
    <span class="highwire-citation-authors">Orphan Authors</span>
    <a href="/content/10.1101/2025.01.03.000003v1">link</a>
  </div></li>
</ul>
"#;

    #[test]
    fn test_biorxiv_extracts_records() {
        let parser = default_parser(SourceTag::BioRxiv);
        let page = parser.parse(LISTING.as_bytes());

        assert_eq!(page.gaps, 1);
        assert_eq!(
            page.records,
            vec![
                RawRecord {
                    title: Some("Protein folding at scale".to_string()),
                    authors: Some("Jane Roe, John Doe".to_string()),
                    link: Some(
                        "https://www.biorxiv.org/content/10.1101/2025.01.01.000001v1".to_string()
                    ),
                },
                RawRecord {
                    title: Some("Cell atlas".to_string()),
                    authors: None,
                    link: Some(
                        "https://www.biorxiv.org/content/10.1101/2025.01.02.000002v1".to_string()
                    ),
                },
            ]
        );
    }
}
