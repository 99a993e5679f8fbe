//! PubMed search results parser.
//!
//! Scrapes a PubMed result page (`https://pubmed.ncbi.nlm.nih.gov/?term=...`).
//! Each hit is an `article.full-docsum`; the title is itself the anchor to
//! the abstract page (`/<pmid>/`).

use super::{ListingParser, SelectorRules, title_href};
use crate::models::SourceTag;
use url::Url;

pub fn parser(rules: SelectorRules, base_url: Url) -> ListingParser {
    ListingParser::new(SourceTag::PubMed, rules, base_url).with_preferred_link(title_href)
}
