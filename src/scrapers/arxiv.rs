//! arXiv listing parser.
//!
//! Scrapes the "recent submissions" listing (for example
//! `https://arxiv.org/list/cs/recent`). Each entry has a `div.meta` block
//! holding the title and author lines, both prefixed with a descriptor
//! (`Title:`, `Authors:`) that the normalizer strips.
//!
//! # URL Pattern
//!
//! Abstract pages are linked relatively as `/abs/<id>` and resolve to
//! `https://arxiv.org/abs/2501.00001`. On the live listing that anchor sits in
//! the `<dt>` just before the `<dd>` holding `div.meta`:
//!
//! ```html
//! <dt><a href="/abs/2501.00001" title="Abstract">arXiv:2501.00001</a> ...</dt>
//! <dd><div class="meta">...</div></dd>
//! ```
//!
//! Author names inside `div.meta` are links too, so the `/abs/` anchor wins
//! over the configured link selector.

use super::{ListingParser, SelectorRules, resolved_href};
use crate::models::SourceTag;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use url::Url;

static ABSTRACT_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="/abs/"]"#).expect("static selector")
});

pub fn parser(rules: SelectorRules, base_url: Url) -> ListingParser {
    ListingParser::new(SourceTag::ArXiv, rules, base_url).with_preferred_link(abstract_link)
}

/// The `/abs/` anchor inside the container, else the one in the `<dt>` that
/// heads the container's `<dd>`.
fn abstract_link(container: ElementRef<'_>, _title: ElementRef<'_>, base_url: &Url) -> Option<String> {
    abstract_anchor_in(container, base_url).or_else(|| {
        let entry = container
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "dd")?;
        // Only the directly preceding element; an earlier <dt> belongs to another entry.
        let heading = entry
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .filter(|e| e.value().name() == "dt")?;
        abstract_anchor_in(heading, base_url)
    })
}

fn abstract_anchor_in(element: ElementRef<'_>, base_url: &Url) -> Option<String> {
    element
        .select(&ABSTRACT_LINK)
        .find_map(|anchor| resolved_href(anchor, base_url))
}
