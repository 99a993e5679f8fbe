//! Source parsers for extracting paper metadata from listing pages.
//!
//! Every source is read by a [`ListingParser`]: it owns the compiled
//! selectors and base URL, walks the containers matched on a page, and yields
//! one item per container. An item is a [`RawRecord`] when the title and link
//! were found, or a [`ParseGap`] when one of them was not. Authors are
//! optional; a missing authors element still yields a record.
//!
//! What differs between sources is where the abstract link lives and how the
//! authors element is read. Those two rules are plugged into the shared
//! parser by the per-source modules.
//!
//! # Supported Sources
//!
//! | Source | Module | Link rule |
//! |--------|--------|-----------|
//! | arXiv | [`arxiv`] | `/abs/` anchor of the entry, else link selector |
//! | bioRxiv | [`biorxiv`] | Anchor inside the title, else link selector |
//! | PubMed | [`pubmed`] | Title anchor `href`, else link selector |
//! | IEEE Xplore | [`ieee`] | Title anchor `href`, else link selector |
//! | anything else | none | Link selector only |
//!
//! New sources are added by writing their rules and matching their tag in
//! [`parser_for`]. A source whose pages do not fit the container model can
//! implement [`SourceParser`] directly.

use crate::config::{ConfigError, SelectorConfig, SourceConfig};
use crate::models::{RawRecord, SourceTag};
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use url::Url;

pub mod arxiv;
pub mod biorxiv;
pub mod ieee;
pub mod pubmed;

/// A field without which a container produces no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Title,
    Link,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::Title => f.write_str("title"),
            RequiredField::Link => f.write_str("link"),
        }
    }
}

/// A matched container that was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseGap {
    pub missing: RequiredField,
}

pub type ParseItem = Result<RawRecord, ParseGap>;

/// Records extracted from one page, plus how many containers were skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub records: Vec<RawRecord>,
    pub gaps: usize,
}

pub trait SourceParser {
    fn tag(&self) -> &SourceTag;

    /// Relative hrefs on the page are resolved against this URL.
    fn base_url(&self) -> &Url;

    /// Lazily walk the containers of an already parsed document, in document order.
    fn items<'a>(&'a self, document: &'a Html) -> Box<dyn Iterator<Item = ParseItem> + 'a>;

    /// Decode `body` (lossily, as UTF-8), parse it and drain [`Self::items`].
    fn parse(&self, body: &[u8]) -> ParsedPage {
        let document = Html::parse_document(&String::from_utf8_lossy(body));
        let mut page = ParsedPage::default();
        for item in self.items(&document) {
            match item {
                Ok(record) => page.records.push(record),
                Err(gap) => {
                    tracing::debug!(
                        source = %self.tag(),
                        base_url = %self.base_url(),
                        missing = %gap.missing,
                        "Skipping container"
                    );
                    page.gaps += 1;
                }
            }
        }
        page
    }
}

/// Finds a source's preferred abstract link, given the container, its title
/// element and the base URL. `None` falls through to the link selector.
pub type LinkRule = fn(ElementRef<'_>, ElementRef<'_>, &Url) -> Option<String>;

/// Turns the matched authors element into the raw authors string.
pub type AuthorsRule = fn(ElementRef<'_>) -> String;

/// Container-based parser shared by every source.
///
/// Title and authors come from the configured selectors. The link is taken
/// from the source's [`LinkRule`] when it has one and it matches, otherwise
/// from the first link-selector match with an `href`.
pub struct ListingParser {
    tag: SourceTag,
    rules: SelectorRules,
    base_url: Url,
    preferred_link: Option<LinkRule>,
    authors: AuthorsRule,
}

impl ListingParser {
    /// A parser that applies the configured selectors as given.
    ///
    /// # Arguments
    ///
    /// * `tag` - Source tag stamped on every record
    /// * `rules` - Compiled container, title, authors and link selectors
    /// * `base_url` - Base for resolving relative hrefs
    pub fn new(tag: SourceTag, rules: SelectorRules, base_url: Url) -> Self {
        Self {
            tag,
            rules,
            base_url,
            preferred_link: None,
            authors: element_text,
        }
    }

    pub fn with_preferred_link(mut self, rule: LinkRule) -> Self {
        self.preferred_link = Some(rule);
        self
    }

    pub fn with_authors(mut self, rule: AuthorsRule) -> Self {
        self.authors = rule;
        self
    }

    fn extract(&self, container: ElementRef<'_>) -> ParseItem {
        let title = first_match(container, &self.rules.title).ok_or(ParseGap {
            missing: RequiredField::Title,
        })?;

        let link = self
            .preferred_link
            .and_then(|rule| rule(container, title, &self.base_url))
            .or_else(|| link_from_selector(container, &self.rules.link, &self.base_url))
            .ok_or(ParseGap {
                missing: RequiredField::Link,
            })?;

        Ok(RawRecord {
            title: Some(element_text(title)),
            authors: first_match(container, &self.rules.authors).map(self.authors),
            link: Some(link),
        })
    }
}

impl fmt::Debug for ListingParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingParser")
            .field("tag", &self.tag)
            .field("base_url", &self.base_url.as_str())
            .field("preferred_link", &self.preferred_link.is_some())
            .finish_non_exhaustive()
    }
}

impl SourceParser for ListingParser {
    fn tag(&self) -> &SourceTag {
        &self.tag
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn items<'a>(&'a self, document: &'a Html) -> Box<dyn Iterator<Item = ParseItem> + 'a> {
        Box::new(
            document
                .select(&self.rules.container)
                .map(move |container| self.extract(container)),
        )
    }
}

/// Selectors compiled from a [`SelectorConfig`].
#[derive(Debug)]
pub struct SelectorRules {
    pub container: Selector,
    pub title: Selector,
    pub authors: Selector,
    pub link: Selector,
}

impl SelectorRules {
    pub fn compile(tag: &SourceTag, config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            container: compile_selector(tag, "container", &config.container)?,
            title: compile_selector(tag, "title", &config.title)?,
            authors: compile_selector(tag, "authors", &config.authors)?,
            link: compile_selector(tag, "link", &config.link)?,
        })
    }
}

fn compile_selector(
    tag: &SourceTag,
    field: &'static str,
    selector: &str,
) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        source_tag: tag.clone(),
        field,
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn parse_base_url(config: &SourceConfig) -> Result<Url, ConfigError> {
    Url::parse(&config.base_url).map_err(|reason| ConfigError::BaseUrl {
        source_tag: config.tag.clone(),
        url: config.base_url.clone(),
        reason,
    })
}

/// Build the parser registered for `config.tag`.
///
/// Built-in tags get their source rules; any other tag gets a
/// [`ListingParser`] that applies the configured selectors as given.
///
/// # Errors
///
/// Returns [`ConfigError::Selector`] for a selector that does not compile and
/// [`ConfigError::BaseUrl`] for an unparsable base URL.
pub fn parser_for(config: &SourceConfig) -> Result<Box<dyn SourceParser>, ConfigError> {
    let rules = SelectorRules::compile(&config.tag, &config.selectors)?;
    let base_url = parse_base_url(config)?;
    let parser = match &config.tag {
        SourceTag::ArXiv => arxiv::parser(rules, base_url),
        SourceTag::BioRxiv => biorxiv::parser(rules, base_url),
        SourceTag::PubMed => pubmed::parser(rules, base_url),
        SourceTag::Ieee => ieee::parser(rules, base_url),
        SourceTag::Custom(_) => ListingParser::new(config.tag.clone(), rules, base_url),
    };
    Ok(Box::new(parser))
}

/// All descendant text of an element, concatenated.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

pub(crate) fn first_match<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

/// Resolve an element's `href` against the source base URL.
pub(crate) fn resolved_href(element: ElementRef<'_>, base_url: &Url) -> Option<String> {
    let href = element.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    base_url.join(href).ok().map(String::from)
}

/// The title element's own `href`, for sources whose title is the abstract link.
pub(crate) fn title_href(_container: ElementRef<'_>, title: ElementRef<'_>, base_url: &Url) -> Option<String> {
    resolved_href(title, base_url)
}

/// `href` of the first link-selector match that has one.
pub(crate) fn link_from_selector(
    container: ElementRef<'_>,
    selector: &Selector,
    base_url: &Url,
) -> Option<String> {
    container
        .select(selector)
        .find_map(|anchor| resolved_href(anchor, base_url))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::AggregatorConfig;

    /// The built-in parser for `tag`, configured with the default selectors.
    pub fn default_parser(tag: SourceTag) -> Box<dyn SourceParser> {
        let config = AggregatorConfig::default();
        let source = config
            .sources
            .iter()
            .find(|s| s.tag == tag)
            .expect("built-in source");
        parser_for(source).unwrap()
    }
}
