//! Turn raw extractions into [`CanonicalRecord`]s.
//!
//! Text fields are trimmed, internal whitespace runs (newlines and indentation
//! from the markup) collapse to a single space, and a leading field label such
//! as `Title:` or `Authors:` is removed. A record whose title or URL is empty
//! after that is rejected.

use crate::models::{CanonicalRecord, RawRecord, SourceTag};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TITLE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:title\s*:\s*)+").unwrap());
static AUTHORS_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:authors?\s*:\s*)+").unwrap());

/// Normalize one raw record. Returns `None` when title or URL is missing or blank.
///
/// Authors are allowed to be missing; they become an empty string.
pub fn normalize(raw: RawRecord, source: &SourceTag) -> Option<CanonicalRecord> {
    let title = clean_field(raw.title.as_deref()?, &TITLE_LABEL);
    let abstract_url = raw.link.as_deref()?.trim().to_string();
    if title.is_empty() || abstract_url.is_empty() {
        return None;
    }

    let authors = raw
        .authors
        .as_deref()
        .map(|a| clean_field(a, &AUTHORS_LABEL))
        .unwrap_or_default();

    Some(CanonicalRecord {
        title,
        authors,
        abstract_url,
        source: source.clone(),
    })
}

fn clean_field(text: &str, label: &Regex) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    label.replace(&collapsed, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: Option<&str>, authors: Option<&str>, link: Option<&str>) -> RawRecord {
        RawRecord {
            title: title.map(String::from),
            authors: authors.map(String::from),
            link: link.map(String::from),
        }
    }

    #[test]
    fn test_strips_labels_and_whitespace() {
        let record = normalize(
            raw(
                Some("  Title: Great Paper "),
                Some("Authors: A. Smith, B. Lee"),
                Some("https://a.example/abs/1"),
            ),
            &SourceTag::from("A"),
        )
        .unwrap();

        assert_eq!(
            record,
            CanonicalRecord {
                title: "Great Paper".to_string(),
                authors: "A. Smith, B. Lee".to_string(),
                abstract_url: "https://a.example/abs/1".to_string(),
                source: SourceTag::Custom("A".to_string()),
            }
        );
    }

    #[test]
    fn test_collapses_markup_whitespace() {
        let record = normalize(
            raw(
                Some("\n  Title:\n        Deep\n   Learning  \n"),
                Some("Authors:\n <a>A. Smith</a>,\n   B. Lee\n"),
                Some(" https://arxiv.org/abs/1 "),
            ),
            &SourceTag::ArXiv,
        )
        .unwrap();

        assert_eq!(record.title, "Deep Learning");
        assert_eq!(record.authors, "<a>A. Smith</a>, B. Lee");
        assert_eq!(record.abstract_url, "https://arxiv.org/abs/1");
    }

    #[test]
    fn test_label_match_is_case_insensitive_and_field_specific() {
        let record = normalize(
            raw(
                Some("TITLE: Authors: a survey"),
                Some("author: Solo Writer"),
                Some("https://x.example/1"),
            ),
            &SourceTag::PubMed,
        )
        .unwrap();

        assert_eq!(record.title, "Authors: a survey");
        assert_eq!(record.authors, "Solo Writer");
    }

    #[test]
    fn test_missing_authors_become_empty() {
        let record = normalize(raw(Some("T"), None, Some("https://x.example/1")), &SourceTag::Ieee).unwrap();
        assert_eq!(record.authors, "");
    }

    #[test]
    fn test_rejects_missing_or_blank_required_fields() {
        let link = Some("https://x.example/1");
        assert_eq!(normalize(raw(None, Some("A"), link), &SourceTag::ArXiv), None);
        assert_eq!(normalize(raw(Some("   "), Some("A"), link), &SourceTag::ArXiv), None);
        assert_eq!(normalize(raw(Some("Title:  "), Some("A"), link), &SourceTag::ArXiv), None);
        assert_eq!(normalize(raw(Some("T"), Some("A"), None), &SourceTag::ArXiv), None);
        assert_eq!(normalize(raw(Some("T"), Some("A"), Some(" \n")), &SourceTag::ArXiv), None);
    }

    #[test]
    fn test_output_has_no_edge_whitespace() {
        let inputs = [
            "\tTitle:\tA\t",
            "Title:   ",
            "  plain  ",
            "Title: Title: nested",
            "\u{a0}Title: nbsp\u{a0}",
        ];
        for input in inputs {
            if let Some(record) = normalize(
                raw(Some(input), Some(input), Some("https://x.example/")),
                &SourceTag::BioRxiv,
            ) {
                assert_eq!(record.title, record.title.trim(), "{input:?}");
                assert_eq!(record.authors, record.authors.trim(), "{input:?}");
                assert!(!record.title.to_lowercase().starts_with("title:"), "{input:?}");
            }
        }
    }
}
