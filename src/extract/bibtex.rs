//! BibTeX-block extractor
//!
//! The abstract is located by treating the first `<pre>` block as plain text
//! and matching its `abstract = { ... }` field with a regex. This survives
//! malformed markup far better than walking the BibTeX grammar would.

use crate::extract::AbstractExtractor;
use crate::ExtractionError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Non-greedy up to the first closing brace; nested braces truncate the abstract
static ABSTRACT_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)abstract\s*=\s*\{(.*?)\}").unwrap());

/// Extractor for pages that embed their metadata as a BibTeX `<pre>` block
#[derive(Debug, Clone, Copy, Default)]
pub struct BibtexExtractor;

impl BibtexExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl AbstractExtractor for BibtexExtractor {
    fn extract_abstract(&self, page: &str) -> Option<String> {
        let document = Html::parse_document(page);
        let block = first_element_text(&document, "pre")?;
        abstract_from_bibtex(&block)
    }

    fn extract_title(&self, page: &str) -> Result<String, ExtractionError> {
        let document = Html::parse_document(page);
        first_element_text(&document, "h1")
            .map(|title| title.trim().to_string())
            .ok_or(ExtractionError::MissingTitle)
    }
}

/// Extracts the `abstract` field from the text of a BibTeX entry
pub fn abstract_from_bibtex(entry: &str) -> Option<String> {
    ABSTRACT_FIELD
        .captures(entry)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Returns the concatenated text of the first element matching `selector`
fn first_element_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
}
