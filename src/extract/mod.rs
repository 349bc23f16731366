//! Field extraction from paper pages
//!
//! Paper pages on the archive are loosely structured: the only reliable
//! metadata is a BibTeX entry rendered inside a `<pre>` block, and the paper
//! title in the page's `<h1>`. Extraction is exposed through the
//! [`AbstractExtractor`] trait so callers don't depend on how the fields are
//! located.

mod bibtex;

pub use bibtex::BibtexExtractor;

use crate::ExtractionError;

/// Pulls the abstract and title out of a fetched paper page
///
/// Implementations must be tolerant of arbitrary pages: `extract_abstract`
/// never fails, it returns `None` when the page doesn't carry an abstract.
pub trait AbstractExtractor: Send + Sync {
    /// Returns the trimmed abstract text, or `None` if the page has none
    fn extract_abstract(&self, page: &str) -> Option<String>;

    /// Returns the trimmed paper title
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The title text
    /// * `Err(ExtractionError::MissingTitle)` - The page has no title heading
    fn extract_title(&self, page: &str) -> Result<String, ExtractionError>;
}
