//! Archive page link collection
//!
//! This module turns the archive listing page into the list of paper URLs to
//! visit. Only `<a href="...">` targets are considered.

use crate::config::SiteConfig;
use scraper::{Html, Selector};
use url::Url;

/// A paper URL taken from the archive page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// The URL to fetch
    pub url: String,

    /// True if the href already carried a scheme and host
    pub was_absolute: bool,
}

/// Extracts and filters candidate links from the archive page
///
/// # Link Rules
///
/// **Exclude:**
/// - In-page anchors (`#...`)
/// - DOI redirects (anything starting with the configured DOI prefix)
/// - Any href containing `javascript`
///
/// **Rewrite:**
/// - Root-relative hrefs (`/...`) become `origin + href`
///
/// Every other href is kept unchanged. Document order is preserved and
/// duplicates are kept, so a paper linked twice is fetched twice.
#[derive(Debug, Clone)]
pub struct LinkCollector {
    origin: String,
    doi_prefix: String,
}

impl LinkCollector {
    /// Creates a collector for a site
    ///
    /// # Arguments
    ///
    /// * `origin` - Scheme and host, e.g. `https://nime.org`
    /// * `doi_prefix` - Prefix identifying DOI redirect links
    pub fn new(origin: impl Into<String>, doi_prefix: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            doi_prefix: doi_prefix.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.origin.as_str(), config.doi_prefix.as_str())
    }

    /// Collects the candidate paper links from the archive page HTML
    ///
    /// # Example
    ///
    /// ```
    /// use paper_sieve::crawler::LinkCollector;
    ///
    /// let collector = LinkCollector::new("https://nime.org", "https://doi.org");
    /// let html = r#"<a href="/proceedings/2020/paper1.html">Paper</a>"#;
    /// let links = collector.collect_candidates(html);
    /// assert_eq!(links[0].url, "https://nime.org/proceedings/2020/paper1.html");
    /// ```
    pub fn collect_candidates(&self, html: &str) -> Vec<CandidateLink> {
        let document = Html::parse_document(html);
        let mut candidates = Vec::new();

        if let Ok(a_selector) = Selector::parse("a[href]") {
            for element in document.select(&a_selector) {
                if let Some(href) = element.value().attr("href") {
                    if let Some(candidate) = self.resolve_link(href) {
                        candidates.push(candidate);
                    }
                }
            }
        }

        candidates
    }

    /// Applies the filtering and rewriting rules to a single href
    ///
    /// Returns None if the link should be excluded.
    pub fn resolve_link(&self, href: &str) -> Option<CandidateLink> {
        if href.starts_with('#')
            || href.starts_with(self.doi_prefix.as_str())
            || href.contains("javascript")
        {
            return None;
        }

        if href.starts_with('/') {
            return Some(CandidateLink {
                url: format!("{}{}", self.origin, href),
                was_absolute: false,
            });
        }

        Some(CandidateLink {
            url: href.to_string(),
            was_absolute: Url::parse(href).is_ok(),
        })
    }
}
