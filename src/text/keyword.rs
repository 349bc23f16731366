//! Keyword compilation and matching

use crate::ConfigError;
use regex::{Regex, RegexBuilder};
use std::fmt;

/// A single case-insensitive keyword pattern
///
/// Keywords are treated as regular expressions so that a configured pattern
/// such as `mecha(nic|tronic)` works. A pattern that is not a valid regex is
/// matched as a literal substring instead.
#[derive(Debug, Clone)]
pub struct Keyword {
    pattern: String,
    regex: Regex,
}

impl Keyword {
    /// Compiles a keyword pattern
    ///
    /// # Returns
    ///
    /// * `Ok(Keyword)` - The compiled keyword
    /// * `Err(ConfigError)` - The pattern is blank or could not be compiled
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keywords cannot be blank".to_string(),
            ));
        }

        let regex = match build_case_insensitive(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                tracing::debug!(
                    "Keyword '{}' is not a valid regex ({}), matching it literally",
                    pattern,
                    e
                );
                build_case_insensitive(&regex::escape(pattern)).map_err(|e| {
                    ConfigError::Validation(format!("Invalid keyword '{}': {}", pattern, e))
                })?
            }
        };

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as configured
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if the keyword occurs anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for Keyword {}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn build_case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// The ordered, non-empty set of keywords for a run
///
/// Order matters: when several keywords match an abstract, the first one in
/// configured order is the one reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
}

impl KeywordSet {
    /// Compiles every pattern, preserving order
    ///
    /// # Returns
    ///
    /// * `Ok(KeywordSet)` - All patterns compiled
    /// * `Err(ConfigError)` - The list is empty or a pattern is invalid
    ///
    /// # Example
    ///
    /// ```
    /// use paper_sieve::text::KeywordSet;
    ///
    /// let keywords = KeywordSet::new(["mechatronic", "mechanic"]).unwrap();
    /// assert_eq!(keywords.file_stem(), "mechatronic_mechanic");
    /// assert_eq!(
    ///     keywords.first_match("A Mechanical arm").map(|k| k.pattern()),
    ///     Some("mechanic")
    /// );
    /// ```
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = patterns
            .into_iter()
            .map(|p| Keyword::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if keywords.is_empty() {
            return Err(ConfigError::Validation(
                "at least one keyword is required".to_string(),
            ));
        }

        Ok(Self { keywords })
    }

    /// Returns the first keyword, in configured order, that occurs in `text`
    pub fn first_match(&self, text: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.is_match(text))
    }

    /// Iterates over the keywords in configured order
    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.keywords.iter()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// The keywords joined by underscores, used to name the report file
    ///
    /// Characters other than ASCII letters, digits, `-` and `_` become `-`,
    /// so a pattern such as `../x` or `a/b` cannot leave the output directory.
    pub fn file_stem(&self) -> String {
        self.keywords
            .iter()
            .map(|keyword| sanitize_file_component(keyword.pattern()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

fn sanitize_file_component(pattern: &str) -> String {
    pattern
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
