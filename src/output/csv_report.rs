//! CSV report generation
//!
//! The report has a header row `Title,Link,Sentence with Keyword` followed by
//! one row per matched paper. A paper without a matching sentence gets an
//! empty third column.

use crate::config::OutputConfig;
use crate::crawler::PaperMatch;
use crate::output::traits::{MatchWriter, OutputResult};
use crate::text::KeywordSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Header columns, in order
pub const HEADER: [&str; 3] = ["Title", "Link", "Sentence with Keyword"];

/// Derives the report file name from the keyword set
///
/// # Example
///
/// ```
/// use paper_sieve::output::report_file_name;
/// use paper_sieve::text::KeywordSet;
///
/// let keywords = KeywordSet::new(["mechatronic", "mechanic"]).unwrap();
/// assert_eq!(report_file_name(&keywords, "csv"), "mechatronic_mechanic.csv");
/// ```
pub fn report_file_name(keywords: &KeywordSet, extension: &str) -> String {
    format!(
        "{}.{}",
        keywords.file_stem(),
        extension.trim_start_matches('.')
    )
}

/// Writes matched papers to a CSV file
#[derive(Debug, Clone)]
pub struct CsvReportWriter {
    path: PathBuf,
}

impl CsvReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Places the report in the configured directory, named after the keywords
    pub fn for_keywords(config: &OutputConfig, keywords: &KeywordSet) -> Self {
        let file_name = report_file_name(keywords, &config.extension);
        Self::new(Path::new(&config.directory).join(file_name))
    }
}

impl MatchWriter for CsvReportWriter {
    fn write_matches(&self, matches: &[PaperMatch]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        // Written by hand so an empty report still carries the header
        writer.write_record(HEADER)?;
        for paper in matches {
            writer.serialize(paper)?;
        }
        writer.flush()?;

        tracing::info!(
            "Wrote {} matches to {}",
            matches.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
