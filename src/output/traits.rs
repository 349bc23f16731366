//! Output handler traits and types
//!
//! This module defines the trait interface for report writers and the
//! errors they can raise.

use crate::crawler::PaperMatch;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for report writers
///
/// A writer receives the complete list of matches once the scan has finished.
/// It is never called when the scan aborts, so an aborted run leaves no report
/// behind.
pub trait MatchWriter {
    /// Writes every match, replacing any previous report at the same location
    ///
    /// # Arguments
    ///
    /// * `matches` - The matched papers, in the order they should appear
    fn write_matches(&self, matches: &[PaperMatch]) -> OutputResult<()>;

    /// Where the report ends up
    fn location(&self) -> &Path;
}
