//! Output module for writing scan reports
//!
//! This module handles:
//! - Naming the report file after the keyword set
//! - Serializing matched papers as CSV

mod csv_report;
mod traits;

pub use csv_report::{report_file_name, CsvReportWriter};
pub use traits::{MatchWriter, OutputError, OutputResult};
