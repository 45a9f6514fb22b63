//! # httpagg
//!
//! Aggregates the outcomes of HTTP calls made during a load test into per-endpoint
//! latency and error statistics.
//!
//! While a load test runs, each completed HTTP call is handed to
//! [`ingest::check_request`] (or to the asynchronous [`logger::RecordLogger`]), which
//! appends an [`OutcomeRecord`](record::OutcomeRecord) to a results file. Once the run
//! completes, [`generate_report`] reads the results file back, groups the records by
//! normalized URL and HTTP method, computes statistics for each group and writes a
//! report.
//!
//! ## Recording outcomes
//!
//! ```rust
//! use httpagg::prelude::*;
//!
//! # fn main() -> Result<(), HttpAggError> {
//! # let dir = tempfile::tempdir()?;
//! # let results_file = dir.path().join("httpagg.json").to_string_lossy().to_string();
//! let options = IngestOptions {
//!     file_name: results_file.clone(),
//!     aggregate_level: AggregateLevel::All,
//! };
//!
//! let record = OutcomeRecord::new("https://svc-a.com/api/v1/patients", "GET", 503, 87.3)?;
//! // The second parameter is the load test's own verdict on the call.
//! check_request(record, false, &options)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Generating a report
//!
//! ```rust
//! use httpagg::prelude::*;
//! use gumdrop::Options;
//!
//! # fn main() -> Result<(), HttpAggError> {
//! # let dir = tempfile::tempdir()?;
//! # let results_file = dir.path().join("httpagg.json").to_string_lossy().to_string();
//! # let report_file = dir.path().join("report.html").to_string_lossy().to_string();
//! let configuration = HttpAggConfiguration::parse_args_default(&[
//!     "--results-file",
//!     &results_file,
//!     "--report-file",
//!     &report_file,
//! ])
//! .expect("failed to parse options");
//!
//! // Nothing has been recorded yet, so no report is written.
//! assert_eq!(generate_report(&configuration)?, None);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0.

#[macro_use]
extern crate log;

pub mod config;
pub mod group;
pub mod ingest;
pub mod logger;
pub mod metrics;
pub mod normalize;
pub mod prelude;
pub mod record;
pub mod report;
pub mod store;
pub mod util;

use std::{fmt, io};

use crate::config::HttpAggConfiguration;
use crate::store::RecordStore;

/// Default name of the file outcome records are appended to.
pub const DEFAULT_RESULTS_FILE: &str = "httpagg.json";

/// Default name of the generated report.
pub const DEFAULT_REPORT_FILE: &str = "httpaggReport.html";

/// An enumeration of all errors httpagg can return.
#[derive(Debug)]
pub enum HttpAggError {
    /// Wraps a [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html).
    Io(io::Error),
    /// Wraps a [`serde_json::Error`](https://docs.rs/serde_json/*/serde_json/struct.Error.html).
    Serde(serde_json::Error),
    /// Wraps a [`regex::Error`](https://docs.rs/regex/*/regex/enum.Error.html).
    Regex(regex::Error),
    /// Invalid option or value specified, may only be invalid in context.
    InvalidOption {
        /// The invalid option that caused this error, may be only invalid in context.
        option: String,
        /// The invalid value that caused this error, may be only invalid in context.
        value: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// An outcome record violates its invariants (negative duration, bogus status code, ...).
    InvalidRecord {
        /// An optional explanation of the error.
        detail: String,
    },
    /// The results file contains bytes that don't decode to an outcome record.
    MalformedRecord {
        /// Zero-based position of the record that failed to decode.
        index: usize,
        /// The underlying decode error.
        source: serde_json::Error,
    },
    /// Statistics were requested for a group without any records.
    EmptyGroup {
        /// An optional explanation of the error.
        detail: String,
    },
}
/// Implement a helper to provide a text description of all possible types of errors.
impl HttpAggError {
    fn describe(&self) -> &str {
        match *self {
            HttpAggError::Io(_) => "io::Error",
            HttpAggError::Serde(_) => "serde_json::Error",
            HttpAggError::Regex(_) => "regex::Error",
            HttpAggError::InvalidOption { .. } => "invalid option or value specified",
            HttpAggError::InvalidRecord { .. } => "invalid outcome record",
            HttpAggError::MalformedRecord { .. } => "malformed record in results file",
            HttpAggError::EmptyGroup { .. } => "empty group",
        }
    }
}

/// Implement format trait to allow displaying errors.
impl fmt::Display for HttpAggError {
    // Implement display of error with `{}` marker.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HttpAggError::Io(ref source) => {
                write!(f, "HttpAggError: {} ({})", self.describe(), source)
            }
            HttpAggError::Serde(ref source) => {
                write!(f, "HttpAggError: {} ({})", self.describe(), source)
            }
            HttpAggError::Regex(ref source) => {
                write!(f, "HttpAggError: {} ({})", self.describe(), source)
            }
            HttpAggError::InvalidOption {
                ref option,
                ref value,
                ref detail,
            } => write!(
                f,
                "HttpAggError: {} ({}={:?}: {})",
                self.describe(),
                option,
                value,
                detail
            ),
            HttpAggError::InvalidRecord { ref detail } | HttpAggError::EmptyGroup { ref detail } => {
                write!(f, "HttpAggError: {} ({})", self.describe(), detail)
            }
            HttpAggError::MalformedRecord {
                index,
                ref source,
            } => write!(
                f,
                "HttpAggError: {} (record {}: {})",
                self.describe(),
                index,
                source
            ),
        }
    }
}

// Define the lower level source of this error, if any.
impl std::error::Error for HttpAggError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            HttpAggError::Io(ref source) => Some(source),
            HttpAggError::Serde(ref source) => Some(source),
            HttpAggError::Regex(ref source) => Some(source),
            HttpAggError::MalformedRecord { ref source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Auto-convert IO errors.
impl From<io::Error> for HttpAggError {
    fn from(err: io::Error) -> HttpAggError {
        HttpAggError::Io(err)
    }
}

/// Auto-convert serde_json errors.
impl From<serde_json::Error> for HttpAggError {
    fn from(err: serde_json::Error) -> HttpAggError {
        HttpAggError::Serde(err)
    }
}

/// Auto-convert regex errors.
impl From<regex::Error> for HttpAggError {
    fn from(err: regex::Error) -> HttpAggError {
        HttpAggError::Regex(err)
    }
}

/// Read the configured results file and write a report summarizing it.
///
/// Returns the number of groups written to the report, or `None` if the results file
/// is missing or empty, in which case no report file is created.
pub fn generate_report(configuration: &HttpAggConfiguration) -> Result<Option<usize>, HttpAggError> {
    let mut configuration = configuration.clone();
    configuration.configure();
    configuration.validate()?;

    let records = RecordStore::read_all(&configuration.results_file)?;
    if records.is_empty() {
        info!(
            "no results in {}, not writing {}",
            configuration.results_file, configuration.report_file
        );
        return Ok(None);
    }

    let normalizer = configuration.normalizer()?;
    let index = group::group(&records, &normalizer);
    let rows = report::build(&index, &configuration.percentiles)?;

    report::write_report_file(&configuration.report_file, &rows, &configuration.percentiles)?;
    info!(
        "wrote {} groups from {} records to {}",
        rows.len(),
        records.len(),
        configuration.report_file
    );

    Ok(Some(rows.len()))
}
