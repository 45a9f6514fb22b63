//! Decides which completed HTTP calls are recorded.
//!
//! A load test hands every completed call to [`check_request`] along with its own
//! verdict on whether the call succeeded. Depending on the configured
//! [`AggregateLevel`] the call is appended to the results file or ignored.
//!
//! ```rust
//! use httpagg::prelude::*;
//!
//! # fn main() -> Result<(), HttpAggError> {
//! # let dir = tempfile::tempdir()?;
//! let options = IngestOptions {
//!     file_name: dir.path().join("httpagg.json").to_string_lossy().to_string(),
//!     ..Default::default()
//! };
//!
//! // Only failed calls are recorded by default.
//! let record = OutcomeRecord::new("https://svc-a.com/api/v1/patients", "GET", 200, 12.5)?;
//! assert!(!check_request(record, true, &options)?);
//!
//! let record = OutcomeRecord::new("https://svc-a.com/api/v1/patients", "GET", 500, 20.0)?;
//! assert!(check_request(record, false, &options)?);
//! # Ok(())
//! # }
//! ```

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::record::OutcomeRecord;
use crate::store::RecordStore;
use crate::{HttpAggError, DEFAULT_RESULTS_FILE};

/// Which calls are recorded.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum AggregateLevel {
    /// Record only calls the load test judged to have failed (default).
    OnError,
    /// Record only calls the load test judged to have succeeded.
    OnSuccess,
    /// Record every call.
    All,
}
impl Default for AggregateLevel {
    fn default() -> Self {
        AggregateLevel::OnError
    }
}
/// Allow `--aggregate-level` from the command line using text variations on supported
/// `AggregateLevel`s by implementing [`FromStr`].
impl FromStr for AggregateLevel {
    type Err = HttpAggError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Match the names used by load test scripts, plus a few abbreviations.
        let aggregate_level = RegexSet::new([
            r"(?i)^(onerror|on[-_]error|error|errors|failed|failure|failures)$",
            r"(?i)^(onsuccess|on[-_]success|success|passed)$",
            r"(?i)^(all|any|every)$",
        ])
        .expect("failed to compile aggregate_level RegexSet");
        let matches = aggregate_level.matches(s);
        if matches.matched(0) {
            Ok(AggregateLevel::OnError)
        } else if matches.matched(1) {
            Ok(AggregateLevel::OnSuccess)
        } else if matches.matched(2) {
            Ok(AggregateLevel::All)
        } else {
            Err(HttpAggError::InvalidOption {
                option: "--aggregate-level".to_string(),
                value: s.to_string(),
                detail: "Invalid aggregate level, expected: onError, onSuccess, or all"
                    .to_string(),
            })
        }
    }
}
impl AggregateLevel {
    /// Parse a level supplied by a load test script. Unrecognized levels fall back to
    /// [`AggregateLevel::OnError`] with a warning instead of failing the test.
    pub fn from_str_or_default(s: &str) -> Self {
        match AggregateLevel::from_str(s) {
            Ok(level) => level,
            Err(_) => {
                warn!(
                    "unknown aggregate level {:?}, recording failed calls only",
                    s
                );
                AggregateLevel::default()
            }
        }
    }

    /// Whether a call with this verdict is recorded at this level.
    pub fn includes(self, success: bool) -> bool {
        match self {
            AggregateLevel::OnError => !success,
            AggregateLevel::OnSuccess => success,
            AggregateLevel::All => true,
        }
    }
}

/// Where and which calls are recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Results file records are appended to, `httpagg.json` if empty.
    pub file_name: String,
    /// Which calls are recorded.
    pub aggregate_level: AggregateLevel,
}
impl IngestOptions {
    /// The results file, with the default applied.
    pub fn file_name(&self) -> &str {
        if self.file_name.is_empty() {
            DEFAULT_RESULTS_FILE
        } else {
            &self.file_name
        }
    }
}

/// Record one completed call if `options` select it.
///
/// `success` is the load test's own verdict on the call, independent of its status
/// code. Returns `Ok(true)` if the record was appended to the results file and
/// `Ok(false)` if the aggregate level filtered it out.
pub fn check_request(
    record: OutcomeRecord,
    success: bool,
    options: &IngestOptions,
) -> Result<bool, HttpAggError> {
    if !options.aggregate_level.includes(success) {
        trace!(
            "{:?} skipping {} {} ({})",
            options.aggregate_level,
            record.method,
            record.url,
            record.status
        );
        return Ok(false);
    }

    RecordStore::new(options.file_name()).append(&record)?;
    Ok(true)
}
