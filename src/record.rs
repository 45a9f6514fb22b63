//! The outcome of a single HTTP call.

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::HttpAggError;

/// One observed HTTP call result, as persisted in the results file.
///
/// The load testing runtime translates whatever it knows about a completed call into
/// this structure; nothing else about the runtime's representation is ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// The raw request URL as issued.
    pub url: String,
    /// The HTTP method (ie GET, POST, etc).
    pub method: String,
    /// The HTTP status code, or `0` if no response was received (timeout, connection
    /// error, etc).
    pub status: u16,
    /// How many milliseconds the call took.
    pub duration: f64,
}

/// How an outcome is counted when summarizing a group.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutcomeClass {
    /// No server response, status `0`.
    Timeout,
    /// A 4xx response.
    ClientError,
    /// A 5xx (or larger) response.
    ServerError,
    /// Anything else.
    Passed,
}

impl OutcomeRecord {
    /// Build a new record, validating the status code, method and duration.
    pub fn new(url: &str, method: &str, status: u16, duration: f64) -> Result<Self, HttpAggError> {
        let record = OutcomeRecord {
            url: url.to_string(),
            method: method.to_string(),
            status,
            duration,
        };
        record.validate()?;
        Ok(record)
    }

    /// Confirm the record is internally consistent.
    ///
    /// Records decoded from a results file are not validated automatically, this can be
    /// used to check them.
    pub fn validate(&self) -> Result<(), HttpAggError> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(HttpAggError::InvalidRecord {
                detail: format!("invalid duration {} for {}", self.duration, self.url),
            });
        }
        if self.status != 0 && StatusCode::from_u16(self.status).is_err() {
            return Err(HttpAggError::InvalidRecord {
                detail: format!("invalid status code {} for {}", self.status, self.url),
            });
        }
        if Method::from_bytes(self.method.as_bytes()).is_err() {
            return Err(HttpAggError::InvalidRecord {
                detail: format!("invalid method {:?} for {}", self.method, self.url),
            });
        }
        Ok(())
    }

    /// Classify the record as passed or as one of the failure classes.
    pub fn class(&self) -> OutcomeClass {
        match self.status {
            0 => OutcomeClass::Timeout,
            400..=499 => OutcomeClass::ClientError,
            s if s >= 500 => OutcomeClass::ServerError,
            _ => OutcomeClass::Passed,
        }
    }
}
