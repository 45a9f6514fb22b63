//! Statistics computed for each group of outcome records.
//!
//! Each group is reduced to a [`GroupSummary`]: how many calls passed, how many failed
//! and why, and the distribution of their durations.
//!
//! Percentiles are computed by linear interpolation between closest ranks. For `n`
//! sorted durations `x[0] <= .. <= x[n - 1]` and a level `p` between 0 and 100 the rank
//! is `r = p / 100 * (n - 1)`, and the percentile is
//! `x[floor(r)] + (r - floor(r)) * (x[ceil(r)] - x[floor(r)])`. The 0th percentile is
//! the minimum and the 100th percentile the maximum.
//!
//! All durations are in milliseconds. Every reported value is rounded to
//! [`util::PRECISION`] decimal places once, after being computed from the raw
//! durations.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::record::{OutcomeClass, OutcomeRecord};
use crate::util;
use crate::HttpAggError;

/// Percentile levels reported when none are configured.
pub const DEFAULT_PERCENTILES: &[f64] = &[95.0, 99.99];

/// The percentile levels to compute for each group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub levels: Vec<f64>,
}
impl Default for Percentiles {
    fn default() -> Self {
        Percentiles {
            levels: DEFAULT_PERCENTILES.to_vec(),
        }
    }
}
impl Percentiles {
    /// Confirm all levels are between 0 and 100.
    pub fn validate(&self) -> Result<(), HttpAggError> {
        for level in &self.levels {
            if !(0.0..=100.0).contains(level) {
                return Err(HttpAggError::InvalidOption {
                    option: "--percentiles".to_string(),
                    value: level.to_string(),
                    detail: "percentile levels must be between 0 and 100".to_string(),
                });
            }
        }
        Ok(())
    }
}
/// Implement [`FromStr`] to convert `"95,99.99"` comma separated string to percentile levels.
impl FromStr for Percentiles {
    type Err = HttpAggError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut levels = Vec::new();
        for level in s.split(',').map(str::trim).filter(|l| !l.is_empty()) {
            match f64::from_str(level) {
                Ok(l) => levels.push(l),
                Err(e) => {
                    return Err(HttpAggError::InvalidOption {
                        option: "--percentiles".to_string(),
                        value: level.to_string(),
                        detail: format!("invalid percentile level: {}", e),
                    })
                }
            }
        }
        let percentiles = Percentiles { levels };
        percentiles.validate()?;
        Ok(percentiles)
    }
}

/// Why the failed calls in a group failed.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FailureBreakdown {
    /// Calls that received no response (status `0`).
    pub timeout_count: usize,
    /// Calls that received a 4xx response.
    pub client_error_count: usize,
    /// Calls that received a 5xx response.
    pub server_error_count: usize,
}

/// The duration at one percentile level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileDuration {
    /// The percentile level, for example `99.99`.
    pub level: f64,
    /// Duration in milliseconds.
    pub duration: f64,
}

/// Aggregated statistics for one group.
///
/// `total_count == passed_count + failed_count`, and the failure breakdown sums to
/// `failed_count`. Summaries only exist for groups with at least one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub total_count: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub failure_breakdown: FailureBreakdown,
    /// Fastest duration in milliseconds.
    pub min_duration: f64,
    /// Slowest duration in milliseconds.
    pub max_duration: f64,
    /// Arithmetic mean duration in milliseconds.
    pub mean_duration: f64,
    /// Durations at each requested percentile level, in the order requested.
    pub percentile_durations: Vec<PercentileDuration>,
}

impl GroupSummary {
    /// Look up the duration computed for a percentile level.
    pub fn percentile(&self, level: f64) -> Option<f64> {
        self.percentile_durations
            .iter()
            .find(|p| p.level == level)
            .map(|p| p.duration)
    }
}

/// Compute the percentile `level` of already sorted durations.
pub(crate) fn calculate_percentile(sorted: &[f64], level: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = level / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - rank.floor();
    (sorted[lower] + fraction * (sorted[upper] - sorted[lower])).clamp(sorted[lower], sorted[upper])
}

/// Summarize the records of one group.
///
/// Fails with [`HttpAggError::EmptyGroup`] if `records` is empty, and with
/// [`HttpAggError::InvalidOption`] if a percentile level is out of range.
pub fn summarize(
    records: &[OutcomeRecord],
    percentiles: &Percentiles,
) -> Result<GroupSummary, HttpAggError> {
    if records.is_empty() {
        return Err(HttpAggError::EmptyGroup {
            detail: "cannot summarize a group without records".to_string(),
        });
    }
    percentiles.validate()?;

    let mut failure_breakdown = FailureBreakdown::default();
    let mut passed_count = 0;
    let mut durations = Vec::with_capacity(records.len());
    for record in records {
        match record.class() {
            OutcomeClass::Timeout => failure_breakdown.timeout_count += 1,
            OutcomeClass::ClientError => failure_breakdown.client_error_count += 1,
            OutcomeClass::ServerError => failure_breakdown.server_error_count += 1,
            OutcomeClass::Passed => passed_count += 1,
        }
        durations.push(record.duration);
    }
    durations.sort_by(|a, b| a.total_cmp(b));

    let min = durations[0];
    let max = durations[durations.len() - 1];
    // Floating point summation can drift a hair outside the observed range.
    let mean = (durations.iter().sum::<f64>() / durations.len() as f64).clamp(min, max);

    let percentile_durations = percentiles
        .levels
        .iter()
        .map(|level| PercentileDuration {
            level: *level,
            duration: util::round(calculate_percentile(&durations, *level), util::PRECISION),
        })
        .collect();

    let failed_count = failure_breakdown.timeout_count
        + failure_breakdown.client_error_count
        + failure_breakdown.server_error_count;
    trace!(
        "summarized {} records: {} passed, {} failed",
        records.len(),
        passed_count,
        failed_count
    );

    Ok(GroupSummary {
        total_count: records.len(),
        passed_count,
        failed_count,
        failure_breakdown,
        min_duration: util::round(min, util::PRECISION),
        max_duration: util::round(max, util::PRECISION),
        mean_duration: util::round(mean, util::PRECISION),
        percentile_durations,
    })
}
