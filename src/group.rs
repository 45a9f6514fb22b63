//! Groups outcome records by normalized URL and HTTP method.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::normalize::KeyNormalizer;
use crate::record::OutcomeRecord;

/// The identity records are aggregated under, for example `GET https://{PLACEHOLDER}/`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// The normalized URL.
    pub url_pattern: String,
    /// The HTTP method, verbatim from the records.
    pub method: String,
}

impl GroupKey {
    /// Build the key `record` belongs to.
    pub fn for_record(record: &OutcomeRecord, normalizer: &KeyNormalizer) -> Self {
        GroupKey {
            url_pattern: normalizer.normalize(&record.url),
            method: record.method.clone(),
        }
    }
}

/// Implement ordering for GroupKey, by method and then by URL pattern.
impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.method, &self.url_pattern).cmp(&(&other.method, &other.url_pattern))
    }
}
/// Implement partial-ordering for GroupKey.
impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url_pattern)
    }
}

/// All records seen during a load test, grouped by [`GroupKey`].
///
/// Records within a group keep the order they were read in.
pub type GroupIndex = BTreeMap<GroupKey, Vec<OutcomeRecord>>;

/// Fold records into a [`GroupIndex`]. Every record lands in exactly one group.
pub fn group(records: &[OutcomeRecord], normalizer: &KeyNormalizer) -> GroupIndex {
    let mut index = GroupIndex::new();
    for record in records {
        index
            .entry(GroupKey::for_record(record, normalizer))
            .or_insert_with(Vec::new)
            .push(record.clone());
    }
    debug!("grouped {} records into {} groups", records.len(), index.len());
    index
}
