use std::fmt::{self, Display, Formatter};

use crate::metrics::{GroupSummary, Percentiles};
use crate::report::ReportRow;
use crate::util;

/// A duration table cell, blank if the summary has no value for its column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DurationCell(pub Option<f64>);

impl Display for DurationCell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(duration) => write!(f, "{:.*}", util::PRECISION as usize, duration),
            None => Ok(()),
        }
    }
}

/// Escape text for use in html element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The configured percentile durations of a summary, in configured order. Levels
/// missing from the summary are blank.
pub(crate) fn percentile_cells(
    summary: &GroupSummary,
    percentiles: &Percentiles,
) -> Vec<DurationCell> {
    percentiles
        .levels
        .iter()
        .map(|level| DurationCell(summary.percentile(*level)))
        .collect()
}

/// Rows in display order: by method, then by URL pattern.
pub(crate) fn display_order(rows: &[ReportRow]) -> impl Iterator<Item = &ReportRow> {
    use itertools::Itertools;

    rows.iter().sorted_by(|a, b| a.key.cmp(&b.key))
}
