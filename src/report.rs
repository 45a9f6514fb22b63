//! Builds report data from grouped records, and writes it as html, markdown or json.
//!
//! [`build`] is the only thing report writers depend on: one [`ReportRow`] per group,
//! with no formatting applied. The writers in [`html`] and [`markdown`] own all
//! presentation.

mod common;
mod html;
mod markdown;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::group::{GroupIndex, GroupKey};
use crate::metrics::{self, GroupSummary, Percentiles};
use crate::HttpAggError;

pub use common::escape_html;

/// Durations above this many milliseconds are highlighted as slow.
pub const SLOW_THRESHOLD: f64 = 1000.0;

/// Statistics for one group, as handed to report writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub key: GroupKey,
    pub summary: GroupSummary,
}

/// Summarize every group in `index`.
///
/// One row is returned per group. The order of the rows carries no meaning, writers
/// sort them however they prefer.
pub fn build(index: &GroupIndex, percentiles: &Percentiles) -> Result<Vec<ReportRow>, HttpAggError> {
    index
        .iter()
        .map(|(key, records)| {
            Ok(ReportRow {
                key: key.clone(),
                summary: metrics::summarize(records, percentiles)?,
            })
        })
        .collect()
}

/// The supported report formats, chosen by the report file's extension.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReportFormat {
    /// `.html` or `.htm`
    Html,
    /// `.md`
    Markdown,
    /// `.json`
    Json,
}
impl ReportFormat {
    /// Determine the report format from the extension of `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, HttpAggError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("html") | Some("htm") => Ok(ReportFormat::Html),
            Some("md") => Ok(ReportFormat::Markdown),
            Some("json") => Ok(ReportFormat::Json),
            _ => Err(HttpAggError::InvalidOption {
                option: "--report-file".to_string(),
                value: path.display().to_string(),
                detail: "report file must end in .html, .htm, .md or .json".to_string(),
            }),
        }
    }
}

/// Everything a report writer needs.
pub(crate) struct ReportData<'r> {
    pub rows: &'r [ReportRow],
    pub percentiles: &'r Percentiles,
    pub generated: DateTime<Local>,
}

/// Write `rows` to `w` in the requested format.
pub fn write_report<W: Write>(
    w: &mut W,
    format: ReportFormat,
    rows: &[ReportRow],
    percentiles: &Percentiles,
) -> Result<(), HttpAggError> {
    let data = ReportData {
        rows,
        percentiles,
        generated: Local::now(),
    };
    match format {
        ReportFormat::Html => html::write_html_report(w, data),
        ReportFormat::Markdown => markdown::write_markdown_report(w, data),
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, rows)?;
            writeln!(w)?;
            Ok(())
        }
    }
}

/// Create (or overwrite) `path` and write the report to it.
pub fn write_report_file<P: AsRef<Path>>(
    path: P,
    rows: &[ReportRow],
    percentiles: &Percentiles,
) -> Result<(), HttpAggError> {
    let path = path.as_ref();
    let format = ReportFormat::from_path(path)?;
    let mut w = BufWriter::new(File::create(path)?);
    write_report(&mut w, format, rows, percentiles)?;
    w.flush()?;
    debug!("wrote {:?} report to {}", format, path.display());
    Ok(())
}
