use std::fs;

use httpagg::report::ReportRow;
use httpagg::{generate_report, HttpAggError};

mod common;

// Run a report on the sample records, returning the generated report.
fn run_report(extension: &str, custom: Vec<&str>) -> String {
    let dir = tempfile::tempdir().unwrap();
    let report_file = dir
        .path()
        .join(format!("report.{}", extension))
        .to_string_lossy()
        .to_string();
    let mut options = vec!["--report-file", &report_file];
    options.extend_from_slice(&custom);
    let configuration = common::build_configuration(dir.path(), options);
    common::write_records(&configuration.results_file, &common::sample_records(100));

    assert_eq!(generate_report(&configuration).unwrap(), Some(5));
    fs::read_to_string(&report_file).unwrap()
}

#[test]
/// Html reports list every group.
fn test_html_report() {
    let report = run_report("html", vec![]);
    assert!(report.starts_with("<!DOCTYPE html>"));
    assert!(report.contains("<p>Requests: <span>100</span> in <span>5</span> groups</p>"));
    assert!(report.contains("<td>https://{PLACEHOLDER}/api/v1/patients/{GUID}/notes/{GUID}</td>"));
    assert!(report.contains("<th>95%ile (ms)</th>"));
    assert!(report.contains("<th>99.99%ile (ms)</th>"));
    assert!(report.trim_end().ends_with("</html>"));
}

#[test]
/// Markdown reports list every group, sorted by method then URL.
fn test_markdown_report() {
    let report = run_report("md", vec!["--percentiles", "50,90"]);
    assert!(report.contains("# HTTP Aggregate Report"));
    assert!(report.contains("| 50%ile (ms) | 90%ile (ms) |"));
    assert!(!report.contains("99.99%ile"));

    let delete = report
        .find("| DELETE | https://{PLACEHOLDER}/api/v1/patients/{GUID}/notes/{GUID} | 20 |")
        .unwrap();
    let get = report
        .find("| GET | https://{PLACEHOLDER}/api/v1/patients | 20 |")
        .unwrap();
    let put = report
        .find("| PUT | https://{PLACEHOLDER}/api/v1/patients/{GUID} | 20 |")
        .unwrap();
    assert!(delete < get && get < put);
}

#[test]
/// Json reports can be decoded back into report rows.
fn test_json_report() {
    let report = run_report("json", vec!["--percentiles", "99"]);
    let rows: Vec<ReportRow> = serde_json::from_str(&report).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows.iter().map(|r| r.summary.total_count).sum::<usize>(), 100);
    for row in &rows {
        assert_eq!(row.summary.percentile_durations.len(), 1);
        assert!(row.summary.percentile(99.0).is_some());
    }
}

#[test]
/// Normalization options change how records are grouped.
fn test_normalization_options() {
    let report = run_report(
        "json",
        vec![
            "--host-placeholder",
            "<host>",
            "--guid-placeholder",
            "<id>",
            "--max-url-length",
            "21",
        ],
    );
    let rows: Vec<ReportRow> = serde_json::from_str(&report).unwrap();
    // Truncated to "https://<host>/api/v1", only methods still differ.
    assert_eq!(rows.len(), 4);
    assert!(rows
        .iter()
        .all(|r| r.key.url_pattern == "https://<host>/api/v1..."));
}

#[test]
/// Unsupported report formats are rejected before anything is read.
fn test_invalid_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let report_file = dir.path().join("report.pdf").to_string_lossy().to_string();
    let configuration =
        common::build_configuration(dir.path(), vec!["--report-file", &report_file]);
    common::write_records(&configuration.results_file, &common::sample_records(10));

    assert!(matches!(
        generate_report(&configuration),
        Err(HttpAggError::InvalidOption { .. })
    ));
    assert!(!dir.path().join("report.pdf").exists());
}
