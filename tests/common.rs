use gumdrop::Options;
use std::path::{Path, PathBuf};

use httpagg::config::HttpAggConfiguration;
use httpagg::record::OutcomeRecord;
use httpagg::store::RecordStore;

/// Not all functions are used by all tests, so we enable allow(dead_code) to avoid
/// compiler warnings during testing.

/// The following options are configured by default, if not set to a custom value:
///  --results-file <dir>/httpagg.json
///  --report-file <dir>/report.html
#[allow(dead_code)]
pub fn build_configuration(dir: &Path, custom: Vec<&str>) -> HttpAggConfiguration {
    // Start with an empty configuration.
    let mut configuration: Vec<&str> = vec![];
    // Declare paths here no matter what, so their lifetime is sufficient when needed.
    let results_file = results_file(dir);
    let report_file = dir.join("report.html").to_string_lossy().to_string();

    // Merge in all custom options first.
    configuration.extend_from_slice(&custom);

    // Default to reading and writing inside the test directory.
    if !configuration.contains(&"--results-file") {
        configuration.extend_from_slice(&["--results-file", &results_file]);
    }
    if !configuration.contains(&"--report-file") {
        configuration.extend_from_slice(&["--report-file", &report_file]);
    }

    // Parse these options to generate an HttpAggConfiguration.
    HttpAggConfiguration::parse_args_default(&configuration)
        .expect("failed to parse options and generate a configuration")
}

/// The results file used by `build_configuration`.
#[allow(dead_code)]
pub fn results_file(dir: &Path) -> String {
    dir.join("httpagg.json").to_string_lossy().to_string()
}

/// Build a record, panicking if it's invalid.
#[allow(dead_code)]
pub fn record(url: &str, method: &str, status: u16, duration: f64) -> OutcomeRecord {
    OutcomeRecord::new(url, method, status, duration).expect("failed to build record")
}

/// A GUID that differs for every `n`.
#[allow(dead_code)]
pub fn guid(n: usize) -> String {
    format!("{:08x}-{:04x}-4abc-8def-{:012x}", n, n % 0xffff, n * 7919)
}

/// A deterministic mix of hosts, endpoints, methods, status codes and durations.
#[allow(dead_code)]
pub fn sample_records(count: usize) -> Vec<OutcomeRecord> {
    let hosts = ["svc-a.com", "svc-b.com", "api.staging.com"];
    let statuses = [200, 200, 201, 204, 302, 404, 429, 500, 503, 0];
    (0..count)
        .map(|n| {
            let host = hosts[n % hosts.len()];
            let (method, url) = match n % 5 {
                0 => ("GET", format!("https://{}/api/v1/patients/{}", host, guid(n))),
                1 => ("GET", format!("https://{}/api/v1/patients", host)),
                2 => ("POST", format!("https://{}/api/v1/patients", host)),
                3 => (
                    "DELETE",
                    format!("https://{}/api/v1/patients/{}/notes/undefined", host, guid(n)),
                ),
                _ => ("PUT", format!("https://{}/api/v1/patients/{}", host, guid(n))),
            };
            // Spread durations over a few orders of magnitude.
            let duration = ((n * 7 + 3) % 97) as f64 * 13.37 + (n % 3) as f64 * 0.005;
            record(&url, method, statuses[n % statuses.len()], duration)
        })
        .collect()
}

/// Append all `records` to the results file at `path`.
#[allow(dead_code)]
pub fn write_records<P: AsRef<Path>>(path: P, records: &[OutcomeRecord]) -> PathBuf {
    let store = RecordStore::new(path.as_ref());
    for record in records {
        store.append(record).expect("failed to append record");
    }
    store.path().to_path_buf()
}
