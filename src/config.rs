//! Functions and structures related to configuring httpagg.
//!
//! The `httpagg` binary is configured at run time by passing in the options and flags
//! defined by the [`HttpAggConfiguration`] structure. Library users can build the same
//! structure with [`gumdrop::Options::parse_args_default`] or by setting fields directly,
//! then pass it to [`generate_report`](crate::generate_report).

use gumdrop::Options;
use serde::{Deserialize, Serialize};
use simplelog::*;
use std::fs::File;

use crate::ingest::{AggregateLevel, IngestOptions};
use crate::metrics::Percentiles;
use crate::normalize::{
    KeyNormalizer, DEFAULT_GUID_PLACEHOLDER, DEFAULT_HOST_PLACEHOLDER, DEFAULT_HOST_SUFFIX,
};
use crate::report::ReportFormat;
use crate::{HttpAggError, DEFAULT_REPORT_FILE, DEFAULT_RESULTS_FILE};

/// Runtime options available when generating a report.
///
/// Help is generated for all of these options by passing a `-h` flag to the `httpagg`
/// binary. httpagg leverages [`gumdrop`](https://docs.rs/gumdrop/) to derive the help
/// from the below structure.
#[derive(Options, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[options(
    help = r#"httpagg groups the HTTP calls recorded during a load test by endpoint, and
reports how many passed, how many failed and how long they took.

The following runtime options are available:"#
)]
pub struct HttpAggConfiguration {
    /// Displays this help
    #[options(short = "h")]
    pub help: bool,
    /// Prints version information
    // Add a blank line after this option
    #[options(short = "V", help = "Prints version information\n")]
    pub version: bool,

    /// Sets results file to read (default: httpagg.json)
    #[options(short = "f", meta = "NAME")]
    pub results_file: String,
    /// Sets report file to write, .html, .md or .json (default: httpaggReport.html)
    #[options(short = "o", meta = "NAME")]
    pub report_file: String,
    /// Sets which calls are recorded (onError, onSuccess, all)
    #[options(no_short, meta = "LEVEL")]
    pub aggregate_level: Option<AggregateLevel>,
    /// Sets percentiles to report (default: 95,99.99)
    // Add a blank line and then a 'Normalization:' header after this option
    #[options(
        no_short,
        meta = "LIST",
        help = "Sets percentiles to report (default: 95,99.99)\n\nNormalization:"
    )]
    pub percentiles: Percentiles,

    /// Sets top level domain identifying hosts (default: .com)
    #[options(no_short, meta = "SUFFIX")]
    pub host_suffix: String,
    /// Sets placeholder replacing hosts
    #[options(no_short, meta = "TEXT")]
    pub host_placeholder: String,
    /// Sets placeholder for hosts of URLs containing MARKER
    #[options(no_short, meta = "MARKER=TEXT")]
    pub host_rule: Vec<String>,
    /// Sets placeholder replacing GUIDs
    #[options(no_short, meta = "TEXT")]
    pub guid_placeholder: String,
    /// Truncates normalized URLs longer than this
    // Add a blank line and then a 'Logging:' header after this option
    #[options(
        no_short,
        meta = "LENGTH",
        help = "Truncates normalized URLs longer than this\n\nLogging:"
    )]
    pub max_url_length: Option<usize>,

    /// Enables log file and sets name
    #[options(short = "G", meta = "NAME")]
    pub log_file: String,
    /// Increases log file level (-g, -gg, etc)
    #[options(short = "g", count)]
    pub log_level: u8,
    /// Decreases verbosity (-q, -qq, etc)
    #[options(count, short = "q")]
    pub quiet: u8,
    /// Increases verbosity (-v, -vv, etc)
    #[options(count, short = "v")]
    pub verbose: u8,
}

// Empty string options fall back to their default.
fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

impl HttpAggConfiguration {
    /// Replace options that weren't set with their defaults.
    pub fn configure(&mut self) {
        if self.results_file.is_empty() {
            self.results_file = DEFAULT_RESULTS_FILE.to_string();
        }
        if self.report_file.is_empty() {
            self.report_file = DEFAULT_REPORT_FILE.to_string();
        }
        if self.host_suffix.is_empty() {
            self.host_suffix = DEFAULT_HOST_SUFFIX.to_string();
        }
        if self.host_placeholder.is_empty() {
            self.host_placeholder = DEFAULT_HOST_PLACEHOLDER.to_string();
        }
        if self.guid_placeholder.is_empty() {
            self.guid_placeholder = DEFAULT_GUID_PLACEHOLDER.to_string();
        }
    }

    /// Validate that the configuration is consistent, returning the first problem found.
    pub fn validate(&self) -> Result<(), HttpAggError> {
        self.percentiles.validate()?;

        ReportFormat::from_path(or_default(&self.report_file, DEFAULT_REPORT_FILE))?;

        if self.max_url_length == Some(0) {
            return Err(HttpAggError::InvalidOption {
                option: "--max-url-length".to_string(),
                value: "0".to_string(),
                detail: "--max-url-length must be greater than 0".to_string(),
            });
        }

        // Placeholders and host rules are checked when the normalizer is built.
        self.normalizer()?;

        Ok(())
    }

    /// Build the normalizer described by the normalization options.
    pub fn normalizer(&self) -> Result<KeyNormalizer, HttpAggError> {
        let mut normalizer = KeyNormalizer::new(
            or_default(&self.host_suffix, DEFAULT_HOST_SUFFIX),
            or_default(&self.host_placeholder, DEFAULT_HOST_PLACEHOLDER),
            or_default(&self.guid_placeholder, DEFAULT_GUID_PLACEHOLDER),
        )?
        .set_max_length(self.max_url_length);

        for rule in &self.host_rule {
            match rule.split_once('=') {
                Some((marker, placeholder)) if !marker.is_empty() => {
                    normalizer = normalizer.add_host_rule(marker, placeholder)?;
                }
                _ => {
                    return Err(HttpAggError::InvalidOption {
                        option: "--host-rule".to_string(),
                        value: rule.to_string(),
                        detail: "host rules must be formatted MARKER=PLACEHOLDER".to_string(),
                    })
                }
            }
        }

        Ok(normalizer)
    }

    /// Options for recording calls to the configured results file.
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            file_name: or_default(&self.results_file, DEFAULT_RESULTS_FILE).to_string(),
            aggregate_level: self.aggregate_level.unwrap_or_default(),
        }
    }

    /// Level of messages written to standard out: `-q` hides info messages, `-v` adds
    /// debug and `-vv` trace messages.
    pub fn output_level(&self) -> LevelFilter {
        match (self.verbose, self.quiet) {
            (0, 0) => LevelFilter::Info,
            (0, _) => LevelFilter::Warn,
            (1, _) => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Level of messages written to `--log-file`, raised by each `-g`.
    pub fn log_file_level(&self) -> LevelFilter {
        match self.log_level {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Install the global logger: standard out, plus `--log-file` if configured.
    ///
    /// Fails only if the log file can't be created. A logger installed earlier (for
    /// example by a load test embedding httpagg) is left in place.
    pub fn initialize_logger(&self) -> Result<(), HttpAggError> {
        let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
        loggers.push(SimpleLogger::new(self.output_level(), Config::default()));
        if !self.log_file.is_empty() {
            loggers.push(WriteLogger::new(
                self.log_file_level(),
                Config::default(),
                File::create(&self.log_file)?,
            ));
        }

        if let Err(e) = CombinedLogger::init(loggers) {
            info!("logger already initialized: {}", e);
            return Ok(());
        }
        if !self.log_file.is_empty() {
            info!(
                "logging {} to {}",
                self.log_file_level(),
                self.log_file
            );
        }
        debug!("logging {} to stdout", self.output_level());

        Ok(())
    }
}
