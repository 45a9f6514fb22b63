//! Everything needed to record HTTP call outcomes and generate reports.
//!
//! ```rust
//! use httpagg::prelude::*;
//! ```

pub use crate::config::HttpAggConfiguration;
pub use crate::group::{group, GroupIndex, GroupKey};
pub use crate::ingest::{check_request, AggregateLevel, IngestOptions};
pub use crate::logger::{RecordLogger, RecordLoggerTx};
pub use crate::metrics::{summarize, GroupSummary, Percentiles};
pub use crate::normalize::KeyNormalizer;
pub use crate::record::{OutcomeClass, OutcomeRecord};
pub use crate::report::{build, write_report, write_report_file, ReportFormat, ReportRow};
pub use crate::store::RecordStore;
pub use crate::{generate_report, HttpAggError};
