use crate::report::common::{display_order, percentile_cells};
use crate::report::{ReportData, ReportRow};
use crate::util::{format_level, format_number};
use crate::HttpAggError;
use std::io::Write;

struct Markdown<'m, 'w, W: Write> {
    w: &'w mut W,
    data: ReportData<'m>,
}

pub(crate) fn write_markdown_report<W: Write>(
    w: &mut W,
    data: ReportData,
) -> Result<(), HttpAggError> {
    Markdown { w, data }.write()
}

// A literal `|` would end the table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

impl<W: Write> Markdown<'_, '_, W> {
    pub fn write(mut self) -> Result<(), HttpAggError> {
        self.write_header()?;
        self.write_request_metrics()?;
        self.write_duration_metrics()?;

        Ok(())
    }

    fn write_header(&mut self) -> Result<(), HttpAggError> {
        writeln!(
            self.w,
            r#"
# HTTP Aggregate Report

Generated: {generated}
"#,
            generated = self.data.generated.format("%a, %d %b %Y %H:%M:%S"),
        )?;

        Ok(())
    }

    fn write_request_metrics(&mut self) -> Result<(), HttpAggError> {
        write!(
            self.w,
            r#"
## Request Metrics

| Method | URL | # Requests | # Passed | # Failed | # Timeout | # HTTP 4xx | # HTTP 5xx |
| ------ | --- | ---------: | -------: | -------: | --------: | ---------: | ---------: |
"#
        )?;

        for ReportRow { key, summary } in display_order(self.data.rows) {
            let breakdown = &summary.failure_breakdown;
            writeln!(
                self.w,
                r#"| {method} | {url} | {total} | {passed} | {failed} | {timeouts} | {client_errors} | {server_errors} |"#,
                method = key.method,
                url = escape_cell(&key.url_pattern),
                total = format_number(summary.total_count),
                passed = format_number(summary.passed_count),
                failed = format_number(summary.failed_count),
                timeouts = format_number(breakdown.timeout_count),
                client_errors = format_number(breakdown.client_error_count),
                server_errors = format_number(breakdown.server_error_count),
            )?;
        }

        Ok(())
    }

    fn write_duration_metrics(&mut self) -> Result<(), HttpAggError> {
        let levels = &self.data.percentiles.levels;
        let headers: String = levels
            .iter()
            .map(|level| format!(" {}%ile (ms) |", format_level(*level)))
            .collect();
        let alignment: String = levels.iter().map(|_| " ---: |").collect();
        write!(
            self.w,
            r#"
## Duration Metrics

| Method | URL | Min (ms) | Average (ms) |{headers} Max (ms) |
| ------ | --- | -------: | -----------: |{alignment} -------: |
"#
        )?;

        for ReportRow { key, summary } in display_order(self.data.rows) {
            let percentiles: String = percentile_cells(summary, self.data.percentiles)
                .iter()
                .map(|cell| format!(" {} |", cell))
                .collect();
            writeln!(
                self.w,
                r#"| {method} | {url} | {min:.2} | {mean:.2} |{percentiles} {max:.2} |"#,
                method = key.method,
                url = escape_cell(&key.url_pattern),
                min = summary.min_duration,
                mean = summary.mean_duration,
                max = summary.max_duration,
            )?;
        }

        Ok(())
    }
}
