use crate::report::common::{display_order, escape_html, percentile_cells};
use crate::report::{ReportData, ReportRow, SLOW_THRESHOLD};
use crate::util::{format_level, format_number};
use crate::HttpAggError;
use std::io::Write;

const STYLE: &str = r#"
        body {
            font-family: Helvetica, sans-serif;
            color: #3c3c64;
            margin: 0 2%;
        }

        table {
            font-size: 14px;
            line-height: 25px;
            border-collapse: collapse;
            width: 100%;
            border: 1px solid #ece8f1;
        }

        th {
            background: #f9f8fc;
            color: #5a5c87;
            font-size: 10px;
            letter-spacing: .5px;
            padding: 10px 20px;
            text-align: left;
            text-transform: uppercase;
            border-bottom: 1px solid #ece8f1;
        }

        td {
            padding: 10px 20px;
            border-bottom: 1px solid #ece8f1;
            font-family: monospace, monospace;
        }

        td.failed {
            color: #ff6666;
        }

        .info span {
            color: #5a5c87;
        }
"#;

struct Html<'m, 'w, W: Write> {
    w: &'w mut W,
    data: ReportData<'m>,
}

pub(crate) fn write_html_report<W: Write>(
    w: &mut W,
    data: ReportData,
) -> Result<(), HttpAggError> {
    Html { w, data }.write()
}

impl<W: Write> Html<'_, '_, W> {
    pub fn write(mut self) -> Result<(), HttpAggError> {
        self.write_header()?;
        self.write_group_metrics()?;
        self.write_footer()?;

        Ok(())
    }

    fn write_header(&mut self) -> Result<(), HttpAggError> {
        let total: usize = self.data.rows.iter().map(|r| r.summary.total_count).sum();
        writeln!(
            self.w,
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>HTTP Aggregate Report</title>
    <style>{STYLE}    </style>
</head>
<body>
    <h1>HTTP Aggregate Report</h1>
    <div class="info">
        <p>Generated: <span>{generated}</span></p>
        <p>Requests: <span>{total}</span> in <span>{groups}</span> groups</p>
    </div>"#,
            generated = self.data.generated.format("%a, %d %b %Y %H:%M:%S"),
            total = format_number(total),
            groups = format_number(self.data.rows.len()),
        )?;

        Ok(())
    }

    fn write_group_metrics(&mut self) -> Result<(), HttpAggError> {
        let levels = &self.data.percentiles.levels;
        let percentile_headers: String = levels
            .iter()
            .map(|level| format!("<th>{}%ile (ms)</th>", format_level(*level)))
            .collect();
        writeln!(
            self.w,
            r#"    <table>
        <thead>
            <tr>
                <th rowspan="2">Method</th>
                <th rowspan="2">URL</th>
                <th colspan="6"># Requests</th>
                <th colspan="{duration_columns}">Duration (ms)</th>
            </tr>
            <tr>
                <th>Total</th>
                <th>Passed</th>
                <th>Failed</th>
                <th>Timeout</th>
                <th>HTTP 4xx</th>
                <th>HTTP 5xx</th>
                <th>Min (ms)</th>
                <th>Average (ms)</th>
                {percentile_headers}
                <th>Max (ms)</th>
            </tr>
        </thead>
        <tbody>"#,
            duration_columns = levels.len() + 3,
        )?;

        for row in display_order(self.data.rows) {
            self.write_group_row(row)?;
        }

        writeln!(
            self.w,
            r#"        </tbody>
    </table>"#
        )?;

        Ok(())
    }

    fn write_group_row(&mut self, row: &ReportRow) -> Result<(), HttpAggError> {
        let summary = &row.summary;
        let breakdown = &summary.failure_breakdown;
        let failed_class = |count: usize| if count > 0 { r#" class="failed""# } else { "" };
        let slow_class = |duration: f64| {
            if duration > SLOW_THRESHOLD {
                r#" class="failed""#
            } else {
                ""
            }
        };

        let percentiles: String = percentile_cells(summary, self.data.percentiles)
            .iter()
            .map(|cell| {
                format!(
                    "<td{}>{}</td>",
                    slow_class(cell.0.unwrap_or_default()),
                    cell
                )
            })
            .collect();

        writeln!(
            self.w,
            r#"            <tr>
                <td>{method}</td>
                <td>{url}</td>
                <td>{total}</td>
                <td>{passed}</td>
                <td{failed_class}>{failed}</td>
                <td>{timeouts}</td>
                <td>{client_errors}</td>
                <td{server_class}>{server_errors}</td>
                <td>{min:.2}</td>
                <td{mean_class}>{mean:.2}</td>
                {percentiles}
                <td{max_class}>{max:.2}</td>
            </tr>"#,
            method = escape_html(&row.key.method),
            url = escape_html(&row.key.url_pattern),
            total = format_number(summary.total_count),
            passed = format_number(summary.passed_count),
            failed_class = failed_class(summary.failed_count),
            failed = format_number(summary.failed_count),
            timeouts = format_number(breakdown.timeout_count),
            client_errors = format_number(breakdown.client_error_count),
            server_class = failed_class(breakdown.server_error_count),
            server_errors = format_number(breakdown.server_error_count),
            min = summary.min_duration,
            mean_class = slow_class(summary.mean_duration),
            mean = summary.mean_duration,
            max_class = slow_class(summary.max_duration),
            max = summary.max_duration,
        )?;

        Ok(())
    }

    fn write_footer(&mut self) -> Result<(), HttpAggError> {
        writeln!(
            self.w,
            r#"</body>
</html>"#
        )?;

        Ok(())
    }
}
