use std::fmt;

use super::aggregate::{AggregateRow, GroupKey, LabelCount};
use super::client::ReportImage;
use super::time_range::{format_datetime, TimeRange};

const TRIGGER_NOTICE: &str = r#"<p class="more_space">
An alert is only generated if the fault count on class of faults has met or exceeded the specified threshold
These alerts only consider labeled faults.  Faults are only labeled if they pass basic
validation checks.  These checks may vary over time, but the two goals are roughly the following:
<ul>
  <li>The trip is "real" and did not occur during recovery from a previous trip (e.g., not in SEL mode).</li>
  <li>The trip's data acquisition is suitable for the model to process it.</li>
</ul></p>"#;

const SUMMARY_NOTICE: &str = r#"<p class="more_space">This report only consider labeled faults.  Faults are only labeled if they pass basic
validation checks.  These checks may vary over time, but the two goals are roughly the following:
<ul>
  <li>The trip is "real" and did not occur during recovery from a previous trip (e.g., not in SEL mode).</li>
  <li>The trip's data acquisition is suitable for the model to process it.</li>
</ul></p>"#;

const STAT_COLUMNS: [&str; 4] = [
    "fault_conf_mean",
    "fault_conf_std",
    "cav_conf_mean",
    "cav_conf_std",
];

/// A single table cell. Confidences are shown to two decimals and missing values as NaN.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(usize),
    Confidence(Option<f64>),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Count(c) => write!(f, "{c}"),
            Self::Confidence(Some(v)) => write!(f, "{v:.2}"),
            Self::Confidence(None) => write!(f, "NaN"),
        }
    }
}

/// A rectangular table of cells with named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Key columns followed by `count`, plus the confidence statistics when present
    pub fn from_aggregates(key: GroupKey, rows: &[AggregateRow]) -> Self {
        let with_stats = rows.iter().any(|r| r.stats.is_some());
        let mut columns: Vec<String> = key.columns().iter().map(|c| c.to_string()).collect();
        columns.push(String::from("count"));
        if with_stats {
            columns.extend(STAT_COLUMNS.iter().map(|c| c.to_string()));
        }

        let rows = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Cell> = row.key.iter().cloned().map(Cell::Text).collect();
                cells.push(Cell::Count(row.count));
                if with_stats {
                    let stats = row.stats.unwrap_or_default();
                    cells.push(Cell::Confidence(stats.fault_mean));
                    cells.push(Cell::Confidence(stats.fault_std));
                    cells.push(Cell::Confidence(stats.cavity_mean));
                    cells.push(Cell::Confidence(stats.cavity_std));
                }
                cells
            })
            .collect();

        Self { columns, rows }
    }

    pub fn from_label_counts(counts: &[LabelCount]) -> Self {
        Self {
            columns: ["Zone", "Labeled", "Unlabeled", "Total"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows: counts
                .iter()
                .map(|c| {
                    vec![
                        Cell::Text(c.zone.clone()),
                        Cell::Count(c.labeled),
                        Cell::Count(c.unlabeled),
                        Cell::Count(c.total()),
                    ]
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as an HTML table. Cell text is escaped.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table border=\"1\" class=\"dataframe\">\n  <thead>\n");
        html.push_str("    <tr style=\"text-align: right;\">\n");
        for column in &self.columns {
            html.push_str(&format!("      <th>{}</th>\n", escape_html(column)));
        }
        html.push_str("    </tr>\n  </thead>\n  <tbody>\n");
        for row in &self.rows {
            html.push_str("    <tr>\n");
            for cell in row {
                html.push_str(&format!("      <td>{}</td>\n", escape_html(&cell.to_string())));
            }
            html.push_str("    </tr>\n");
        }
        html.push_str("  </tbody>\n</table>");
        html
    }

    /// Render as right aligned plain text columns
    pub fn to_text(&self) -> String {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                rendered
                    .iter()
                    .filter_map(|r| r.get(idx))
                    .map(|c| c.len())
                    .fold(name.len(), usize::max)
            })
            .collect();

        let mut lines = vec![format_line(self.columns.iter(), &widths)];
        for row in &rendered {
            lines.push(format_line(row.iter(), &widths));
        }
        lines.join("\n")
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a String>, widths: &[usize]) -> String {
    cells
        .zip(widths.iter())
        .map(|(c, &w)| format!("{c:>w$}"))
        .collect::<Vec<_>>()
        .join("  ")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub title: String,
    pub intro: Option<String>,
    pub table: Table,
}

/// A named link to the web report an attachment was rendered from
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Everything needed to email or print one fault report.
#[derive(Debug, Clone)]
pub struct Report {
    pub subject: String,
    pub title: String,
    pub preamble: String,
    notice: &'static str,
    pub threshold: Option<u32>,
    pub range: TimeRange,
    pub links: Vec<ReportLink>,
    pub tables: Vec<ReportTable>,
    pub attachments: Vec<Attachment>,
}

impl Report {
    /// A report for a threshold triggered alert
    pub fn trigger(
        subject: &str,
        title: &str,
        preamble: &str,
        threshold: u32,
        range: TimeRange,
        table: Table,
    ) -> Self {
        Self {
            subject: subject.to_string(),
            title: title.to_string(),
            preamble: preamble.to_string(),
            notice: TRIGGER_NOTICE,
            threshold: Some(threshold),
            range,
            links: vec![],
            tables: vec![ReportTable {
                title: String::from("Fault Table"),
                intro: Some(String::from(
                    "The follow classes of faults were found to have exceeded the specified threshold.",
                )),
                table,
            }],
            attachments: vec![],
        }
    }

    /// A periodic summary report
    pub fn summary(subject: &str, range: TimeRange, tables: Vec<ReportTable>) -> Self {
        Self {
            subject: subject.to_string(),
            title: String::from("Labeled Fault Summary"),
            preamble: String::from("#### Labeled Fault Summary ####"),
            notice: SUMMARY_NOTICE,
            threshold: None,
            range,
            links: vec![],
            tables,
            attachments: vec![],
        }
    }

    /// Attach a rendered web report under `filename` and link to its page as `name`
    pub fn add_image(&mut self, name: &str, filename: &str, image: ReportImage) {
        self.links.push(ReportLink {
            name: name.to_string(),
            url: image.report_url,
        });
        self.attachments.push(Attachment {
            filename: filename.to_string(),
            bytes: image.bytes,
        });
    }

    /// Render as an HTML email body styled by `css` (a `<style>` block)
    pub fn to_html(&self, css: &str) -> String {
        let mut links = String::new();
        for link in &self.links {
            links.push_str(&format!(
                "<p><a href='{}'>{} Report</a></p>\n",
                escape_html(&link.url),
                escape_html(&link.name)
            ));
        }

        let mut body = format!("<h2>{}</h2>\n{}\n", escape_html(&self.title), self.notice);
        if let Some(threshold) = self.threshold {
            body.push_str(&format!("<p>Threshold:  {threshold} events</p>\n"));
        }
        body.push_str(&format!(
            "<p>Start Time: {}</p>\n<p>End Time:   {}</p>\n\n",
            format_datetime(&self.range.start()),
            format_datetime(&self.range.end())
        ));
        body.push_str(&format!("<h2>Report Links</h2>\n{links}\n"));
        for table in &self.tables {
            body.push_str(&format!("<h2>{}</h2>\n", escape_html(&table.title)));
            if let Some(intro) = &table.intro {
                body.push_str(&format!("<p class='more_space'>{}</p>\n", escape_html(intro)));
            }
            body.push_str(&table.table.to_html());
            body.push_str("\n\n");
        }

        format!("<html>\n<head>{css}</head>\n<body>\n{body}</body></html>\n")
    }

    /// Render as plain text for the terminal
    pub fn to_text(&self) -> String {
        let mut text = format!("{}\n", self.preamble);
        if let Some(threshold) = self.threshold {
            text.push_str(&format!("Threshold: {threshold}\n"));
        }
        text.push_str(&format!(
            "Start: {}\nEnd:   {}\n",
            format_datetime(&self.range.start()),
            format_datetime(&self.range.end())
        ));
        for table in &self.tables {
            text.push_str(&format!("\n#### {} ####\n{}\n", table.title, table.table.to_text()));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ConfidenceStats;
    use time::macros::datetime;

    fn range() -> TimeRange {
        TimeRange::new(datetime!(2020-01-01 00:00), datetime!(2020-01-02 00:00)).unwrap()
    }

    fn zone_rows() -> Vec<AggregateRow> {
        vec![AggregateRow {
            key: vec![String::from("1L22")],
            count: 12,
            stats: None,
        }]
    }

    #[test]
    fn test_table_from_counts() {
        let table = Table::from_aggregates(GroupKey::Zone, &zone_rows());
        assert_eq!(table.columns, vec!["zone", "count"]);
        assert_eq!(
            table.rows,
            vec![vec![Cell::Text(String::from("1L22")), Cell::Count(12)]]
        );
        assert_eq!(table.to_text(), "zone  count\n1L22     12");
    }

    #[test]
    fn test_confidences_are_rounded() {
        let rows = vec![AggregateRow {
            key: vec![String::from("1L22")],
            count: 1,
            stats: Some(ConfidenceStats {
                fault_mean: Some(0.876543),
                fault_std: None,
                cavity_mean: Some(0.5),
                cavity_std: None,
            }),
        }];
        let table = Table::from_aggregates(GroupKey::Zone, &rows);
        assert_eq!(table.columns.len(), 6);
        let text: Vec<String> = table.rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(text, vec!["1L22", "1", "0.88", "NaN", "0.50", "NaN"]);
    }

    #[test]
    fn test_html_report() {
        let table = Table::from_aggregates(GroupKey::Zone, &zone_rows());
        let mut report = Report::trigger(
            "C100 Fault Alert - Zones",
            "Recurring Faulted Zones",
            "Found recurring Zone fault events",
            10,
            range(),
            table,
        );
        report.add_image(
            "1L22",
            "1L22.png",
            ReportImage {
                bytes: vec![1, 2, 3],
                report_url: String::from("https://example.org/report?a=1&b=2"),
            },
        );
        let html = report.to_html("<style></style>");
        assert!(html.starts_with("<html>\n<head><style></style></head>"));
        assert!(html.contains("<h2>Recurring Faulted Zones</h2>"));
        assert!(html.contains("<p>Threshold:  10 events</p>"));
        assert!(html.contains("<p>Start Time: 2020-01-01 00:00:00</p>"));
        assert!(html.contains(
            "<p><a href='https://example.org/report?a=1&amp;b=2'>1L22 Report</a></p>"
        ));
        assert!(html.contains("<td>1L22</td>"));
        assert!(html.contains("<td>12</td>"));
        assert_eq!(report.attachments[0].filename, "1L22.png");
    }

    #[test]
    fn test_text_report() {
        let table = Table::from_aggregates(GroupKey::Zone, &zone_rows());
        let report = Report::trigger("s", "t", "Found recurring Zone fault events", 10, range(), table);
        let text = report.to_text();
        assert_eq!(
            text,
            "Found recurring Zone fault events\nThreshold: 10\nStart: 2020-01-01 00:00:00\n\
             End:   2020-01-02 00:00:00\n\n#### Fault Table ####\nzone  count\n1L22     12\n"
        );
    }

    #[test]
    fn test_empty_tables_still_render() {
        let tables = vec![ReportTable {
            title: String::from("Labeled Faults By Zone"),
            intro: None,
            table: Table::from_aggregates(GroupKey::Zone, &[]),
        }];
        let report = Report::summary("C100 Fault Summary Report", range(), tables);
        let html = report.to_html("");
        assert!(html.contains("<th>zone</th>"));
        assert!(html.contains("<tbody>\n  </tbody>"));
        assert!(!html.contains("Threshold"));
        assert!(report.to_text().ends_with("#### Labeled Faults By Zone ####\nzone  count\n"));
    }

    #[test]
    fn test_label_count_table() {
        let counts = vec![LabelCount {
            zone: String::from("All"),
            labeled: 0,
            unlabeled: 0,
        }];
        let table = Table::from_label_counts(&counts);
        assert_eq!(table.to_text(), "Zone  Labeled  Unlabeled  Total\n All        0          0      0");
    }
}
