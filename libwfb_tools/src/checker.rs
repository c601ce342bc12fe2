use std::fmt;
use std::str::FromStr;

use time::{Duration, PrimitiveDateTime, UtcOffset};

use super::aggregate::{apply_threshold, count_by, label_counts, summarize_by, AggregateRow, GroupKey};
use super::client::{HeatmapMode, TimelineMode, WfbClient};
use super::config::Config;
use super::error::CheckerError;
use super::event::{normalize, Event};
use super::notify::Notifier;
use super::report::{Report, ReportTable, Table};
use super::time_range::{format_datetime, local_now, TimeRange};

const SUMMARY_SUBJECT: &str = "C100 Fault Summary Report";
const SUMMARY_LOOKBACK_DAYS: i64 = 2;

/// The trigger checks, from most to least specific
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Fault,
    Cavity,
    Zone,
    Linac,
}

impl FromStr for CheckKind {
    type Err = CheckerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fault" => Ok(Self::Fault),
            "cavity" => Ok(Self::Cavity),
            "zone" => Ok(Self::Zone),
            "linac" => Ok(Self::Linac),
            _ => Err(CheckerError::InvalidCheck(s.to_string())),
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fault => "fault",
            Self::Cavity => "cavity",
            Self::Zone => "zone",
            Self::Linac => "linac",
        };
        write!(f, "{name}")
    }
}

impl CheckKind {
    pub fn group_key(&self) -> GroupKey {
        match self {
            Self::Fault => GroupKey::ZoneCavityFault,
            Self::Cavity => GroupKey::ZoneCavity,
            Self::Zone => GroupKey::Zone,
            Self::Linac => GroupKey::Linac,
        }
    }

    /// How far back the window reaches when no start time is given
    pub fn lookback(&self) -> Duration {
        match self {
            Self::Linac => Duration::hours(1),
            _ => Duration::days(1),
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Self::Fault => "C100 Fault Alert - Cavity/Fault Pair",
            Self::Cavity => "C100 Fault Alert - Cavities",
            Self::Zone => "C100 Fault Alert - Zones",
            Self::Linac => "C100 Fault Alert - Linac",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Fault => "Recurring Cavity/Fault-type Pairs",
            Self::Cavity => "Recurring Faulted Cavities",
            Self::Zone => "Recurring Faulted Zones",
            Self::Linac => "Recurring Faults Within Linacs",
        }
    }

    pub fn preamble(&self) -> &'static str {
        match self {
            Self::Fault => "Found recurring Cavity/Fault-type events",
            Self::Cavity => "Found recurring Cavity fault events",
            Self::Zone => "Found recurring Zone fault events",
            Self::Linac => "Found recurring Linac fault events",
        }
    }

    /// Report layout used for the images attached to this check's alerts
    pub fn image_modes(&self) -> (TimelineMode, HeatmapMode) {
        match self {
            Self::Linac => (TimelineMode::Separate, HeatmapMode::Linac),
            _ => (TimelineMode::Single, HeatmapMode::Zone),
        }
    }
}

/// The zones (or linacs, for the linac check) named by the rows, in order of first
/// appearance and without repeats
pub fn image_targets(rows: &[AggregateRow]) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for row in rows {
        if let Some(first) = row.key.first() {
            if !targets.contains(first) {
                targets.push(first.clone());
            }
        }
    }
    targets
}

/// Count the events for a check and build the alert, if any group met the threshold.
/// Returns the report together with the rows that triggered it.
pub fn build_trigger_report(
    check: CheckKind,
    threshold: u32,
    range: TimeRange,
    events: &[Event],
) -> Option<(Report, Vec<AggregateRow>)> {
    let rows = apply_threshold(count_by(events, check.group_key()), threshold);
    if rows.is_empty() {
        return None;
    }
    let report = Report::trigger(
        check.subject(),
        check.title(),
        check.preamble(),
        threshold,
        range,
        Table::from_aggregates(check.group_key(), &rows),
    );
    Some((report, rows))
}

/// Build the summary tables: labeled/unlabeled counts per zone, then confidence statistics
/// of the labeled events per zone and per zone/cavity/fault-type
pub fn build_summary_report(range: TimeRange, events: &[Event]) -> Report {
    let counts = label_counts(events);
    let labeled: Vec<Event> = events.iter().filter(|e| e.is_labeled()).cloned().collect();

    let tables = vec![
        ReportTable {
            title: String::from("Faults By Zone"),
            intro: None,
            table: Table::from_label_counts(&counts),
        },
        ReportTable {
            title: String::from("Labeled Faults By Zone"),
            intro: None,
            table: Table::from_aggregates(GroupKey::Zone, &summarize_by(&labeled, GroupKey::Zone)),
        },
        ReportTable {
            title: String::from("Faults By Cavity and Fault Type"),
            intro: None,
            table: Table::from_aggregates(
                GroupKey::ZoneCavityFault,
                &summarize_by(&labeled, GroupKey::ZoneCavityFault),
            ),
        },
    ];
    Report::summary(SUMMARY_SUBJECT, range, tables)
}

/// Runs the fault checks against the wfbrowser and hands the results to a Notifier.
pub struct Checker<'a> {
    config: &'a Config,
    client: WfbClient,
    offset: UtcOffset,
}

impl<'a> Checker<'a> {
    pub fn new(config: &'a Config, offset: UtcOffset) -> Self {
        Self {
            config,
            client: WfbClient::from_hosts(&config.data_server, &config.report_server),
            offset,
        }
    }

    fn retrieve_events(
        &self,
        range: &TimeRange,
        include_unlabeled: bool,
    ) -> Result<Vec<Event>, CheckerError> {
        spdlog::info!(
            "Retrieving events from {} to {}",
            format_datetime(&range.start()),
            format_datetime(&range.end())
        );
        let raw = self.client.fetch_events(range)?;
        let events = normalize(&raw, include_unlabeled, self.offset)?;
        spdlog::info!("{} of {} events retained", events.len(), raw.len());
        Ok(events)
    }

    /// Alert when a group of faults reaches the threshold. Nothing is delivered otherwise.
    pub fn run_trigger(
        &self,
        check: CheckKind,
        threshold: u32,
        start: Option<PrimitiveDateTime>,
        end: Option<PrimitiveDateTime>,
        notifier: &Notifier,
    ) -> Result<(), CheckerError> {
        let now = local_now(self.offset);
        let range = TimeRange::resolve_lookback(start, end, now, check.lookback())?;
        let events = self.retrieve_events(&range, false)?;

        let (mut report, rows) = match build_trigger_report(check, threshold, range, &events) {
            Some(r) => r,
            None => {
                spdlog::info!("No {check} group met the threshold of {threshold}");
                return Ok(());
            }
        };
        spdlog::info!("{} {check} group(s) met the threshold of {threshold}", rows.len());

        if notifier.wants_images() {
            let (timeline, heatmap) = check.image_modes();
            for target in image_targets(&rows) {
                let zones = match check {
                    CheckKind::Linac => match self.config.get_linac_zones(&target) {
                        Some(zones) => zones.to_vec(),
                        None => {
                            spdlog::warn!("No zones configured for linac {target}; skipping its report image");
                            continue;
                        }
                    },
                    _ => vec![target.clone()],
                };
                let image = self.client.fetch_report_image(&range, &zones, timeline, heatmap)?;
                report.add_image(&target, &format!("{target}.png"), image);
            }
        }

        notifier.deliver(&report)?;
        Ok(())
    }

    /// Produce the summary report. Always delivered, even when no events were found.
    pub fn run_summary(
        &self,
        start: Option<PrimitiveDateTime>,
        end: Option<PrimitiveDateTime>,
        notifier: &Notifier,
    ) -> Result<(), CheckerError> {
        let now = local_now(self.offset);
        let range =
            TimeRange::resolve_lookback(start, end, now, Duration::days(SUMMARY_LOOKBACK_DAYS))?;
        let events = self.retrieve_events(&range, true)?;

        let mut report = build_summary_report(range, &events);
        if notifier.wants_images() {
            let image = self.client.fetch_report_image(
                &range,
                &self.config.summary_zones,
                TimelineMode::Separate,
                HeatmapMode::Zone,
            )?;
            report.add_image("Summary", "summary.png", image);
        }

        notifier.deliver(&report)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn range() -> TimeRange {
        TimeRange::new(datetime!(2020-01-01 00:00), datetime!(2020-01-02 00:00)).unwrap()
    }

    fn event(zone: &str, labels: Option<(&str, &str)>) -> Event {
        Event {
            id: 0,
            zone: zone.to_string(),
            datetime: datetime!(2020-01-01 12:00),
            fault_label: labels.map(|l| l.1.to_string()),
            fault_confidence: labels.map(|_| 0.8),
            cavity_label: labels.map(|l| l.0.to_string()),
            cavity_confidence: labels.map(|_| 0.6),
        }
    }

    #[test]
    fn test_check_kind_parsing() {
        assert_eq!("linac".parse::<CheckKind>().unwrap(), CheckKind::Linac);
        assert_eq!("fault".parse::<CheckKind>().unwrap().group_key(), GroupKey::ZoneCavityFault);
        assert!(matches!(
            "cryomodule".parse::<CheckKind>(),
            Err(CheckerError::InvalidCheck(_))
        ));
        assert_eq!(CheckKind::Linac.lookback(), Duration::hours(1));
        assert_eq!(CheckKind::Zone.lookback(), Duration::days(1));
    }

    #[test]
    fn test_trigger_below_threshold() {
        let events = vec![event("1L22", Some(("4", "Quench")))];
        assert!(build_trigger_report(CheckKind::Zone, 2, range(), &events).is_none());
    }

    #[test]
    fn test_trigger_report() {
        let events = vec![
            event("1L22", Some(("4", "Quench"))),
            event("1L22", Some(("4", "Quench"))),
            event("1L22", Some(("5", "Quench"))),
            event("2L24", Some(("1", "Microphonics"))),
        ];
        let (report, rows) = build_trigger_report(CheckKind::Cavity, 2, range(), &events).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, vec!["1L22", "4"]);
        assert_eq!(report.subject, "C100 Fault Alert - Cavities");
        assert_eq!(report.threshold, Some(2));
        assert_eq!(report.tables[0].table.columns, vec!["zone", "cavity-label", "count"]);

        let (_, rows) = build_trigger_report(CheckKind::Linac, 1, range(), &events).unwrap();
        assert_eq!(image_targets(&rows), vec!["1L", "2L"]);
    }

    #[test]
    fn test_image_targets_are_unique() {
        let events = vec![
            event("1L22", Some(("4", "Quench"))),
            event("1L22", Some(("5", "Quench"))),
            event("1L23", Some(("5", "Quench"))),
        ];
        let (_, rows) = build_trigger_report(CheckKind::Fault, 1, range(), &events).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(image_targets(&rows), vec!["1L22", "1L23"]);
    }

    #[test]
    fn test_summary_report() {
        let events = vec![
            event("1L22", Some(("4", "Quench"))),
            event("1L22", None),
            event("0L04", None),
        ];
        let report = build_summary_report(range(), &events);
        assert_eq!(report.subject, "C100 Fault Summary Report");
        assert_eq!(report.threshold, None);
        assert_eq!(report.tables.len(), 3);
        // 0L04, 1L22 and the All margin
        assert_eq!(report.tables[0].table.rows.len(), 3);
        // Only labeled events reach the statistics tables
        assert_eq!(report.tables[1].table.rows.len(), 1);
        assert_eq!(report.tables[2].table.rows.len(), 1);
        assert_eq!(report.tables[2].table.columns.len(), 8);
    }

    #[test]
    fn test_summary_report_without_events() {
        let report = build_summary_report(range(), &[]);
        assert_eq!(report.tables[0].table.rows.len(), 1);
        assert!(report.tables[1].table.is_empty());
        assert!(report.to_text().contains("#### Faults By Cavity and Fault Type ####"));
    }
}
