use std::collections::BTreeMap;

use super::event::Event;

/// The columns events can be grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Zone,
    ZoneCavity,
    ZoneCavityFault,
    Linac,
}

impl GroupKey {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Zone => &["zone"],
            Self::ZoneCavity => &["zone", "cavity-label"],
            Self::ZoneCavityFault => &["zone", "cavity-label", "fault-label"],
            Self::Linac => &["linac"],
        }
    }

    /// The key of an event, or None if the event lacks a label the key needs
    fn key_of(&self, event: &Event) -> Option<Vec<String>> {
        match self {
            Self::Zone => Some(vec![event.zone.clone()]),
            Self::ZoneCavity => Some(vec![event.zone.clone(), event.cavity_label.clone()?]),
            Self::ZoneCavityFault => Some(vec![
                event.zone.clone(),
                event.cavity_label.clone()?,
                event.fault_label.clone()?,
            ]),
            Self::Linac => Some(vec![event.linac().to_string()]),
        }
    }
}

/// Mean and sample standard deviation of the label confidences within a group.
/// Missing confidences are skipped; a statistic with too few values is None.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfidenceStats {
    pub fault_mean: Option<f64>,
    pub fault_std: Option<f64>,
    pub cavity_mean: Option<f64>,
    pub cavity_std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: Vec<String>,
    pub count: usize,
    pub stats: Option<ConfidenceStats>,
}

/// Labeled/unlabeled tally for one zone (or `All` for the margin row)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub zone: String,
    pub labeled: usize,
    pub unlabeled: usize,
}

impl LabelCount {
    pub fn total(&self) -> usize {
        self.labeled + self.unlabeled
    }
}

pub const MARGIN_ROW_NAME: &str = "All";

fn group<'a>(events: &'a [Event], key: GroupKey) -> BTreeMap<Vec<String>, Vec<&'a Event>> {
    let mut groups: BTreeMap<Vec<String>, Vec<&Event>> = BTreeMap::new();
    for event in events {
        if let Some(k) = key.key_of(event) {
            groups.entry(k).or_default().push(event);
        }
    }
    groups
}

/// Count events per distinct key. Rows come out sorted by key.
pub fn count_by(events: &[Event], key: GroupKey) -> Vec<AggregateRow> {
    group(events, key)
        .into_iter()
        .map(|(k, members)| AggregateRow {
            key: k,
            count: members.len(),
            stats: None,
        })
        .collect()
}

/// Count events per distinct key and attach confidence statistics
pub fn summarize_by(events: &[Event], key: GroupKey) -> Vec<AggregateRow> {
    group(events, key)
        .into_iter()
        .map(|(k, members)| {
            let fault: Vec<f64> = members.iter().filter_map(|e| e.fault_confidence).collect();
            let cavity: Vec<f64> = members.iter().filter_map(|e| e.cavity_confidence).collect();
            AggregateRow {
                key: k,
                count: members.len(),
                stats: Some(ConfidenceStats {
                    fault_mean: mean(&fault),
                    fault_std: sample_std(&fault),
                    cavity_mean: mean(&cavity),
                    cavity_std: sample_std(&cavity),
                }),
            }
        })
        .collect()
}

/// Keep the rows whose count has met or exceeded the threshold
pub fn apply_threshold(rows: Vec<AggregateRow>, threshold: u32) -> Vec<AggregateRow> {
    rows.into_iter()
        .filter(|r| r.count >= threshold as usize)
        .collect()
}

/// Labeled/unlabeled counts per zone followed by an `All` row. With no events the table
/// is just an empty `All` row.
pub fn label_counts(events: &[Event]) -> Vec<LabelCount> {
    let mut per_zone: BTreeMap<&str, LabelCount> = BTreeMap::new();
    let mut margin = LabelCount {
        zone: String::from(MARGIN_ROW_NAME),
        labeled: 0,
        unlabeled: 0,
    };
    for event in events {
        let entry = per_zone.entry(&event.zone).or_insert_with(|| LabelCount {
            zone: event.zone.clone(),
            labeled: 0,
            unlabeled: 0,
        });
        if event.is_labeled() {
            entry.labeled += 1;
            margin.labeled += 1;
        } else {
            entry.unlabeled += 1;
            margin.unlabeled += 1;
        }
    }
    let mut counts: Vec<LabelCount> = per_zone.into_values().collect();
    counts.push(margin);
    counts
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn event(zone: &str, cavity: Option<(&str, f64)>, fault: Option<(&str, f64)>) -> Event {
        Event {
            id: 0,
            zone: zone.to_string(),
            datetime: datetime!(2020-01-01 00:00),
            fault_label: fault.map(|f| f.0.to_string()),
            fault_confidence: fault.map(|f| f.1),
            cavity_label: cavity.map(|c| c.0.to_string()),
            cavity_confidence: cavity.map(|c| c.1),
        }
    }

    #[test]
    fn test_zone_threshold() {
        let events = vec![
            event("1L22", None, None),
            event("1L22", None, None),
            event("1L23", None, None),
        ];
        let rows = apply_threshold(count_by(&events, GroupKey::Zone), 2);
        assert_eq!(
            rows,
            vec![AggregateRow {
                key: vec![String::from("1L22")],
                count: 2,
                stats: None
            }]
        );
    }

    #[test]
    fn test_group_by_linac() {
        let events = vec![
            event("1L22", None, None),
            event("1L26", None, None),
            event("2L24", None, None),
        ];
        let rows = count_by(&events, GroupKey::Linac);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, vec!["1L"]);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].key, vec!["2L"]);
        assert_eq!(rows[1].count, 1);
    }

    #[test]
    fn test_missing_labels_are_not_grouped() {
        let events = vec![
            event("1L22", Some(("4", 0.9)), Some(("Quench", 0.8))),
            event("1L22", Some(("4", 0.7)), None),
            event("1L22", None, Some(("Quench", 0.6))),
        ];
        let rows = count_by(&events, GroupKey::ZoneCavity);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);

        let rows = count_by(&events, GroupKey::ZoneCavityFault);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, vec!["1L22", "4", "Quench"]);
        assert_eq!(rows[0].count, 1);
    }

    #[test]
    fn test_summary_statistics() {
        let events = vec![
            event("1L22", Some(("4", 0.5)), Some(("Quench", 0.2))),
            event("1L22", Some(("4", 1.0)), Some(("Quench", 0.4))),
            event("2L25", Some(("1", 0.3)), Some(("Microphonics", 0.9))),
        ];
        let rows = summarize_by(&events, GroupKey::Zone);
        assert_eq!(rows.len(), 2);

        let stats = rows[0].stats.unwrap();
        assert_eq!(rows[0].count, 2);
        assert!((stats.fault_mean.unwrap() - 0.3).abs() < 1e-12);
        assert!((stats.fault_std.unwrap() - 0.02f64.sqrt()).abs() < 1e-12);
        assert!((stats.cavity_mean.unwrap() - 0.75).abs() < 1e-12);

        // A single member has a mean but no sample deviation
        let stats = rows[1].stats.unwrap();
        assert_eq!(stats.fault_mean, Some(0.9));
        assert_eq!(stats.fault_std, None);
    }

    #[test]
    fn test_label_counts() {
        let events = vec![
            event("1L22", Some(("4", 0.5)), Some(("Quench", 0.2))),
            event("1L22", None, None),
            event("0L04", None, None),
        ];
        let counts = label_counts(&events);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0].zone, "0L04");
        assert_eq!((counts[0].labeled, counts[0].unlabeled), (0, 1));
        assert_eq!((counts[1].labeled, counts[1].unlabeled), (1, 1));
        assert_eq!(counts[2].zone, "All");
        assert_eq!(counts[2].total(), 3);
    }

    #[test]
    fn test_label_counts_without_events() {
        let counts = label_counts(&[]);
        assert_eq!(
            counts,
            vec![LabelCount {
                zone: String::from("All"),
                labeled: 0,
                unlabeled: 0
            }]
        );
    }
}
