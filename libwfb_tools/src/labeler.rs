use rand::Rng;

use super::client::WfbClient;
use super::constants::{
    CAVITY_LABELS, CAVITY_LABEL_NAME, FAULT_LABELS, FAULT_LABEL_NAME, RF_SYSTEM,
};
use super::error::LabelerError;
use super::event::RawEvent;

/// Tally of a labeling pass. An event counts as labeled once any of its labels was accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSummary {
    pub labeled: usize,
    pub skipped: usize,
    pub rejected_posts: usize,
}

/// The RF events that still need labels, in the order the service returned them
pub fn events_to_label(events: &[RawEvent]) -> Vec<&RawEvent> {
    events
        .iter()
        .filter(|e| e.system.as_deref() == Some(RF_SYSTEM) && e.is_unlabeled())
        .collect()
}

/// Assigns random cavity and fault-type labels to unlabeled RF events. Test data only.
#[derive(Debug)]
pub struct RandomLabeler<R: Rng> {
    model_name: String,
    rng: R,
}

impl<R: Rng> RandomLabeler<R> {
    pub fn new(model_name: &str, rng: R) -> Self {
        Self {
            model_name: model_name.to_string(),
            rng,
        }
    }

    /// Label JSON for a value drawn uniformly from `choices`, with a confidence in [0, 1)
    pub fn random_label(&mut self, name: &str, choices: &[&str]) -> String {
        let value = choices[self.rng.gen_range(0..choices.len())];
        let confidence: f64 = self.rng.gen();
        serde_json::json!({
            "model-name": self.model_name,
            "name": name,
            "value": value,
            "confidence": confidence,
        })
        .to_string()
    }

    /// Fetch every event and post a cavity and a fault-type label for each unlabeled RF event
    pub fn label_events(&mut self, client: &WfbClient) -> Result<LabelSummary, LabelerError> {
        let events = client.fetch_all_events()?;
        let targets = events_to_label(&events);
        let mut summary = LabelSummary {
            skipped: events.len() - targets.len(),
            ..Default::default()
        };
        for event in events.iter().filter(|e| !e.is_unlabeled()) {
            spdlog::info!("Event {} is already labeled, skipping", event.id);
        }

        for event in targets {
            let labels = [
                self.random_label(CAVITY_LABEL_NAME, &CAVITY_LABELS),
                self.random_label(FAULT_LABEL_NAME, &FAULT_LABELS),
            ];
            let mut accepted = false;
            for label in labels {
                let (status, body) = client.post_label(event.id, &label)?;
                if status == 200 {
                    spdlog::info!("Event {}: {} {}", event.id, status, body.trim());
                    accepted = true;
                } else {
                    spdlog::warn!("Event {}: {} {}", event.id, status, body.trim());
                    summary.rejected_posts += 1;
                }
            }
            if accepted {
                summary.labeled += 1;
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_server::serve;
    use crate::event::RawLabel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn raw(id: u64, system: Option<&str>, labels: Option<Vec<RawLabel>>) -> RawEvent {
        RawEvent {
            id,
            location: String::from("1L22"),
            datetime_utc: String::from("2020-01-01 00:00:00.0"),
            system: system.map(String::from),
            labels,
        }
    }

    #[test]
    fn test_events_to_label() {
        let label = RawLabel {
            name: String::from("cavity"),
            value: Some(String::from("3")),
            confidence: Some(0.5),
        };
        let events = vec![
            raw(1, Some("rf"), None),
            raw(2, Some("rf"), Some(vec![label])),
            raw(3, Some("acclrm"), None),
            raw(4, None, None),
            raw(5, Some("rf"), Some(vec![])),
        ];
        let ids: Vec<u64> = events_to_label(&events).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn test_random_label_shape() {
        let mut labeler = RandomLabeler::new("test_model", StdRng::seed_from_u64(42));
        for _ in 0..20 {
            let label: serde_json::Value =
                serde_json::from_str(&labeler.random_label(FAULT_LABEL_NAME, &FAULT_LABELS))
                    .unwrap();
            assert_eq!(label["model-name"], "test_model");
            assert_eq!(label["name"], "fault-type");
            let value = label["value"].as_str().unwrap();
            assert!(FAULT_LABELS.contains(&value));
            let confidence = label["confidence"].as_f64().unwrap();
            assert!((0.0..1.0).contains(&confidence));
        }
    }

    #[test]
    fn test_seeded_labels_repeat() {
        let mut first = RandomLabeler::new("m", StdRng::seed_from_u64(7));
        let mut second = RandomLabeler::new("m", StdRng::seed_from_u64(7));
        assert_eq!(
            first.random_label(CAVITY_LABEL_NAME, &CAVITY_LABELS),
            second.random_label(CAVITY_LABEL_NAME, &CAVITY_LABELS)
        );
    }

    const EVENTS: &str = r#"{"events": [
        {"id": 11, "location": "1L22", "datetime_utc": "2020-01-01 00:00:00.0",
         "system": "rf", "labels": null},
        {"id": 12, "location": "1L23", "datetime_utc": "2020-01-01 00:00:00.0",
         "system": "rf", "labels": null},
        {"id": 13, "location": "1L24", "datetime_utc": "2020-01-01 00:00:00.0",
         "system": "rf", "labels": [{"name": "cavity", "value": "2", "confidence": 0.4}]}
    ]}"#;

    #[test]
    fn test_rejected_events_are_not_counted() {
        let (base, server) = serve(vec![
            (200, EVENTS),
            (500, "no"),
            (500, "no"),
            (200, "ok"),
            (500, "no"),
        ]);
        let client = WfbClient::new(&base, &base);
        let mut labeler = RandomLabeler::new("m", StdRng::seed_from_u64(3));
        let summary = labeler.label_events(&client).unwrap();
        assert_eq!(
            summary,
            LabelSummary {
                labeled: 1,
                skipped: 1,
                rejected_posts: 3,
            }
        );

        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 5);
        assert!(seen[1].1.starts_with("id=11&"));
        assert!(seen[3].1.starts_with("id=12&"));
    }
}
