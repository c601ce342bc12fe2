use serde::Deserialize;
use time::{PrimitiveDateTime, UtcOffset};

use super::constants::{CAVITY_LABEL_NAME, FAULT_LABEL_NAME};
use super::error::EventError;
use super::time_range::parse_datetime;

/// The envelope returned by the wfbrowser event endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EventResponse {
    pub events: Vec<RawEvent>,
}

/// An event as the web service reports it. `id`, `location` and `datetime_utc` are
/// required; everything else may be absent or null.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub id: u64,
    pub location: String,
    pub datetime_utc: String,
    pub system: Option<String>,
    pub labels: Option<Vec<RawLabel>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLabel {
    pub name: String,
    pub value: Option<String>,
    pub confidence: Option<f64>,
}

impl RawEvent {
    pub fn is_unlabeled(&self) -> bool {
        self.labels.as_ref().map_or(true, |l| l.is_empty())
    }
}

/// A flattened RF fault event with its timestamp in local time.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u64,
    pub zone: String,
    pub datetime: PrimitiveDateTime,
    pub fault_label: Option<String>,
    pub fault_confidence: Option<f64>,
    pub cavity_label: Option<String>,
    pub cavity_confidence: Option<f64>,
}

impl Event {
    /// The linac is encoded in the first two characters of the zone
    pub fn linac(&self) -> &str {
        self.zone.get(0..2).unwrap_or(&self.zone)
    }

    /// An event counts as labeled once the model assigned it a fault type
    pub fn is_labeled(&self) -> bool {
        self.fault_label.is_some()
    }
}

/// Flatten raw events into Events.
///
/// Only the `cavity` and `fault-type` labels are read. Events without either of them are
/// dropped unless `include_unlabeled` is set, in which case they are kept with empty
/// label fields. Timestamps are converted from UTC to `offset`.
///
/// The same fixed offset is applied to every event, so a window spanning a daylight saving
/// change has the events on the far side an hour off in local time.
pub fn normalize(
    raw_events: &[RawEvent],
    include_unlabeled: bool,
    offset: UtcOffset,
) -> Result<Vec<Event>, EventError> {
    let mut events = Vec::with_capacity(raw_events.len());
    for raw in raw_events {
        let mut cavity: (Option<String>, Option<f64>) = (None, None);
        let mut fault: (Option<String>, Option<f64>) = (None, None);
        for label in raw.labels.iter().flatten() {
            if label.name == CAVITY_LABEL_NAME {
                cavity = (label.value.clone(), label.confidence);
            } else if label.name == FAULT_LABEL_NAME {
                fault = (label.value.clone(), label.confidence);
            }
        }

        if cavity.0.is_none() && fault.0.is_none() && !include_unlabeled {
            continue;
        }

        if raw.location.is_empty() {
            return Err(EventError::EmptyLocation(raw.id));
        }

        events.push(Event {
            id: raw.id,
            zone: raw.location.clone(),
            datetime: utc_to_local(raw, offset)?,
            fault_label: fault.0,
            fault_confidence: fault.1,
            cavity_label: cavity.0,
            cavity_confidence: cavity.1,
        });
    }
    Ok(events)
}

fn utc_to_local(raw: &RawEvent, offset: UtcOffset) -> Result<PrimitiveDateTime, EventError> {
    let utc = parse_datetime(&raw.datetime_utc).map_err(|_| EventError::BadTimestamp {
        id: raw.id,
        value: raw.datetime_utc.clone(),
    })?;
    let local = utc.assume_utc().to_offset(offset);
    Ok(PrimitiveDateTime::new(local.date(), local.time()))
}
