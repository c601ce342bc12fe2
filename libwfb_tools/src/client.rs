use std::fmt;
use std::io::Read;

use super::constants::{EVENT_LABEL_PATH, EVENT_PATH, LABEL_SUMMARY_PATH, RF_SYSTEM, SCREENSHOT_PATH};
use super::error::FetchError;
use super::event::{EventResponse, RawEvent};
use super::time_range::{format_datetime, format_query_datetime, TimeRange};

/// Timeline layout of the RF label summary report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineMode {
    Single,
    Separate,
}

impl fmt::Display for TimelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Separate => write!(f, "separate"),
        }
    }
}

/// Heatmap grouping of the RF label summary report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatmapMode {
    Zone,
    Linac,
}

impl fmt::Display for HeatmapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zone => write!(f, "zone"),
            Self::Linac => write!(f, "linac"),
        }
    }
}

/// A rendered report page: the PNG screenshot and the page it was taken of
#[derive(Debug, Clone)]
pub struct ReportImage {
    pub bytes: Vec<u8>,
    pub report_url: String,
}

/// Build the URL of an RF label summary report.
///
/// The query string is assembled by hand since the report page expects its timestamps
/// as `YYYY-MM-DD+HH:MM:SS` and the confidence operator unescaped.
pub fn label_summary_url(
    report_base: &str,
    range: &TimeRange,
    locations: &[String],
    timeline: TimelineMode,
    heatmap: HeatmapMode,
) -> String {
    let begin = format_query_datetime(&range.start());
    let end = format_query_datetime(&range.end());
    let mut url = format!("{report_base}{LABEL_SUMMARY_PATH}?begin={begin}&end={end}");
    url.push_str(&format!(
        "&timeline={timeline}&isLabeled=true&conf=0.0&confOp=>"
    ));
    for location in locations {
        url.push_str(&format!("&location={location}"));
    }
    url.push_str(&format!("&heatmap={heatmap}"));
    url
}

/// Query parameters of an RF event listing for the given window
pub fn event_query(range: &TimeRange) -> Vec<(&'static str, String)> {
    vec![
        ("system", String::from(RF_SYSTEM)),
        ("out", String::from("json")),
        ("includeData", String::from("false")),
        ("begin", format_datetime(&range.start())),
        ("end", format_datetime(&range.end())),
    ]
}

/// Blocking client for the wfbrowser web services.
///
/// Certificates are verified against the operating system trust store, so servers
/// signed by a site-internal CA are accepted.
#[derive(Debug, Clone)]
pub struct WfbClient {
    agent: ureq::Agent,
    data_base: String,
    report_base: String,
}

impl WfbClient {
    /// Create a client. The bases are scheme and host, e.g. `https://accweb.acc.jlab.org`
    pub fn new(data_base: &str, report_base: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            data_base: data_base.trim_end_matches('/').to_string(),
            report_base: report_base.trim_end_matches('/').to_string(),
        }
    }

    /// Client for https hosts named in a config
    pub fn from_hosts(data_server: &str, report_server: &str) -> Self {
        Self::new(
            &format!("https://{data_server}"),
            &format!("https://{report_server}"),
        )
    }

    /// Download the metadata of all RF events in the window
    pub fn fetch_events(&self, range: &TimeRange) -> Result<Vec<RawEvent>, FetchError> {
        self.fetch_event_list(&event_query(range))
    }

    /// Download the metadata of every event the service knows about
    pub fn fetch_all_events(&self) -> Result<Vec<RawEvent>, FetchError> {
        self.fetch_event_list(&[
            ("out", String::from("json")),
            ("includeData", String::from("false")),
        ])
    }

    fn fetch_event_list(&self, query: &[(&str, String)]) -> Result<Vec<RawEvent>, FetchError> {
        let url = format!("{}{EVENT_PATH}", self.data_base);
        let response = self.get(&url, query)?;
        let body: EventResponse = serde_json::from_reader(response.into_reader())?;
        spdlog::debug!("Received {} events from {}", body.events.len(), url);
        Ok(body.events)
    }

    /// Render an RF label summary report to PNG through the screenshot service
    pub fn fetch_report_image(
        &self,
        range: &TimeRange,
        locations: &[String],
        timeline: TimelineMode,
        heatmap: HeatmapMode,
    ) -> Result<ReportImage, FetchError> {
        let report_url = label_summary_url(&self.report_base, range, locations, timeline, heatmap);
        let url = format!("{}{SCREENSHOT_PATH}", self.report_base);
        let response = self.get(
            &url,
            &[
                ("url", report_url.clone()),
                ("fullPage", String::from("true")),
                ("waitForSelector", String::from("span.done")),
            ],
        )?;
        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        spdlog::debug!(
            "Received {} report image for {}",
            human_bytes::human_bytes(bytes.len() as f64),
            report_url
        );
        Ok(ReportImage { bytes, report_url })
    }

    /// Submit a label for an event. Returns the response status and body, whatever the
    /// status; only transport failures are errors.
    pub fn post_label(&self, event_id: u64, label_json: &str) -> Result<(u16, String), FetchError> {
        let url = format!("{}{EVENT_LABEL_PATH}", self.data_base);
        let id = event_id.to_string();
        let response = match self
            .agent
            .post(&url)
            .send_form(&[("id", id.as_str()), ("label", label_json)])
        {
            Ok(r) => r,
            Err(ureq::Error::Status(_, r)) => r,
            Err(ureq::Error::Transport(t)) => return Err(FetchError::Transport(url, t.to_string())),
        };
        let status = response.status();
        Ok((status, response.into_string()?))
    }

    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<ureq::Response, FetchError> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        match request.call() {
            Ok(response) if response.status() == 200 => Ok(response),
            Ok(response) => Err(FetchError::Status(response.status(), url.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(FetchError::Status(code, url.to_string())),
            Err(ureq::Error::Transport(t)) => {
                Err(FetchError::Transport(url.to_string(), t.to_string()))
            }
        }
    }
}
