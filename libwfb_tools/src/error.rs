use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("Invalid datetime string format: {0:?}")]
    InvalidFormat(String),
    #[error("Start ({start}) must be earlier than end ({end})")]
    InvalidRange { start: String, end: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Received non-ok response {0} from {1}")]
    Status(u16, String),
    #[error("Request to {0} failed: {1}")]
    Transport(String, String),
    #[error("Failed to read response body: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Failed to parse JSON response: {0}")]
    ParsingError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event {id} has an unreadable datetime_utc value {value:?}")]
    BadTimestamp { id: u64, value: String },
    #[error("Event {0} has an empty location")]
    EmptyLocation(u64),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid email address {0}")]
    InvalidAddress(String),
    #[error("Notifier could not parse a mailbox: {0}")]
    MailboxError(#[from] lettre::address::AddressError),
    #[error("Notifier failed to build the message: {0}")]
    MessageError(#[from] lettre::error::Error),
    #[error("Notifier failed to send through the SMTP relay: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),
    #[error("Notifier was given a bad attachment content type: {0}")]
    ContentTypeError(#[from] lettre::message::header::ContentTypeErr),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("Converter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0:?}: not found")]
    DirNotFound(PathBuf),
    #[error("{0:?}: already exists")]
    OutputExists(PathBuf),
    #[error("Unsupported filename format - {0}")]
    BadFileName(String),
    #[error("deltaT not defined in header.")]
    DeltaTNotDefined,
    #[error("Malformed header line: {0:?}")]
    BadHeaderLine(String),
    #[error("Could not parse deltaT value {0:?}: {1}")]
    BadDeltaT(String, std::num::ParseFloatError),
}

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("Invalid check {0:?}; expected one of fault, cavity, zone, linac")]
    InvalidCheck(String),
    #[error("Checker failed due to time range error: {0}")]
    TimeRangeError(#[from] TimeRangeError),
    #[error("Checker failed due to fetch error: {0}")]
    FetchError(#[from] FetchError),
    #[error("Checker failed due to event error: {0}")]
    EventError(#[from] EventError),
    #[error("Checker failed due to notify error: {0}")]
    NotifyError(#[from] NotifyError),
}

#[derive(Debug, Error)]
pub enum LabelerError {
    #[error("Labeler failed due to fetch error: {0}")]
    FetchError(#[from] FetchError),
}
