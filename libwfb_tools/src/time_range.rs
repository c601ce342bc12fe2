use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use super::error::TimeRangeError;

type DateTimeParser = fn(&str) -> Result<PrimitiveDateTime, time::error::Parse>;

fn parse_fractional(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    )
}

fn parse_seconds(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
}

fn parse_minutes(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day] [hour]:[minute]"))
}

fn parse_date(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    Date::parse(s, format_description!("[year]-[month]-[day]")).map(Date::midnight)
}

/// Supported datetime string formats, most specific first. The first pattern that matches
/// decides the parser; later entries are never tried for that string.
static DATETIME_FORMATS: Lazy<Vec<(Regex, DateTimeParser)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{1,6}$").expect("valid pattern"),
            parse_fractional as DateTimeParser,
        ),
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("valid pattern"),
            parse_seconds as DateTimeParser,
        ),
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}$").expect("valid pattern"),
            parse_minutes as DateTimeParser,
        ),
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid pattern"),
            parse_date as DateTimeParser,
        ),
    ]
});

/// Parse a user supplied datetime string.
///
/// Accepts `YYYY-MM-DD HH:MM:SS.f` (1-6 fractional digits), `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DD HH:MM` and `YYYY-MM-DD`. The result carries no offset; callers treat it
/// as local time.
pub fn parse_datetime(datetime_string: &str) -> Result<PrimitiveDateTime, TimeRangeError> {
    for (pattern, parser) in DATETIME_FORMATS.iter() {
        if pattern.is_match(datetime_string) {
            return parser(datetime_string)
                .map_err(|_| TimeRangeError::InvalidFormat(datetime_string.to_string()));
        }
    }
    Err(TimeRangeError::InvalidFormat(datetime_string.to_string()))
}

const DISPLAY_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const QUERY_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]+[hour]:[minute]:[second]");

fn format_with(dt: &PrimitiveDateTime, format: &[BorrowedFormatItem<'_>]) -> String {
    // Only date and time components are requested, which a PrimitiveDateTime always has
    dt.format(format).unwrap_or_else(|_| dt.to_string())
}

/// Format as `YYYY-MM-DD HH:MM:SS`, the layout the web services expect.
pub fn format_datetime(dt: &PrimitiveDateTime) -> String {
    format_with(dt, DISPLAY_FORMAT)
}

/// Format as `YYYY-MM-DD+HH:MM:SS`, the layout the report pages take in their URLs.
pub fn format_query_datetime(dt: &PrimitiveDateTime) -> String {
    format_with(dt, QUERY_FORMAT)
}

/// Read the local UTC offset. Must be called before any threads are spawned; falls back
/// to UTC when the platform refuses to report it.
///
/// This is the offset in effect now, not a time zone. Applying it to timestamps from the
/// other side of a daylight saving change shifts them by the difference.
pub fn local_offset() -> UtcOffset {
    match UtcOffset::current_local_offset() {
        Ok(offset) => offset,
        Err(e) => {
            spdlog::warn!("Could not determine the local time zone ({e}); using UTC");
            UtcOffset::UTC
        }
    }
}

/// The current wall clock time at the given offset
pub fn local_now(offset: UtcOffset) -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc().to_offset(offset);
    PrimitiveDateTime::new(now.date(), now.time())
}

/// A closed time window in local time. Construction guarantees `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
}

impl TimeRange {
    pub fn new(start: PrimitiveDateTime, end: PrimitiveDateTime) -> Result<Self, TimeRangeError> {
        if start > end {
            return Err(TimeRangeError::InvalidRange {
                start: format_datetime(&start),
                end: format_datetime(&end),
            });
        }
        Ok(Self { start, end })
    }

    /// Fill in a missing start or end from the defaults, then validate the window
    pub fn resolve(
        start: Option<PrimitiveDateTime>,
        end: Option<PrimitiveDateTime>,
        start_default: PrimitiveDateTime,
        end_default: PrimitiveDateTime,
    ) -> Result<Self, TimeRangeError> {
        Self::new(start.unwrap_or(start_default), end.unwrap_or(end_default))
    }

    /// Resolve against a window of `lookback` ending at `now`
    pub fn resolve_lookback(
        start: Option<PrimitiveDateTime>,
        end: Option<PrimitiveDateTime>,
        now: PrimitiveDateTime,
        lookback: Duration,
    ) -> Result<Self, TimeRangeError> {
        Self::resolve(start, end, now - lookback, now)
    }

    pub fn start(&self) -> PrimitiveDateTime {
        self.start
    }

    pub fn end(&self) -> PrimitiveDateTime {
        self.end
    }
}
