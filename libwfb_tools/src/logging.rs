use std::sync::Arc;

use spdlog::formatter::{pattern, PatternFormatter};
use spdlog::sink::{StdStream, StdStreamSink};
use spdlog::{Level, LevelFilter, Logger};

/// Install the default logger for a command line tool.
///
/// Everything goes to stderr, leaving stdout free for reports. `verbose` lowers the
/// level from info to debug.
pub fn init_logger(verbose: bool) -> Result<(), spdlog::Error> {
    let level = if verbose { Level::Debug } else { Level::Info };
    let sink = Arc::new(
        StdStreamSink::builder()
            .std_stream(StdStream::Stderr)
            .formatter(Box::new(PatternFormatter::new(pattern!(
                "[{date_short} {time_short}] - [{^{level}}] - {payload}{eol}"
            ))))
            .build()?,
    );
    let logger = Arc::new(
        Logger::builder()
            .level_filter(LevelFilter::MoreSevereEqual(level))
            .flush_level_filter(LevelFilter::All)
            .sink(sink)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger() {
        init_logger(true).unwrap();
        spdlog::debug!("debug logging enabled");
        assert!(spdlog::default_logger().should_log(Level::Debug));
        assert!(!spdlog::default_logger().should_log(Level::Trace));
    }
}
