use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;

/// The global logger object.
static LOGGER: Logger = Logger::new();

/// Logging mechanism for bootsync.
/// Every line of a message is written to standard error, prefixed with its level.
pub struct Logger;

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a new logger.
    pub const fn new() -> Self {
        Self
    }
}

impl Log for Logger {
    /// Enable the logger for every level allowed by the maximum level.
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    /// Log the specified `record` to standard error.
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Format the log message.
        let message = format!("{}", record.args());

        // Hold the lock for the whole message so lines from other threads do not interleave.
        let mut output = std::io::stderr().lock();

        // The format writes the log level in front of every line of text.
        for line in message.lines() {
            let _ = writeln!(output, "[{:>5}] {}", record.level(), line);
        }
    }

    /// Standard error is not buffered, so flushing isn't required.
    fn flush(&self) {}
}

/// Initialize the logging environment at the info level.
pub fn init() -> Result<()> {
    // Set the logger to the global logger.
    log::set_logger(&LOGGER).context("unable to set logger")?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}

/// Enables or disables debug logging.
pub fn set_debug(debug: bool) {
    log::set_max_level(if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}
