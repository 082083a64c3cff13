// src/utils/logger.rs

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::sync::OnceLock;

static MAX_LEVEL: OnceLock<LevelFilter> = OnceLock::new();
static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

/// Installs the stderr logger. Fails if another logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  let _ = MAX_LEVEL.set(level);
  log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Parses a level name from the config ("error", "warn", "info", "debug", "trace", "off").
pub fn parse_level(name: &str) -> Option<LevelFilter> {
  name.trim().parse().ok()
}

impl log::Log for StderrLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= *MAX_LEVEL.get().unwrap_or(&LevelFilter::Info)
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      let tag = match record.level() {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
      };

      // Format: "[warn ] No config found. Using defaults."
      let mut err = std::io::stderr().lock();
      let _ = writeln!(err, "[{:<5}] {}", tag, record.args());
    }
  }

  fn flush(&self) {
    let _ = std::io::stderr().flush();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_level() {
    assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
    assert_eq!(parse_level(" WARN "), Some(LevelFilter::Warn));
    assert_eq!(parse_level("off"), Some(LevelFilter::Off));
    assert_eq!(parse_level("loud"), None);
  }
}
