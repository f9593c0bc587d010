//! Console logger

use super::memory::LogLevel;
use super::traits::Logger;

/// Writes `<prefix> LEVEL: message` lines to stderr, dropping entries below
/// `min_level`
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self {
            prefix: "[Toolweave]".to_string(),
            min_level: LogLevel::Debug,
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::new()
        }
    }

    /// Only write entries at `level` or above
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn write(&self, level: LogLevel, message: &str) {
        if self.enabled(level) {
            eprintln!("{} {}: {}", self.prefix, level, message);
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.write(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }
}
