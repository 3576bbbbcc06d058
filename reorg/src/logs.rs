//! Pipeline logging.
//!
//! Log entries go to stderr (stdout may carry the output dataset) and are
//! broadcast to any subscriber, so embedding code and tests can observe
//! what the pipeline reported.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::broadcast;

/// Log level, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Success = 2,
    Warning = 3,
    Error = 4,
}

impl LogLevel {
    /// Parse a level name as used by `REORG_LOG`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "debug" | "trace" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "success" => Some(LogLevel::Success),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" | "quiet" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Success,
            3 => LogLevel::Warning,
            _ => LogLevel::Error,
        }
    }
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn debug(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Debug, message: message.into(), indent: 0 }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Prints log entries and broadcasts them to subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    threshold: AtomicU8,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            sender,
            threshold: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Minimum level printed to stderr.
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.threshold.store(level as u8, Ordering::Relaxed);
    }

    /// Print an entry (if above the threshold) and send it to all subscribers
    pub fn log(&self, entry: LogEntry) {
        if entry.level >= self.level() {
            let prefix = match entry.level {
                LogLevel::Debug => "   ·",
                LogLevel::Info => "   ",
                LogLevel::Success => "   ✓",
                LogLevel::Warning => "   ⚠️",
                LogLevel::Error => "   ❌",
            };
            let indent = "   ".repeat(entry.indent as usize);
            eprintln!("{}{} {}", indent, prefix, entry.message);
        }

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for every entry logged from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Set the global stderr threshold.
pub fn set_level(level: LogLevel) {
    LOG_BROADCASTER.set_level(level);
}

/// Convenient logging functions
pub fn log_debug(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::debug(msg));
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!(LogLevel::parse(" WARN "), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("quiet"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn test_subscriber_receives_entries_below_threshold() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.set_level(LogLevel::Error);
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::debug("hidden from stderr"));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Debug);
        assert_eq!(entry.message, "hidden from stderr");
    }

    #[test]
    fn test_log_error_reaches_global_subscribers() {
        let mut rx = LOG_BROADCASTER.subscribe();

        log_error("Error: no columns declared");

        // Other tests may log through the global broadcaster concurrently.
        let entry = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|e| e.message == "Error: no columns declared")
            .unwrap();
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.indent, 0);
    }
}
