/// Engine facade — global logging singleton.
///
/// The spatial core itself is single-threaded and lock-free; the only
/// global state it carries is the logger, stored behind a RwLock so that
/// any thread may emit log entries and tests may swap the backend.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (initialized lazily with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Engine facade for crate-wide services.
///
/// Currently only hosts the logging backend. The `engine_*!` macros route
/// through `Engine::log` / `Engine::log_detailed`.
pub struct Engine;

impl Engine {
    fn logger() -> &'static RwLock<Box<dyn Logger>> {
        LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
    }

    /// Replace the global logger.
    ///
    /// Takes effect immediately for all subsequent log calls.
    pub fn set_logger(logger: Box<dyn Logger>) {
        if let Ok(mut current) = Self::logger().write() {
            *current = logger;
        }
    }

    /// Log a message through the global logger.
    ///
    /// Used by the `engine_trace!` through `engine_warn!` macros.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let entry = LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        };
        if let Ok(logger) = Self::logger().read() {
            logger.log(&entry);
        }
    }

    /// Log a message with source location details.
    ///
    /// Used by the `engine_error!` macro to include file:line.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let entry = LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        };
        if let Ok(logger) = Self::logger().read() {
            logger.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
