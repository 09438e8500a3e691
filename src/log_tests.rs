//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, and DefaultLogger.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::time::SystemTime;

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_equality() {
    assert_eq!(LogSeverity::Debug, LogSeverity::Debug);
    assert_ne!(LogSeverity::Trace, LogSeverity::Error);
}

#[test]
fn test_log_severity_copy() {
    let sev1 = LogSeverity::Info;
    let sev2 = sev1; // Copy, not move
    assert_eq!(sev1, sev2);
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_construction() {
    let entry = LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "meridian3d::Test".to_string(),
        message: "hello".to_string(),
        file: None,
        line: None,
    };

    assert_eq!(entry.severity, LogSeverity::Info);
    assert_eq!(entry.source, "meridian3d::Test");
    assert_eq!(entry.message, "hello");
    assert!(entry.file.is_none());
    assert!(entry.line.is_none());
}

#[test]
fn test_log_entry_clone() {
    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "meridian3d::Test".to_string(),
        message: "broken".to_string(),
        file: Some("test.rs"),
        line: Some(42),
    };

    let cloned = entry.clone();
    assert_eq!(cloned.severity, entry.severity);
    assert_eq!(cloned.source, entry.source);
    assert_eq!(cloned.message, entry.message);
    assert_eq!(cloned.file, entry.file);
    assert_eq!(cloned.line, entry.line);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_does_not_panic() {
    let logger = DefaultLogger;

    logger.log(&LogEntry {
        severity: LogSeverity::Debug,
        timestamp: SystemTime::now(),
        source: "meridian3d::Test".to_string(),
        message: "plain entry".to_string(),
        file: None,
        line: None,
    });

    logger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "meridian3d::Test".to_string(),
        message: "detailed entry".to_string(),
        file: Some("log_tests.rs"),
        line: Some(1),
    });
}
