//! Unit tests for engine.rs
//!
//! The logger is global state, so every test that swaps it runs serially
//! and restores the default logger before finishing.

use std::sync::{Arc, Mutex};
use serial_test::serial;
use crate::engine::Engine;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Test logger that captures entries into a shared buffer.
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

fn install_capture_logger() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(Box::new(CaptureLogger {
        entries: Arc::clone(&entries),
    }));
    entries
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_log_routes_through_installed_logger() {
    let entries = install_capture_logger();

    Engine::log(LogSeverity::Info, "meridian3d::Test", "captured".to_string());

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, LogSeverity::Info);
        assert_eq!(entries[0].source, "meridian3d::Test");
        assert_eq!(entries[0].message, "captured");
        assert!(entries[0].file.is_none());
    }

    Engine::set_logger(Box::new(DefaultLogger));
}

#[test]
#[serial]
fn test_log_detailed_includes_location() {
    let entries = install_capture_logger();

    Engine::log_detailed(
        LogSeverity::Error,
        "meridian3d::Test",
        "boom".to_string(),
        "engine_tests.rs",
        99,
    );

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, Some("engine_tests.rs"));
        assert_eq!(entries[0].line, Some(99));
    }

    Engine::set_logger(Box::new(DefaultLogger));
}

#[test]
#[serial]
fn test_macros_route_through_engine() {
    let entries = install_capture_logger();

    crate::engine_debug!("meridian3d::Test", "value = {}", 7);
    crate::engine_warn!("meridian3d::Test", "watch out");
    crate::engine_error!("meridian3d::Test", "failed: {}", "reason");

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].severity, LogSeverity::Debug);
        assert_eq!(entries[0].message, "value = 7");
        assert_eq!(entries[1].severity, LogSeverity::Warn);
        assert_eq!(entries[2].severity, LogSeverity::Error);
        assert!(entries[2].file.is_some());
        assert!(entries[2].line.is_some());
    }

    Engine::set_logger(Box::new(DefaultLogger));
}
