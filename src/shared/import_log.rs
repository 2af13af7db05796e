//! Per-call log collaborator.
//!
//! Each import gets its own `ImportLog`; entries are mirrored to `tracing`
//! and kept in order so callers can show them or fold them into a shared
//! ring buffer.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Capacity of the shared ring buffer kept by long-running callers
pub const LOG_RING_CAPACITY: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: &str, source: &str, message: &str) -> Self {
        Self {
            time: Local::now().format("%H:%M:%S").to_string(),
            level: level.to_string(),
            source: source.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportLog {
    source: String,
    entries: Vec<LogEntry>,
}

impl ImportLog {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn info(&mut self, message: &str) {
        tracing::info!(source = %self.source, "{}", message);
        self.push("INFO", message);
    }

    pub fn warn(&mut self, message: &str) {
        tracing::warn!(source = %self.source, "{}", message);
        self.push("WARN", message);
    }

    pub fn error(&mut self, message: &str) {
        tracing::error!(source = %self.source, "{}", message);
        self.push("ERROR", message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    fn push(&mut self, level: &str, message: &str) {
        self.entries.push(LogEntry::new(level, &self.source, message));
    }
}

/// Append to a bounded shared buffer, dropping the oldest entries
pub fn append_to_ring(logs: &Mutex<Vec<LogEntry>>, entries: impl IntoIterator<Item = LogEntry>) {
    let mut logs = match logs.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    logs.extend(entries);
    if logs.len() > LOG_RING_CAPACITY {
        let excess = logs.len() - LOG_RING_CAPACITY;
        logs.drain(..excess);
    }
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    append_to_ring(logs, [LogEntry::new(level, source, message)]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order_and_level() {
        let mut log = ImportLog::new("MUNICIPIOS");
        log.info("start");
        log.warn("line 2 rejected");
        log.error("aborted");

        let levels: Vec<&str> = log.entries().iter().map(|e| e.level.as_str()).collect();
        assert_eq!(levels, vec!["INFO", "WARN", "ERROR"]);
        assert!(log.entries().iter().all(|e| e.source == "MUNICIPIOS"));
    }

    #[test]
    fn test_ring_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(LOG_RING_CAPACITY + 5) {
            add_log(&logs, "INFO", "HTTP", &format!("entry {}", i));
        }

        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), LOG_RING_CAPACITY);
        assert_eq!(logs[0].message, "entry 5");
    }
}
