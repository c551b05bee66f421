//! Per-process log entries and the bounded ring that stores them.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Source of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Stdout,
    Stderr,
    System,
}

/// One line appended to a process's log ring.
///
/// `content` never contains a trailing newline; invalid UTF-8 byte
/// sequences are replaced with the replacement character before a line
/// reaches this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: u64,
    pub kind: LogKind,
    pub content: String,
}

/// Fixed-capacity FIFO of [`LogEntry`] values.
///
/// Appending past capacity silently evicts the oldest entry; no event is
/// raised for the eviction.
#[derive(Debug, Clone)]
pub struct LogRing {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

/// Default ring capacity, matching `Config::ring_capacity`'s default.
pub const DEFAULT_RING_CAPACITY: usize = 1000;

impl Default for LogRing {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

impl LogRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Append an entry, evicting the oldest if the ring is at capacity.
    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of entries in insertion order, optionally filtered by kind
    /// and limited to the most recent `tail` entries.
    pub fn read(&self, kind: Option<LogKind>, tail: Option<usize>) -> Vec<LogEntry> {
        let filtered: Vec<LogEntry> = self
            .entries
            .iter()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .cloned()
            .collect();
        match tail {
            Some(n) if n < filtered.len() => filtered[filtered.len() - n..].to_vec(),
            _ => filtered,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
