//! Process records: the authoritative shape of one spawned child.

use crate::id::ProcessId;
use crate::log::{LogEntry, LogKind, LogRing};
use crate::status::Status;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fields supplied by the caller when starting a process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// `command[0]` is the executable, the rest its arguments.
    pub command: Vec<String>,
    pub title: String,
    pub name: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: Option<String>,
}

/// A spawned process as tracked by the registry.
///
/// `id`, `command`, and the identity of the record never change after
/// creation; everything else is mutated by the lifecycle controller via
/// [`crate::process::ProcessRecord::apply_patch`]-style merges in the
/// registry layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub title: String,
    pub name: Option<String>,
    pub command: Vec<String>,
    pub status: Status,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
    pub exit_signal: Option<String>,
    #[serde(skip)]
    pub logs: LogRing,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ProcessRecord {
    /// Create a new record in the initial `starting` state.
    pub fn new(id: ProcessId, request: &SpawnRequest, now_ms: u64, ring_capacity: usize) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(
            "originalRequest".to_string(),
            serde_json::to_value(request).unwrap_or(serde_json::Value::Null),
        );
        Self {
            id,
            title: request.title.clone(),
            name: request.name.clone(),
            command: request.command.clone(),
            status: Status::Starting,
            start_time: now_ms,
            end_time: None,
            pid: None,
            exit_code: None,
            exit_signal: None,
            logs: LogRing::new(ring_capacity),
            metadata,
        }
    }

    pub fn push_log(&mut self, kind: LogKind, content: String, now_ms: u64) -> LogEntry {
        let entry = LogEntry {
            timestamp: now_ms,
            kind,
            content,
        };
        self.logs.push(entry.clone());
        entry
    }

    /// Runtime in milliseconds, if the process has a recorded end time.
    pub fn runtime_ms(&self) -> Option<u64> {
        self.end_time.map(|end| end.saturating_sub(self.start_time))
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
