//! Gateway → client frames: request responses and broadcast events.

use serde::{Deserialize, Serialize};
use supervisor_core::{LogEntry, ProcessRecord, Status};

/// Machine-readable error codes, matching the error kinds in the error
/// handling design: validation, not-found, bad transition, and the
/// framing-level failures the gateway itself can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    RequestError,
    NotFound,
    InvalidStateTransition,
    SpawnFailure,
    TerminationFailure,
    TransportFailure,
    MessageProcessingError,
    UnknownMessageType,
}

/// One frame sent from the gateway to a session, tagged on the wire by
/// `type`. A frame is either the single response to a request or a
/// broadcast forwarded from the event bus; clients distinguish the two by
/// shape, not by a separate envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    #[serde(rename = "connected")]
    Connected {
        connection_id: String,
        session_id: String,
        server_time: u64,
    },

    #[serde(rename = "error")]
    Error {
        code: ErrorCode,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },

    #[serde(rename = "pong")]
    Pong,

    #[serde(rename = "process_list")]
    ProcessList {
        processes: Vec<ProcessRecord>,
        total: usize,
        page: usize,
        page_size: usize,
    },

    #[serde(rename = "process_status")]
    ProcessStatus { process: ProcessRecord },

    #[serde(rename = "process_started")]
    ProcessStarted { process_id: String, message: String },

    #[serde(rename = "process_stopped")]
    ProcessStopped { process_id: String, message: String },

    #[serde(rename = "process_failed")]
    ProcessFailed { process_id: String, reason: String },

    #[serde(rename = "process_state_changed")]
    ProcessStateChanged {
        process_id: String,
        from: Status,
        to: Status,
    },

    #[serde(rename = "process_logs")]
    ProcessLogs {
        process_id: String,
        logs: Vec<LogEntry>,
        total: usize,
    },

    #[serde(rename = "process_logs_updated")]
    ProcessLogsUpdated {
        process_id: String,
        logs: Vec<LogEntry>,
    },

    #[serde(rename = "subscribed")]
    Subscribed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        process_id: Option<String>,
    },

    #[serde(rename = "unsubscribed")]
    Unsubscribed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        process_id: Option<String>,
    },

    #[serde(rename = "knowledge_created")]
    KnowledgeCreated { id: String },

    #[serde(rename = "knowledge_updated")]
    KnowledgeUpdated { id: String },

    #[serde(rename = "knowledge_deleted")]
    KnowledgeDeleted { id: String },

    #[serde(rename = "knowledge_file_changed")]
    KnowledgeFileChanged { id: String, path: String },
}

impl Frame {
    /// Control frames bypass per-session subscription filtering: every
    /// connected session receives them regardless of what it has
    /// subscribed to.
    pub fn is_control(&self) -> bool {
        matches!(self, Frame::Connected { .. } | Frame::Error { .. } | Frame::Pong)
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Frame::Error {
            code,
            message: message.into(),
            details: None,
        }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
