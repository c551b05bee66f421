//! Event bus payloads published by the lifecycle controller.

use crate::id::ProcessId;
use crate::log::LogEntry;
use crate::process::ProcessRecord;
use crate::status::Status;
use serde::{Deserialize, Serialize};

/// Topics the event bus carries. [`BusEvent::topic`] maps a payload to its
/// topic string; subscribers register against these same strings so unknown
/// topics (a typo, a future topic) are simply never matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ProcessStarted,
    ProcessStateChanged,
    ProcessStopped,
    ProcessFailed,
    ProcessLog,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::ProcessStarted => "process.started",
            Topic::ProcessStateChanged => "process.stateChanged",
            Topic::ProcessStopped => "process.stopped",
            Topic::ProcessFailed => "process.failed",
            Topic::ProcessLog => "process.log",
        }
    }
}

/// A fact published on the event bus. The gateway maps each variant to a
/// wire frame for broadcast to subscribed sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BusEvent {
    #[serde(rename = "process.started")]
    ProcessStarted { id: ProcessId, record: ProcessRecord },

    #[serde(rename = "process.stateChanged")]
    ProcessStateChanged {
        id: ProcessId,
        from: Status,
        to: Status,
    },

    #[serde(rename = "process.stopped")]
    ProcessStopped { id: ProcessId, record: ProcessRecord },

    #[serde(rename = "process.failed")]
    ProcessFailed {
        id: ProcessId,
        record: ProcessRecord,
        reason: String,
    },

    #[serde(rename = "process.log")]
    ProcessLog { id: ProcessId, entry: LogEntry },
}

impl BusEvent {
    /// The topic this event is published under.
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::ProcessStarted { .. } => Topic::ProcessStarted,
            BusEvent::ProcessStateChanged { .. } => Topic::ProcessStateChanged,
            BusEvent::ProcessStopped { .. } => Topic::ProcessStopped,
            BusEvent::ProcessFailed { .. } => Topic::ProcessFailed,
            BusEvent::ProcessLog { .. } => Topic::ProcessLog,
        }
    }

    /// The process this event concerns, used by the gateway to apply
    /// per-session subscription filtering.
    pub fn process_id(&self) -> &ProcessId {
        match self {
            BusEvent::ProcessStarted { id, .. }
            | BusEvent::ProcessStateChanged { id, .. }
            | BusEvent::ProcessStopped { id, .. }
            | BusEvent::ProcessFailed { id, .. }
            | BusEvent::ProcessLog { id, .. } => id,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
