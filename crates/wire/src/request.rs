//! Client → gateway request frames.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sort field for `list_processes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    StartTime,
    Name,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Log kind filter for `get_process_logs`. Deliberately a subset of
/// [`supervisor_core::LogKind`] so unknown values (future kinds) simply
/// fail to parse as a filter rather than silently matching everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKindFilter {
    Stdout,
    Stderr,
    System,
}

/// One request frame, tagged on the wire by `type`. Unknown `type` values
/// fail to deserialize; the gateway turns that failure into an
/// `UNKNOWN_MESSAGE_TYPE` error response rather than propagating serde's
/// error text to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "list_processes")]
    ListProcesses {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        offset: Option<usize>,
        #[serde(default)]
        sort_by: Option<SortBy>,
        #[serde(default)]
        sort_order: Option<SortOrder>,
    },

    #[serde(rename = "get_process_status")]
    GetProcessStatus { process_id: String },

    #[serde(rename = "start_process")]
    StartProcess {
        script_name: String,
        title: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env_vars: HashMap<String, String>,
        #[serde(default)]
        name: Option<String>,
    },

    #[serde(rename = "stop_process")]
    StopProcess {
        process_id: String,
        #[serde(default)]
        force: bool,
    },

    #[serde(rename = "get_process_logs")]
    GetProcessLogs {
        process_id: String,
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        offset: Option<usize>,
        #[serde(default, rename = "logType")]
        kind: Option<LogKindFilter>,
    },

    #[serde(rename = "subscribe")]
    Subscribe { process_id: String },

    #[serde(rename = "unsubscribe")]
    Unsubscribe { process_id: String },

    #[serde(rename = "subscribe_all")]
    SubscribeAll,

    #[serde(rename = "unsubscribe_all")]
    UnsubscribeAll,

    #[serde(rename = "ping")]
    Ping,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
