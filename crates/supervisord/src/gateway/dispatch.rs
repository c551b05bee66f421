//! Maps one decoded [`Request`] to the C1/C4/C6 call it names and the
//! [`Frame`] sent back in reply. Broadcasts are a separate path
//! ([`super::install_event_forwarding`]); this module only ever produces
//! the single response frame for the request that triggered it.

use std::sync::Arc;

use supervisor_core::{Clock, LogKind, ProcessId, SessionId, Status};
use supervisor_registry::{ListFilter, Page, RegistryError, SortField, SortOrder as RegSortOrder, SubscriptionAction, MAX_PAGE_LIMIT};
use supervisor_wire::{ErrorCode, Frame, LogKindFilter, Request, SortBy, SortOrder};

use crate::lifecycle::{LifecycleError, StartProcessArgs};

use super::AppState;

/// Default page size when a `list_processes` request omits `limit`.
const DEFAULT_PAGE_SIZE: usize = 100;

fn parse_status(raw: &str) -> Option<Status> {
    match raw {
        "starting" => Some(Status::Starting),
        "running" => Some(Status::Running),
        "stopping" => Some(Status::Stopping),
        "stopped" => Some(Status::Stopped),
        "failed" => Some(Status::Failed),
        _ => None,
    }
}

fn sort_field(sort_by: Option<SortBy>) -> SortField {
    match sort_by {
        Some(SortBy::Name) => SortField::Name,
        Some(SortBy::Status) => SortField::Status,
        Some(SortBy::StartTime) | None => SortField::StartTime,
    }
}

fn sort_order(order: Option<SortOrder>) -> RegSortOrder {
    match order {
        Some(SortOrder::Desc) => RegSortOrder::Desc,
        _ => RegSortOrder::Asc,
    }
}

fn matches_kind(kind: LogKind, filter: LogKindFilter) -> bool {
    matches!(
        (kind, filter),
        (LogKind::Stdout, LogKindFilter::Stdout) | (LogKind::Stderr, LogKindFilter::Stderr) | (LogKind::System, LogKindFilter::System)
    )
}

fn spawn_error_frame(err: LifecycleError) -> Frame {
    match err {
        LifecycleError::EmptyField(field) => Frame::error(ErrorCode::RequestError, format!("{field} must not be empty")),
        LifecycleError::SpawnFailed { id, reason } => Frame::Error {
            code: ErrorCode::SpawnFailure,
            message: reason,
            details: Some(serde_json::json!({ "processId": id.to_string() })),
        },
        LifecycleError::Registry(RegistryError::AlreadyExists(id)) => Frame::error(ErrorCode::ValidationError, format!("process {id} already exists")),
        LifecycleError::Registry(RegistryError::NotFound(id)) => Frame::error(ErrorCode::NotFound, format!("process {id} not found")),
        LifecycleError::Transition(err) => Frame::error(ErrorCode::InvalidStateTransition, err.to_string()),
    }
}

fn stop_error_frame(err: LifecycleError) -> Frame {
    match err {
        LifecycleError::Registry(RegistryError::NotFound(id)) => Frame::error(ErrorCode::NotFound, format!("process {id} not found")),
        LifecycleError::Transition(err) => Frame::error(ErrorCode::InvalidStateTransition, err.to_string()),
        other => Frame::error(ErrorCode::TerminationFailure, other.to_string()),
    }
}

/// Request `type` values recognized on the wire, used to distinguish an
/// unknown message type from a malformed body of a known one.
const KNOWN_TYPES: &[&str] = &[
    "list_processes",
    "get_process_status",
    "start_process",
    "stop_process",
    "get_process_logs",
    "subscribe",
    "unsubscribe",
    "subscribe_all",
    "unsubscribe_all",
    "ping",
];

/// Decode one inbound text frame into a [`Request`], or the error frame to
/// send back in its place. Malformed JSON or a body missing `type` is
/// `MESSAGE_PROCESSING_ERROR`; a `type` outside [`KNOWN_TYPES`] is
/// `UNKNOWN_MESSAGE_TYPE`; a recognized `type` with a malformed body is
/// also `MESSAGE_PROCESSING_ERROR`.
pub fn decode_request(text: &str) -> Result<Request, Frame> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|_| Frame::error(ErrorCode::MessageProcessingError, "malformed JSON"))?;
    let Some(type_name) = value.get("type").and_then(|t| t.as_str()) else {
        return Err(Frame::error(ErrorCode::MessageProcessingError, "missing \"type\" field"));
    };
    if !KNOWN_TYPES.contains(&type_name) {
        return Err(Frame::error(ErrorCode::UnknownMessageType, format!("unknown message type: {type_name}")));
    }
    serde_json::from_value(value).map_err(|_| Frame::error(ErrorCode::MessageProcessingError, format!("malformed {type_name} request")))
}

/// Handle one decoded client request from `session_id`, returning the
/// frame to send back on that session's own connection.
pub async fn handle<C: Clock>(state: &Arc<AppState<C>>, session_id: &SessionId, request: Request) -> Frame {
    match request {
        Request::ListProcesses { status, name, limit, offset, sort_by, sort_order: order } => {
            let filter = ListFilter {
                status: status.as_deref().and_then(parse_status),
                name_contains: name,
            };
            let limit = limit.map(|l| l.min(MAX_PAGE_LIMIT)).unwrap_or(DEFAULT_PAGE_SIZE);
            let offset = offset.unwrap_or(0);
            let (processes, total) = state.processes.list(&filter, (sort_field(sort_by), sort_order(order)), Page { offset, limit });
            let page = if limit == 0 { 0 } else { offset / limit };
            Frame::ProcessList { processes, total, page, page_size: limit }
        }

        Request::GetProcessStatus { process_id } => match state.processes.get(&ProcessId::new(process_id.clone())) {
            Some(process) => Frame::ProcessStatus { process },
            None => Frame::error(ErrorCode::NotFound, format!("process {process_id} not found")),
        },

        Request::StartProcess { script_name, title, args, env_vars, name } => {
            let result = state
                .lifecycle
                .spawn(StartProcessArgs { script_name, title, args, env_vars, name, cwd: None })
                .await;
            match result {
                Ok(record) => Frame::ProcessStarted { process_id: record.id.to_string(), message: format!("process {} started", record.id) },
                Err(err) => spawn_error_frame(err),
            }
        }

        Request::StopProcess { process_id, force } => {
            let id = ProcessId::new(process_id);
            match state.lifecycle.stop(&id, force, None).await {
                Ok(record) => Frame::ProcessStopped { process_id: record.id.to_string(), message: format!("process {} stopped", record.id) },
                Err(err) => stop_error_frame(err),
            }
        }

        Request::GetProcessLogs { process_id, limit, offset, kind } => {
            let id = ProcessId::new(process_id.clone());
            match state.processes.get(&id) {
                Some(record) => {
                    let mut logs: Vec<_> = record.logs.iter().cloned().collect();
                    if let Some(kind) = kind {
                        logs.retain(|entry| matches_kind(entry.kind, kind));
                    }
                    let total = logs.len();
                    let offset = offset.unwrap_or(0);
                    let limit = limit.map(|l| l.min(MAX_PAGE_LIMIT)).unwrap_or(total);
                    let logs = logs.into_iter().skip(offset).take(limit).collect();
                    Frame::ProcessLogs { process_id, logs, total }
                }
                None => Frame::error(ErrorCode::NotFound, format!("process {process_id} not found")),
            }
        }

        Request::Subscribe { process_id } => {
            let id = ProcessId::new(process_id.clone());
            match state.sessions.update_subscription(session_id, SubscriptionAction::Subscribe, Some(&id)) {
                Ok(()) => Frame::Subscribed { process_id: Some(process_id) },
                Err(err) => Frame::error(ErrorCode::TransportFailure, err.to_string()),
            }
        }

        Request::Unsubscribe { process_id } => {
            let id = ProcessId::new(process_id.clone());
            match state.sessions.update_subscription(session_id, SubscriptionAction::Unsubscribe, Some(&id)) {
                Ok(()) => Frame::Unsubscribed { process_id: Some(process_id) },
                Err(err) => Frame::error(ErrorCode::TransportFailure, err.to_string()),
            }
        }

        Request::SubscribeAll => match state.sessions.update_subscription(session_id, SubscriptionAction::SubscribeAll, None) {
            Ok(()) => Frame::Subscribed { process_id: None },
            Err(err) => Frame::error(ErrorCode::TransportFailure, err.to_string()),
        },

        Request::UnsubscribeAll => match state.sessions.update_subscription(session_id, SubscriptionAction::UnsubscribeAll, None) {
            Ok(()) => Frame::Unsubscribed { process_id: None },
            Err(err) => Frame::error(ErrorCode::TransportFailure, err.to_string()),
        },

        Request::Ping => Frame::Pong,
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
