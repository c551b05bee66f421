use super::*;
use std::time::Duration;
use supervisor_core::FakeClock;
use supervisor_knowledge::KnowledgeStore;
use supervisor_registry::{ProcessRegistry, SessionRegistry};
use tempfile::TempDir;

use crate::config::Config;
use crate::event_bus::EventBus;
use crate::lifecycle::LifecycleController;

fn test_state() -> (Arc<AppState<FakeClock>>, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let clock = FakeClock::new(1_000);
    let config = Config {
        ws_port: 0,
        ws_host: "127.0.0.1".to_string(),
        ws_path: "/ws".to_string(),
        max_connections: 10,
        log_batch_window: Duration::from_millis(100),
        ring_capacity: 100,
        graceful_timeout: Duration::from_millis(300),
        shutdown_timeout: Duration::from_secs(1),
        static_dir: dir.path().join("public").to_string_lossy().into_owned(),
        knowledge_root: dir.path().join("knowledge").to_string_lossy().into_owned(),
    };
    let processes = Arc::new(ProcessRegistry::new());
    let sessions = Arc::new(SessionRegistry::new());
    let bus = Arc::new(EventBus::new());
    let lifecycle = Arc::new(LifecycleController::new(
        processes.clone(),
        bus.clone(),
        clock.clone(),
        config.ring_capacity,
        config.graceful_timeout,
    ));
    let knowledge = Arc::new(KnowledgeStore::open(config.knowledge_root.clone(), clock.clone()).expect("knowledge store opens"));
    let state = Arc::new(AppState::new(Arc::new(config), processes, sessions, bus, lifecycle, knowledge, clock));
    (state, dir)
}

#[test]
fn decode_rejects_malformed_json() {
    let err = decode_request("not json").unwrap_err();
    assert!(matches!(err, Frame::Error { code: ErrorCode::MessageProcessingError, .. }));
}

#[test]
fn decode_rejects_a_body_missing_type() {
    let err = decode_request(r#"{"processId": "p1"}"#).unwrap_err();
    assert!(matches!(err, Frame::Error { code: ErrorCode::MessageProcessingError, .. }));
}

#[test]
fn decode_rejects_an_unknown_type() {
    let err = decode_request(r#"{"type": "launch_the_missiles"}"#).unwrap_err();
    assert!(matches!(err, Frame::Error { code: ErrorCode::UnknownMessageType, .. }));
}

#[test]
fn decode_rejects_a_known_type_with_a_malformed_body() {
    let err = decode_request(r#"{"type": "start_process"}"#).unwrap_err();
    assert!(matches!(err, Frame::Error { code: ErrorCode::MessageProcessingError, .. }));
}

#[test]
fn decode_accepts_ping() {
    assert!(matches!(decode_request(r#"{"type": "ping"}"#), Ok(Request::Ping)));
}

#[tokio::test]
async fn ping_replies_with_pong() {
    let (state, _dir) = test_state();
    let session = SessionId::new("s1");
    assert!(matches!(handle(&state, &session, Request::Ping).await, Frame::Pong));
}

#[tokio::test]
async fn get_process_status_on_an_unknown_id_is_not_found() {
    let (state, _dir) = test_state();
    let session = SessionId::new("s1");
    let frame = handle(&state, &session, Request::GetProcessStatus { process_id: "ghost".to_string() }).await;
    assert!(matches!(frame, Frame::Error { code: ErrorCode::NotFound, .. }));
}

#[tokio::test]
async fn start_process_rejects_an_empty_script_name() {
    let (state, _dir) = test_state();
    let session = SessionId::new("s1");
    let request = Request::StartProcess {
        script_name: String::new(),
        title: "t".to_string(),
        args: vec![],
        env_vars: Default::default(),
        name: None,
    };
    let frame = handle(&state, &session, request).await;
    assert!(matches!(frame, Frame::Error { code: ErrorCode::RequestError, .. }));
}

#[tokio::test]
async fn start_then_stop_a_process_round_trips_through_dispatch() {
    let (state, _dir) = test_state();
    let session = SessionId::new("s1");

    let start = Request::StartProcess {
        script_name: "sleep".to_string(),
        title: "sleeper".to_string(),
        args: vec!["30".to_string()],
        env_vars: Default::default(),
        name: None,
    };
    let Frame::ProcessStarted { process_id, .. } = handle(&state, &session, start).await else {
        panic!("expected process_started");
    };

    let status = handle(&state, &session, Request::GetProcessStatus { process_id: process_id.clone() }).await;
    assert!(matches!(status, Frame::ProcessStatus { .. }));

    let stop = Request::StopProcess { process_id, force: true };
    assert!(matches!(handle(&state, &session, stop).await, Frame::ProcessStopped { .. }));
}

#[tokio::test]
async fn list_processes_defaults_to_a_page_size_of_100() {
    let (state, _dir) = test_state();
    let session = SessionId::new("s1");
    let request = Request::ListProcesses { status: None, name: None, limit: None, offset: None, sort_by: None, sort_order: None };
    let Frame::ProcessList { page_size, total, .. } = handle(&state, &session, request).await else {
        panic!("expected process_list");
    };
    assert_eq!(page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(total, 0);
}

#[tokio::test]
async fn subscribe_and_unsubscribe_round_trip() {
    let (state, _dir) = test_state();
    let session = SessionId::new("s1");
    state.sessions.add(session.clone(), state.clock.now_ms());

    let subscribe = handle(&state, &session, Request::Subscribe { process_id: "p1".to_string() }).await;
    assert!(matches!(subscribe, Frame::Subscribed { process_id: Some(ref id) } if id == "p1"));
    assert!(state.sessions.is_subscribed_to_process(&session, &ProcessId::new("p1")));

    let unsubscribe = handle(&state, &session, Request::Unsubscribe { process_id: "p1".to_string() }).await;
    assert!(matches!(unsubscribe, Frame::Unsubscribed { process_id: Some(ref id) } if id == "p1"));
    assert!(!state.sessions.is_subscribed_to_process(&session, &ProcessId::new("p1")));
}

#[tokio::test]
async fn subscribe_all_reports_no_process_id() {
    let (state, _dir) = test_state();
    let session = SessionId::new("s1");
    state.sessions.add(session.clone(), state.clock.now_ms());

    let frame = handle(&state, &session, Request::SubscribeAll).await;
    assert!(matches!(frame, Frame::Subscribed { process_id: None }));
    assert!(state.sessions.is_subscribed_to_process(&session, &ProcessId::new("anything")));
}

#[tokio::test]
async fn subscribing_on_an_unregistered_session_surfaces_transport_failure() {
    let (state, _dir) = test_state();
    let session = SessionId::new("never-connected");
    let frame = handle(&state, &session, Request::SubscribeAll).await;
    assert!(matches!(frame, Frame::Error { code: ErrorCode::TransportFailure, .. }));
}
