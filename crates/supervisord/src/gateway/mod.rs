//! C7: the WebSocket gateway. Upgrades HTTP connections to sessions,
//! decodes request frames, dispatches them, and forwards C5 bus events to
//! whichever sessions are subscribed.

mod dispatch;
mod log_batcher;
mod static_files;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use supervisor_core::{BusEvent, Clock, ProcessId, SessionId, Topic};
use supervisor_knowledge::KnowledgeStore;
use supervisor_registry::{ProcessRegistry, SessionFilter, SessionRegistry};
use supervisor_wire::Frame;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::event_bus::EventBus;
use crate::lifecycle::LifecycleController;
use log_batcher::LogBatcher;

/// Everything a request handler or broadcast needs. Shared behind one
/// `Arc` across every session.
pub struct AppState<C: Clock> {
    pub config: Arc<Config>,
    pub processes: Arc<ProcessRegistry>,
    pub sessions: Arc<SessionRegistry>,
    pub bus: Arc<EventBus>,
    pub lifecycle: Arc<LifecycleController<C>>,
    pub knowledge: Arc<KnowledgeStore<C>>,
    pub clock: C,
    pub connections: Arc<AtomicUsize>,
    outbox: Mutex<HashMap<SessionId, mpsc::Sender<Frame>>>,
    log_batcher: LogBatcher,
}

impl<C: Clock> AppState<C> {
    pub fn new(
        config: Arc<Config>,
        processes: Arc<ProcessRegistry>,
        sessions: Arc<SessionRegistry>,
        bus: Arc<EventBus>,
        lifecycle: Arc<LifecycleController<C>>,
        knowledge: Arc<KnowledgeStore<C>>,
        clock: C,
    ) -> Self {
        Self {
            config,
            processes,
            sessions,
            bus,
            lifecycle,
            knowledge,
            clock,
            connections: Arc::new(AtomicUsize::new(0)),
            outbox: Mutex::new(HashMap::new()),
            log_batcher: LogBatcher::new(),
        }
    }
}

/// Build the gateway's router: the WebSocket upgrade path, `/health`, and
/// a static-file fallback for everything else.
pub fn router<C: Clock>(state: Arc<AppState<C>>) -> Router {
    let ws_path = state.config.ws_path.clone();
    Router::new()
        .route(&ws_path, get(ws_handler::<C>))
        .route("/health", get(static_files::health::<C>))
        .fallback(static_files::static_file::<C>)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Subscribe the gateway to every bus topic exactly once. Call after the
/// router is built and before accepting connections.
pub fn install_event_forwarding<C: Clock>(state: &Arc<AppState<C>>) {
    for topic in [Topic::ProcessStarted, Topic::ProcessStateChanged, Topic::ProcessStopped, Topic::ProcessFailed] {
        let state = state.clone();
        state.bus.subscribe(topic, move |event| {
            send_to_subscribers(&state, event.process_id(), frame_for_event(event));
        });
    }

    let state = state.clone();
    state.bus.subscribe(Topic::ProcessLog, move |event| {
        if let BusEvent::ProcessLog { id, entry } = event {
            LogBatcher::record(&state, id.clone(), entry.clone());
        }
    });
}

fn frame_for_event(event: &BusEvent) -> Frame {
    match event {
        BusEvent::ProcessStarted { record, .. } => Frame::ProcessStarted {
            process_id: record.id.to_string(),
            message: format!("process {} started", record.id),
        },
        BusEvent::ProcessStateChanged { id, from, to } => Frame::ProcessStateChanged {
            process_id: id.to_string(),
            from: *from,
            to: *to,
        },
        BusEvent::ProcessStopped { record, .. } => Frame::ProcessStopped {
            process_id: record.id.to_string(),
            message: format!("process {} stopped", record.id),
        },
        BusEvent::ProcessFailed { record, reason, .. } => Frame::ProcessFailed {
            process_id: record.id.to_string(),
            reason: reason.clone(),
        },
        BusEvent::ProcessLog { .. } => unreachable!("process.log is handled by the log batcher"),
    }
}

/// Forward `frame` to every session subscribed to `id`, either directly or
/// via `allProcesses`. A session whose outbox is full or closed is marked
/// `error` rather than retried.
fn send_to_subscribers<C: Clock>(state: &Arc<AppState<C>>, id: &ProcessId, frame: Frame) {
    let filter = SessionFilter {
        state: None,
        subscribed_to: Some(id.clone()),
    };
    let subscribers = state.sessions.list_by_filter(&filter);
    let senders: Vec<(SessionId, mpsc::Sender<Frame>)> = {
        let outbox = state.outbox.lock();
        subscribers
            .into_iter()
            .filter_map(|session| outbox.get(&session.id).map(|tx| (session.id, tx.clone())))
            .collect()
    };
    for (session_id, sender) in senders {
        if sender.try_send(frame.clone()).is_err() {
            let _ = state.sessions.mark_error(&session_id);
        }
    }
}

async fn ws_handler<C: Clock>(State(state): State<Arc<AppState<C>>>, ws: WebSocketUpgrade) -> Response {
    if state.connections.load(Ordering::Relaxed) >= state.config.max_connections {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket<C: Clock>(socket: WebSocket, state: Arc<AppState<C>>) {
    state.connections.fetch_add(1, Ordering::Relaxed);
    let (mut sink, mut stream) = socket.split();

    let session_id = SessionId::new(uuid::Uuid::new_v4().to_string());
    let connection_id = uuid::Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::channel::<Frame>(256);

    state.sessions.add(session_id.clone(), state.clock.now_ms());
    state.outbox.lock().insert(session_id.clone(), tx.clone());

    let _ = tx
        .send(Frame::Connected {
            connection_id,
            session_id: session_id.to_string(),
            server_time: state.clock.now_ms(),
        })
        .await;

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&frame) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        state.sessions.update_activity(&session_id, state.clock.now_ms()).ok();
        let response = match dispatch::decode_request(&text) {
            Ok(request) => dispatch::handle(&state, &session_id, request).await,
            Err(frame) => frame,
        };
        if tx.send(response).await.is_err() {
            break;
        }
    }

    state.sessions.remove(&session_id);
    state.outbox.lock().remove(&session_id);
    state.connections.fetch_sub(1, Ordering::Relaxed);
    drop(tx);
    let _ = writer.await;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
