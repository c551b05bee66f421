// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use supervisor_core::SystemClock;
use supervisor_knowledge::KnowledgeStore;
use supervisor_registry::{ProcessRegistry, SessionRegistry};
use supervisord::{install_event_forwarding, router, AppState, Config, EventBus, LifecycleController};
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    setup_logging();

    let config = Arc::new(Config::from_env());
    let clock = SystemClock;

    let processes = Arc::new(ProcessRegistry::new());
    let sessions = Arc::new(SessionRegistry::new());
    let bus = Arc::new(EventBus::new());
    let lifecycle = Arc::new(LifecycleController::new(
        processes.clone(),
        bus.clone(),
        clock,
        config.ring_capacity,
        config.graceful_timeout,
    ));
    let knowledge = match KnowledgeStore::open(config.knowledge_root.clone(), clock) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(%err, "failed to open knowledge store");
            return 1;
        }
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        processes,
        sessions.clone(),
        bus,
        lifecycle.clone(),
        knowledge,
        clock,
    ));
    install_event_forwarding(&state);

    let app = router(state);
    let addr = format!("{}:{}", config.ws_host, config.ws_port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%err, %addr, "failed to bind gateway listener");
            return 1;
        }
    };

    tracing::info!(%addr, path = %config.ws_path, "supervisor gateway listening");

    let serve_result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;
    if let Err(err) = serve_result {
        tracing::error!(%err, "gateway server error");
        return 1;
    }

    tracing::info!("stopping supervised processes");
    lifecycle.shutdown(config.shutdown_timeout).await;
    sessions.close_all();
    tracing::info!("supervisor stopped");
    0
}

/// Resolves on SIGTERM or SIGINT, handing control back to `main` for a
/// graceful stop of supervised processes and open sessions.
async fn shutdown_signal() {
    let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
        return;
    };
    let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
        return;
    };
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = sigint.recv() => tracing::info!("received SIGINT"),
    }
}

fn setup_logging() {
    let filter = if Config::debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
