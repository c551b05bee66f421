//! C8: the `/health` endpoint and the static asset server backing the
//! bundled web client.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use supervisor_core::Clock;

use super::AppState;

pub async fn health<C: Clock>(State(state): State<Arc<AppState<C>>>) -> impl IntoResponse {
    axum::Json(json!({
        "status": "ok",
        "connections": state.connections.load(Ordering::Relaxed),
        "maxConnections": state.config.max_connections,
    }))
}

/// Serve `path` from `Config::static_dir`, defaulting `/` to `index.html`.
/// Any `..` component is rejected as a traversal attempt before the path
/// ever touches the filesystem.
pub async fn static_file<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    uri: axum::http::Uri,
) -> Response {
    let requested = uri.path().trim_start_matches('/');
    let requested = if requested.is_empty() { "index.html" } else { requested };

    if is_traversal(requested) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let path = PathBuf::from(&state.config.static_dir).join(requested);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_for(&path);
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn is_traversal(requested: &str) -> bool {
    Path::new(requested)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "static_files_tests.rs"]
mod tests;
