//! Server configuration, loaded from environment variables with
//! documented defaults. No dynamic untyped config object — every tunable
//! named in the design is a typed field here.

use std::time::Duration;

fn env_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `SUPERVISOR_WS_PORT` — TCP port the gateway listens on.
    pub ws_port: u16,
    /// Bind address; all interfaces by default.
    pub ws_host: String,
    /// WebSocket upgrade path.
    pub ws_path: String,
    /// Max concurrent gateway sessions; excess connections get HTTP 503.
    pub max_connections: usize,
    /// How long `process.log` events accumulate per process before the
    /// gateway flushes a `process_logs_updated` frame.
    pub log_batch_window: Duration,
    /// Default per-record log ring capacity.
    pub ring_capacity: usize,
    /// Graceful-stop timeout before escalating to SIGKILL.
    pub graceful_timeout: Duration,
    /// Overall shutdown timeout; each in-flight stop gets half.
    pub shutdown_timeout: Duration,
    /// Directory served for static assets.
    pub static_dir: String,
    /// Root directory for the knowledge store's markdown files.
    pub knowledge_root: String,
}

impl Config {
    /// Load configuration from the environment, falling back to the
    /// documented defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            ws_port: env_var("SUPERVISOR_WS_PORT", 8080),
            ws_host: std::env::var("SUPERVISOR_WS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            ws_path: std::env::var("SUPERVISOR_WS_PATH").unwrap_or_else(|_| "/ws".to_string()),
            max_connections: env_var("SUPERVISOR_MAX_CONNECTIONS", 1000),
            log_batch_window: Duration::from_millis(env_var("SUPERVISOR_LOG_BATCH_WINDOW_MS", 100)),
            ring_capacity: env_var("SUPERVISOR_RING_CAPACITY", supervisor_core::DEFAULT_RING_CAPACITY),
            graceful_timeout: Duration::from_millis(env_var("SUPERVISOR_GRACEFUL_TIMEOUT_MS", 5000)),
            shutdown_timeout: Duration::from_millis(env_var("SUPERVISOR_SHUTDOWN_TIMEOUT_MS", 10_000)),
            static_dir: std::env::var("SUPERVISOR_STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            knowledge_root: std::env::var("SUPERVISOR_KNOWLEDGE_ROOT").unwrap_or_else(|_| "knowledge".to_string()),
        }
    }

    /// Whether verbose internal logging (`SUPERVISOR_DEBUG`) is enabled.
    /// Kept separate from the rest of `Config` because it's consulted
    /// before the subscriber — and therefore structured logging of this
    /// very struct — exists.
    pub fn debug_enabled() -> bool {
        is_debug_value(std::env::var("SUPERVISOR_DEBUG").ok().as_deref())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_debug_value(raw: Option<&str>) -> bool {
    matches!(raw, Some(v) if v != "0" && !v.is_empty())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
