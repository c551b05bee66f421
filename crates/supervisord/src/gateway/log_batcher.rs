//! Coalesces `process.log` events per process so a noisy child doesn't
//! produce one `process_logs_updated` frame per line.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use supervisor_core::{Clock, LogEntry, ProcessId};

use super::AppState;

#[derive(Default)]
pub struct LogBatcher {
    pending: Mutex<HashMap<ProcessId, Vec<LogEntry>>>,
    armed: Mutex<bool>,
}

impl LogBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `entry` for `id`. Arms a flush timer on the first entry of a
    /// fresh batch; subsequent entries ride the already-armed timer.
    pub fn record<C: Clock>(state: &Arc<AppState<C>>, id: ProcessId, entry: LogEntry) {
        state.log_batcher.pending.lock().entry(id).or_default().push(entry);

        let mut armed = state.log_batcher.armed.lock();
        if *armed {
            return;
        }
        *armed = true;
        drop(armed);

        let state = state.clone();
        let window = state.config.log_batch_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            flush(&state, window);
        });
    }
}

fn flush<C: Clock>(state: &Arc<AppState<C>>, _window: Duration) {
    let batch: HashMap<ProcessId, Vec<LogEntry>> = {
        let mut pending = state.log_batcher.pending.lock();
        std::mem::take(&mut *pending)
    };
    *state.log_batcher.armed.lock() = false;

    for (id, logs) in batch {
        let frame = supervisor_wire::Frame::ProcessLogsUpdated {
            process_id: id.to_string(),
            logs,
        };
        super::send_to_subscribers(state, &id, frame);
    }
}
