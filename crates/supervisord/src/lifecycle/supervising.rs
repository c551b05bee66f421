//! The task that owns one spawned child for its whole lifetime: reads its
//! stdout/stderr, waits for it to exit or to be told to stop, and performs
//! the terminal state transition once it has.

use std::sync::Arc;
use std::time::Duration;

use supervisor_adapters::{force_kill, run_stream_reader, terminate, StreamLine};
use supervisor_core::{BusEvent, Clock, LogKind, ProcessId, Status};
use supervisor_registry::{ProcessPatch, ProcessRegistry};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};

use crate::event_bus::EventBus;

/// Sent to a running supervisor task to request termination.
pub(super) struct StopCommand {
    pub force: bool,
    pub timeout: Duration,
    pub reply: oneshot::Sender<()>,
}

fn record_log<C: Clock>(
    registry: &ProcessRegistry,
    bus: &EventBus,
    clock: &C,
    id: &ProcessId,
    kind: LogKind,
    content: String,
) {
    if let Ok(entry) = registry.push_log(id, kind, content, clock.now_ms()) {
        bus.publish(BusEvent::ProcessLog {
            id: id.clone(),
            entry,
        });
    }
}

/// Spawn the three watchers for `child` and return a channel the controller
/// can use to request a stop. The task drives itself to completion; nothing
/// needs to be awaited or joined by the caller.
pub(super) fn spawn<C: Clock>(
    id: ProcessId,
    mut child: Child,
    registry: Arc<ProcessRegistry>,
    bus: Arc<EventBus>,
    clock: C,
) -> mpsc::Sender<StopCommand> {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<StopCommand>(1);
    let (lines_tx, mut lines_rx) = mpsc::channel::<StreamLine>(1024);
    let (stdout_cancel_tx, stdout_cancel_rx) = oneshot::channel();
    let (stderr_cancel_tx, stderr_cancel_rx) = oneshot::channel();

    if let Some(stdout) = child.stdout.take() {
        let tx = lines_tx.clone();
        tokio::spawn(run_stream_reader(stdout, LogKind::Stdout, tx, stdout_cancel_rx));
    } else {
        drop(stdout_cancel_rx);
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(run_stream_reader(stderr, LogKind::Stderr, lines_tx.clone(), stderr_cancel_rx));
    } else {
        drop(stderr_cancel_rx);
    }
    drop(lines_tx);

    tokio::spawn(async move {
        let mut reply = None;
        let mut lines_open = true;
        let exit = loop {
            tokio::select! {
                biased;
                line = lines_rx.recv(), if lines_open => {
                    match line {
                        Some(StreamLine { kind, content }) => {
                            record_log(&registry, &bus, &clock, &id, kind, content);
                        }
                        None => lines_open = false,
                    }
                }
                stop = cmd_rx.recv() => {
                    let Some(StopCommand { force, timeout, reply: r }) = stop else { continue };
                    if force {
                        force_kill(&mut child).await;
                    } else if terminate(&mut child, timeout).await {
                        record_log(
                            &registry,
                            &bus,
                            &clock,
                            &id,
                            LogKind::System,
                            "graceful termination timed out, escalating to SIGKILL".to_string(),
                        );
                    }
                    reply = Some(r);
                    break child.wait().await;
                }
                exit = child.wait() => {
                    break exit;
                }
            }
        };

        // Drain whatever lines were already queued before the child's pipes
        // closed; readers exit on EOF without waiting for cancellation.
        while let Ok(StreamLine { kind, content }) = lines_rx.try_recv() {
            record_log(&registry, &bus, &clock, &id, kind, content);
        }
        let _ = stdout_cancel_tx.send(());
        let _ = stderr_cancel_tx.send(());

        finalize(&id, exit, &registry, &bus, &clock);
        if let Some(reply) = reply {
            let _ = reply.send(());
        }
    });

    cmd_tx
}

fn finalize<C: Clock>(
    id: &ProcessId,
    exit: std::io::Result<std::process::ExitStatus>,
    registry: &ProcessRegistry,
    bus: &EventBus,
    clock: &C,
) {
    let from = match registry.get(id) {
        Some(record) => record.status,
        None => return,
    };

    let (to, code, signal, message) = match exit {
        Ok(status) => {
            #[cfg(unix)]
            let signal = std::os::unix::process::ExitStatusExt::signal(&status);
            #[cfg(not(unix))]
            let signal: Option<i32> = None;
            let code = status.code();
            let to = if code == Some(0) && signal.is_none() {
                Status::Stopped
            } else {
                Status::Failed
            };
            let message = match (code, signal) {
                (Some(code), _) => format!("exited with code {code}"),
                (None, Some(sig)) => format!("exited with code 0 (signal: {sig})"),
                (None, None) => "exited with unknown status".to_string(),
            };
            (to, code, signal.map(|s| s.to_string()), message)
        }
        Err(err) => (Status::Failed, None, None, format!("failed to reap child: {err}")),
    };

    if from.validate_transition(to).is_err() {
        return;
    }

    record_log(registry, bus, clock, id, LogKind::System, message.clone());

    let now = clock.now_ms();
    let patch = ProcessPatch {
        status: Some(to),
        end_time: Some(now),
        exit_code: code,
        exit_signal: signal,
        ..Default::default()
    };
    let Ok(updated) = registry.update(id, patch) else {
        return;
    };

    bus.publish(BusEvent::ProcessStateChanged {
        id: id.clone(),
        from,
        to,
    });
    match to {
        Status::Stopped => bus.publish(BusEvent::ProcessStopped {
            id: id.clone(),
            record: updated,
        }),
        Status::Failed => bus.publish(BusEvent::ProcessFailed {
            id: id.clone(),
            record: updated,
            reason: message,
        }),
        _ => {}
    }
}
