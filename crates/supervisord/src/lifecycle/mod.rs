//! C4: validates state transitions and orchestrates spawn, stop, and
//! shutdown of supervised child processes. This is the only place that
//! calls into `supervisor_adapters::spawn`/`terminate`/`force_kill`.

mod supervising;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use supervisor_adapters::{SpawnError, SpawnParams};
use supervisor_core::{BusEvent, Clock, LogKind, ProcessId, ProcessRecord, SpawnRequest, Status, TransitionError};
use supervisor_registry::{ProcessPatch, ProcessRegistry, RegistryError};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::event_bus::EventBus;
use supervising::StopCommand;

/// Arguments accepted by [`LifecycleController::spawn`], matching the
/// gateway's `start_process` request shape.
#[derive(Debug, Clone)]
pub struct StartProcessArgs {
    pub script_name: String,
    pub title: String,
    pub args: Vec<String>,
    pub env_vars: HashMap<String, String>,
    pub name: Option<String>,
    pub cwd: Option<String>,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("process {id} failed to spawn: {reason}")]
    SpawnFailed { id: ProcessId, reason: String },
}

/// Orchestrates the lifecycle of every supervised process: spawn, the
/// state machine, and graceful-then-forceful termination. Holds one
/// command channel per live child, handed to the per-process supervising
/// task started by [`spawn`](Self::spawn).
pub struct LifecycleController<C: Clock> {
    registry: Arc<ProcessRegistry>,
    bus: Arc<EventBus>,
    clock: C,
    ring_capacity: usize,
    graceful_timeout: Duration,
    children: Mutex<HashMap<ProcessId, tokio::sync::mpsc::Sender<StopCommand>>>,
}

impl<C: Clock> LifecycleController<C> {
    pub fn new(
        registry: Arc<ProcessRegistry>,
        bus: Arc<EventBus>,
        clock: C,
        ring_capacity: usize,
        graceful_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            bus,
            clock,
            ring_capacity,
            graceful_timeout,
            children: Mutex::new(HashMap::new()),
        }
    }

    fn log(&self, id: &ProcessId, kind: LogKind, content: String) {
        if let Ok(entry) = self.registry.push_log(id, kind, content, self.clock.now_ms()) {
            self.bus.publish(BusEvent::ProcessLog {
                id: id.clone(),
                entry,
            });
        }
    }

    /// Validate and apply a transition, setting `endTime` when it lands on
    /// a terminal status, and publishing `process.stateChanged`. Any other
    /// patch fields are merged alongside it.
    fn transition(
        &self,
        id: &ProcessId,
        to: Status,
        mut patch: ProcessPatch,
    ) -> Result<(Status, ProcessRecord), LifecycleError> {
        let from = self
            .registry
            .get(id)
            .ok_or(RegistryError::NotFound(id.clone()))?
            .status;
        from.validate_transition(to)?;
        patch.status = Some(to);
        if to.is_terminal() {
            patch.end_time = Some(self.clock.now_ms());
        }
        let updated = self.registry.update(id, patch)?;
        self.bus.publish(BusEvent::ProcessStateChanged {
            id: id.clone(),
            from,
            to,
        });
        Ok((from, updated))
    }

    /// Validate, create the record, spawn the child, and start its
    /// watchers. On spawn failure the record is still created and moved to
    /// `failed`; the returned error carries its id.
    pub async fn spawn(&self, request: StartProcessArgs) -> Result<ProcessRecord, LifecycleError> {
        if request.script_name.trim().is_empty() {
            return Err(LifecycleError::EmptyField("script_name"));
        }
        if request.title.trim().is_empty() {
            return Err(LifecycleError::EmptyField("title"));
        }

        let id = ProcessId::new(uuid::Uuid::new_v4().to_string());
        let now = self.clock.now_ms();

        let mut command = vec![request.script_name.clone()];
        command.extend(request.args.iter().cloned());
        let spawn_request = SpawnRequest {
            command: command.clone(),
            title: request.title,
            name: request.name,
            env: request.env_vars.clone(),
            args: request.args,
            cwd: request.cwd.clone(),
        };

        let record = ProcessRecord::new(id.clone(), &spawn_request, now, self.ring_capacity);
        self.registry.add(record)?;
        self.log(
            &id,
            LogKind::System,
            format!("created with command: {}", command.join(" ")),
        );

        let params = SpawnParams {
            command,
            env: request.env_vars,
            cwd: request.cwd,
        };

        let mut child = match supervisor_adapters::spawn(&params) {
            Ok(child) => child,
            Err(err) => return Err(self.fail_to_spawn(id, err)),
        };

        let pid = child.id();
        self.log(
            &id,
            LogKind::System,
            format!("started with pid {}", pid.unwrap_or_default()),
        );
        let (_, updated) = self.transition(&id, Status::Running, ProcessPatch { pid, ..Default::default() })?;
        self.bus.publish(BusEvent::ProcessStarted {
            id: id.clone(),
            record: updated.clone(),
        });

        let cmd_tx = supervising::spawn(id.clone(), child, self.registry.clone(), self.bus.clone(), self.clock.clone());
        self.children.lock().insert(id, cmd_tx);

        Ok(updated)
    }

    fn fail_to_spawn(&self, id: ProcessId, err: SpawnError) -> LifecycleError {
        self.log(&id, LogKind::System, format!("spawn failed: {err}"));
        if let Ok((_, updated)) = self.transition(&id, Status::Failed, ProcessPatch::default()) {
            self.bus.publish(BusEvent::ProcessFailed {
                id: id.clone(),
                record: updated,
                reason: err.to_string(),
            });
        }
        LifecycleError::SpawnFailed {
            id,
            reason: err.to_string(),
        }
    }

    /// Stop one process. `force` skips the graceful SIGTERM window;
    /// `timeout` overrides the controller's default grace period. Already
    /// terminal processes return their current snapshot with no work done.
    pub async fn stop(
        &self,
        id: &ProcessId,
        force: bool,
        timeout: Option<Duration>,
    ) -> Result<ProcessRecord, LifecycleError> {
        let record = self.registry.get(id).ok_or(RegistryError::NotFound(id.clone()))?;
        if record.status.is_terminal() {
            return Ok(record);
        }

        let cmd_tx = self.children.lock().get(id).cloned();
        let Some(cmd_tx) = cmd_tx else {
            return match self.transition(id, Status::Stopped, ProcessPatch::default()) {
                Ok((_, updated)) => {
                    self.bus.publish(BusEvent::ProcessStopped {
                        id: id.clone(),
                        record: updated.clone(),
                    });
                    Ok(updated)
                }
                Err(_) => Ok(record),
            };
        };

        self.transition(id, Status::Stopping, ProcessPatch::default())?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = StopCommand {
            force,
            timeout: timeout.unwrap_or(self.graceful_timeout),
            reply: reply_tx,
        };
        if cmd_tx.send(cmd).await.is_ok() {
            let _ = reply_rx.await;
        }
        self.children.lock().remove(id);

        self.registry.get(id).ok_or(RegistryError::NotFound(id.clone())).map_err(Into::into)
    }

    /// Stop every non-terminal process in parallel, halving `timeout` per
    /// call, then force-kill anything still alive. Idempotent: a second
    /// call sees no live handles left and returns immediately.
    pub async fn shutdown(&self, timeout: Duration) {
        let ids: Vec<ProcessId> = self.children.lock().keys().cloned().collect();
        if ids.is_empty() {
            return;
        }
        let per_call = timeout / 2;
        let stops = ids.iter().map(|id| self.stop(id, false, Some(per_call)));
        futures_util::future::join_all(stops).await;

        let stragglers: Vec<ProcessId> = self.children.lock().keys().cloned().collect();
        if stragglers.is_empty() {
            return;
        }
        let kills = stragglers.iter().map(|id| self.stop(id, true, Some(per_call)));
        futures_util::future::join_all(kills).await;
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
