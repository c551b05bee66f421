//! Child process spawn/kill adapter: the only place `tokio::process` is
//! touched directly.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("command is empty")]
    EmptyCommand,
    #[error("failed to spawn process: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters for spawning a child with piped stdout/stderr and null stdin.
#[derive(Debug, Clone, Default)]
pub struct SpawnParams {
    pub command: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: Option<String>,
}

/// Spawn a child process with stdout/stderr piped and stdin closed.
/// `command[0]` is the executable; the rest are arguments. The caller's
/// `env` is merged on top of the current process environment.
pub fn spawn(params: &SpawnParams) -> Result<Child, SpawnError> {
    let (program, args) = params
        .command
        .split_first()
        .ok_or(SpawnError::EmptyCommand)?;
    if program.is_empty() {
        return Err(SpawnError::EmptyCommand);
    }

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    for (key, value) in &params.env {
        cmd.env(key, value);
    }
    if let Some(cwd) = &params.cwd {
        cmd.current_dir(cwd);
    }

    cmd.spawn().map_err(SpawnError::Io)
}

/// Send SIGTERM, then escalate to SIGKILL if the child hasn't exited
/// within `timeout`. Returns once the child has been reaped. The return
/// value is `true` if the wait timed out and the kill had to escalate.
pub async fn terminate(child: &mut Child, timeout: Duration) -> bool {
    if terminate_gracefully(child).is_err() {
        force_kill(child).await;
        return true;
    }
    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(_) => false,
        Err(_) => {
            tracing::warn!("graceful termination timed out, escalating to SIGKILL");
            force_kill(child).await;
            true
        }
    }
}

/// Send SIGKILL unconditionally and await exit.
pub async fn force_kill(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let _ = nix::sys::signal::kill(
                nix::unistd::Pid::from_raw(pid as i32),
                nix::sys::signal::Signal::SIGKILL,
            );
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }
    let _ = child.wait().await;
}

#[cfg(unix)]
fn terminate_gracefully(child: &mut Child) -> Result<(), ()> {
    match child.id() {
        Some(pid) => nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid as i32),
            nix::sys::signal::Signal::SIGTERM,
        )
        .map_err(|_| ()),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn terminate_gracefully(child: &mut Child) -> Result<(), ()> {
    child.start_kill().map_err(|_| ())
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
