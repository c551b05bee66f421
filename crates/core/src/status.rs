//! Process lifecycle status and the transition graph that governs it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle state of a supervised process.
///
/// Terminal states are [`Status::Stopped`] and [`Status::Failed`]; once a
/// record reaches either, no further transition is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl Status {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Stopped | Status::Failed)
    }

    /// Validate a transition against the allowed graph below. Returns the
    /// target status unchanged on success so callers can write
    /// `status = status.validate_transition(next)?;`.
    pub fn validate_transition(self, next: Status) -> Result<Status, TransitionError> {
        let allowed = matches!(
            (self, next),
            (Status::Starting, Status::Running)
                | (Status::Starting, Status::Failed)
                | (Status::Running, Status::Stopping)
                | (Status::Running, Status::Stopped)
                | (Status::Running, Status::Failed)
                | (Status::Stopping, Status::Stopped)
                | (Status::Stopping, Status::Failed)
        );
        if allowed {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Starting => "starting",
            Status::Running => "running",
            Status::Stopping => "stopping",
            Status::Stopped => "stopped",
            Status::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A transition was requested that the allowed graph does not contain.
#[derive(Debug, Clone, Copy, Error)]
#[error("invalid transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: Status,
    pub to: Status,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
