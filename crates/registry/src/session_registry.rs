//! C6: gateway session bookkeeping — connection state, activity, and
//! per-session subscriptions. The transport itself lives with the gateway;
//! this registry only tracks what a session is allowed to see.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use supervisor_core::{ProcessId, SessionId};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Error,
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    pub all_processes: bool,
    pub process_ids: HashSet<ProcessId>,
}

#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub state: SessionState,
    pub connected_at: u64,
    pub last_activity: u64,
    pub subscriptions: Subscriptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
    SubscribeAll,
    UnsubscribeAll,
}

#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub state: Option<SessionState>,
    pub subscribed_to: Option<ProcessId>,
}

impl SessionFilter {
    fn matches(&self, session: &SessionInfo) -> bool {
        if let Some(state) = self.state {
            if session.state != state {
                return false;
            }
        }
        if let Some(id) = &self.subscribed_to {
            if !is_subscribed(session, id) {
                return false;
            }
        }
        true
    }
}

fn is_subscribed(session: &SessionInfo, id: &ProcessId) -> bool {
    session.subscriptions.all_processes || session.subscriptions.process_ids.contains(id)
}

#[derive(Debug, Clone, Error)]
pub enum SessionRegistryError {
    #[error("session {0} not found")]
    NotFound(SessionId),
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionInfo>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: SessionId, now_ms: u64) {
        self.sessions.write().insert(
            id.clone(),
            SessionInfo {
                id,
                state: SessionState::Connected,
                connected_at: now_ms,
                last_activity: now_ms,
                subscriptions: Subscriptions::default(),
            },
        );
    }

    pub fn remove(&self, id: &SessionId) -> Option<SessionInfo> {
        self.sessions.write().remove(id)
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionInfo> {
        self.sessions.read().get(id).cloned()
    }

    pub fn list_by_filter(&self, filter: &SessionFilter) -> Vec<SessionInfo> {
        self.sessions
            .read()
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect()
    }

    pub fn update_activity(&self, id: &SessionId, now_ms: u64) -> Result<(), SessionRegistryError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionRegistryError::NotFound(id.clone()))?;
        session.last_activity = now_ms;
        Ok(())
    }

    pub fn mark_error(&self, id: &SessionId) -> Result<(), SessionRegistryError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionRegistryError::NotFound(id.clone()))?;
        session.state = SessionState::Error;
        Ok(())
    }

    /// Remove every session, returning the ids removed so the gateway can
    /// close their transports.
    pub fn close_all(&self) -> Vec<SessionId> {
        let mut sessions = self.sessions.write();
        let ids: Vec<SessionId> = sessions.keys().cloned().collect();
        sessions.clear();
        ids
    }

    pub fn update_subscription(
        &self,
        id: &SessionId,
        action: SubscriptionAction,
        process_id: Option<&ProcessId>,
    ) -> Result<(), SessionRegistryError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionRegistryError::NotFound(id.clone()))?;
        match action {
            SubscriptionAction::Subscribe => {
                if let Some(process_id) = process_id {
                    session.subscriptions.process_ids.insert(process_id.clone());
                }
            }
            SubscriptionAction::Unsubscribe => {
                if let Some(process_id) = process_id {
                    session.subscriptions.process_ids.remove(process_id);
                }
            }
            SubscriptionAction::SubscribeAll => {
                session.subscriptions.all_processes = true;
                session.subscriptions.process_ids.clear();
            }
            SubscriptionAction::UnsubscribeAll => {
                session.subscriptions.all_processes = false;
                session.subscriptions.process_ids.clear();
            }
        }
        Ok(())
    }

    pub fn is_subscribed_to_process(&self, id: &SessionId, process_id: &ProcessId) -> bool {
        self.sessions
            .read()
            .get(id)
            .map(|session| is_subscribed(session, process_id))
            .unwrap_or(false)
    }

    /// Remove sessions in `Error` state or whose `last_activity` is older
    /// than `max_age_ms`, returning the ids removed.
    pub fn cleanup_inactive(&self, max_age_ms: u64, now_ms: u64) -> Vec<SessionId> {
        let mut sessions = self.sessions.write();
        let stale: Vec<SessionId> = sessions
            .values()
            .filter(|s| {
                s.state == SessionState::Error
                    || now_ms.saturating_sub(s.last_activity) > max_age_ms
            })
            .map(|s| s.id.clone())
            .collect();
        for id in &stale {
            sessions.remove(id);
        }
        stale
    }
}

#[cfg(test)]
#[path = "session_registry_tests.rs"]
mod tests;
