//! C5: synchronous, non-blocking publish/subscribe fan-out of supervisor
//! events to in-process listeners (the gateway's broadcast path chief
//! among them).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use supervisor_core::{BusEvent, Topic};

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

struct Subscription {
    id: u64,
    handler: Handler,
}

/// Returned by [`EventBus::subscribe`]; pass to [`EventBus::unsubscribe`]
/// to remove that one handler.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionHandle {
    topic: Topic,
    id: u64,
}

/// In-process event bus. Handlers are invoked synchronously, in
/// subscription order, on the publisher's thread. A handler that panics
/// is caught and logged; it never poisons the bus or blocks other
/// handlers.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<Topic, Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        topic: Topic,
        handler: impl Fn(&BusEvent) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers
            .write()
            .entry(topic)
            .or_default()
            .push(Subscription {
                id,
                handler: Arc::new(handler),
            });
        SubscriptionHandle { topic, id }
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        if let Some(subs) = self.subscribers.write().get_mut(&handle.topic) {
            subs.retain(|s| s.id != handle.id);
        }
    }

    /// Remove every subscriber, or only those on `topic` if given.
    pub fn unsubscribe_all(&self, topic: Option<Topic>) {
        let mut subscribers = self.subscribers.write();
        match topic {
            Some(topic) => {
                subscribers.remove(&topic);
            }
            None => subscribers.clear(),
        }
    }

    /// Deliver `event` to every subscriber of its topic, in subscription
    /// order. Each handler is invoked at most once. Publishing never
    /// blocks on a slow handler beyond what that handler itself takes —
    /// handlers that need to do real work must hand off.
    pub fn publish(&self, event: BusEvent) {
        let topic = event.topic();
        let handlers: Vec<Handler> = {
            let subscribers = self.subscribers.read();
            subscribers
                .get(&topic)
                .map(|subs| subs.iter().map(|s| s.handler.clone()).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(&event)));
            if outcome.is_err() {
                tracing::error!(?topic, "event bus handler panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
