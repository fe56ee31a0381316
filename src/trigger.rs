// src/trigger.rs
//! In-process event source for re-run signals (e.g. client-side route changes).
//!
//! Subscribers register a callback and receive every published event; they
//! decide themselves which event names they care about.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Event name that makes the related posts widget recompute.
pub const REFRESH_EVENT: &str = "related-posts:refresh";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl TriggerEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn refresh() -> Self {
        Self::new(REFRESH_EVENT)
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn is_refresh(&self) -> bool {
        self.name == REFRESH_EVENT
    }
}

type Callback = Arc<dyn Fn(&TriggerEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

/// Cloneable handle; all clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct TriggerBus {
    inner: Arc<Mutex<BusInner>>,
}

impl TriggerBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&TriggerEvent) + Send + Sync + 'static,
    {
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = g.next_id;
        g.next_id += 1;
        g.subscribers.push((id, Arc::new(callback)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = g.subscribers.len();
        g.subscribers.retain(|(sid, _)| *sid != id.0);
        g.subscribers.len() != before
    }

    /// Deliver `event` to every subscriber in registration order.
    /// Callbacks run outside the bus lock, so they may publish or subscribe.
    pub fn publish(&self, event: &TriggerEvent) -> usize {
        let subs: Vec<Callback> = {
            let g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            g.subscribers.iter().map(|(_, cb)| cb.clone()).collect()
        };
        tracing::trace!(target: "related_posts", event = %event.name, subscribers = subs.len(), "publish");
        for cb in &subs {
            cb(event);
        }
        subs.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .subscribers
            .len()
    }
}
