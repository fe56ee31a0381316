// src/widget.rs
//! Render-state holder for the related posts panel.
//!
//! The widget owns no pipeline logic. On mount and on every refresh trigger it
//! snapshots the catalog, runs the pure pipeline and swaps in the new result.

use serde::Serialize;
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;

use crate::catalog::CatalogHandle;
use crate::pipeline::{self, EnvironmentReader, PipelineSettings};
use crate::trigger::{SubscriptionId, TriggerBus, TriggerEvent};
use crate::viewport::RenderOutcome;

/// What the host renders. `outcome == None` before the first run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WidgetState {
    pub loading: bool,
    pub outcome: Option<RenderOutcome>,
    /// Completed runs since creation.
    pub runs: u64,
}

pub struct RelatedPostsWidget {
    catalog: CatalogHandle,
    env: Arc<dyn EnvironmentReader>,
    settings: PipelineSettings,
    state: Mutex<WidgetState>,
}

impl RelatedPostsWidget {
    pub fn new(
        catalog: CatalogHandle,
        env: Arc<dyn EnvironmentReader>,
        settings: PipelineSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            env,
            settings,
            state: Mutex::new(WidgetState::default()),
        })
    }

    /// Initial run.
    pub fn mount(&self) -> RenderOutcome {
        self.refresh()
    }

    /// Replace the render state with a fresh run. The state lock is held for
    /// the whole "loading, clear, recompute" sequence so readers never see a
    /// half-updated state.
    pub fn refresh(&self) -> RenderOutcome {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        st.loading = true;
        st.outcome = None;

        let catalog = self.catalog.snapshot();
        let outcome = pipeline::run(&catalog, self.env.as_ref(), &self.settings);

        st.outcome = Some(outcome.clone());
        st.loading = false;
        st.runs += 1;
        outcome
    }

    /// Rerun on the refresh event; ignore everything else.
    pub fn handle_event(&self, event: &TriggerEvent) -> Option<RenderOutcome> {
        if !event.is_refresh() {
            debug!(target: "related_posts", event = %event.name, "ignored event");
            return None;
        }
        if !event.payload.is_null() {
            debug!(target: "related_posts", payload = %event.payload, "refresh requested");
        }
        Some(self.refresh())
    }

    /// Register on `bus`. Holds only a weak reference, so a dropped widget
    /// turns the callback into a no-op.
    pub fn subscribe(self: &Arc<Self>, bus: &TriggerBus) -> SubscriptionId {
        let weak: Weak<Self> = Arc::downgrade(self);
        bus.subscribe(move |ev| {
            if let Some(w) = weak.upgrade() {
                w.handle_event(ev);
            }
        })
    }

    pub fn state(&self) -> WidgetState {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Post, PriorityTier, Topic};
    use crate::pipeline::HostEnvironment;
    use crate::viewport::SuppressReason;

    fn catalog() -> CatalogHandle {
        CatalogHandle::new(Catalog {
            topics: vec![Topic::new("gravel", PriorityTier::Sport)
                .keywords(["gravel"])
                .post(Post::new("Gravel Guide", "/blog/gravel"))],
            priority_posts: vec![],
        })
    }

    #[test]
    fn refresh_event_reruns_other_events_ignored() {
        let host = Arc::new(HostEnvironment::new());
        host.navigate("/home", Some(1200));
        let w = RelatedPostsWidget::new(catalog(), host.clone(), PipelineSettings::default());
        let bus = TriggerBus::new();
        w.subscribe(&bus);

        assert_eq!(
            w.mount().suppress_reason(),
            Some(SuppressReason::NoTopicMatch)
        );

        host.navigate("/c/gravel-bikes", None);
        bus.publish(&TriggerEvent::new("something-else"));
        let st = w.state();
        assert_eq!(st.runs, 1);
        assert!(!st.outcome.as_ref().unwrap().is_rendered());

        bus.publish(&TriggerEvent::refresh());
        let st = w.state();
        assert_eq!(st.runs, 2);
        assert!(!st.loading);
        assert_eq!(st.outcome.unwrap().posts()[0].title, "Gravel Guide");
    }

    #[test]
    fn dropped_widget_does_not_panic_on_publish() {
        let host = Arc::new(HostEnvironment::new());
        let bus = TriggerBus::new();
        {
            let w = RelatedPostsWidget::new(catalog(), host, PipelineSettings::default());
            w.subscribe(&bus);
        }
        assert_eq!(bus.publish(&TriggerEvent::refresh()), 1);
    }
}
