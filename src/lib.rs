// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod config;
pub mod metrics;

// Pipeline stages (index → match → rank → assemble → viewport gate)
pub mod assembler;
pub mod catalog;
pub mod indexer;
pub mod matcher;
pub mod pipeline;
pub mod ranker;
pub mod viewport;

// Re-run signalling and render state
pub mod trigger;
pub mod widget;

mod devlog;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::catalog::{Catalog, Post, PriorityTier, Topic};
pub use crate::pipeline::{run, EnvironmentReader, PipelineSettings, StaticEnvironment};
pub use crate::viewport::{Device, RenderOutcome, SuppressReason};

use anyhow::Context;
use axum::Router;
use tracing::info;

/// Build the full in-process app (API + `/metrics`) from the default config
/// resolution. Used by the binary and by HTTP-level tests.
pub fn app() -> anyhow::Result<Router> {
    let config = config::WidgetConfig::load_default()?;
    let catalog = Catalog::load_from_file(&config.catalog_path)
        .with_context(|| "loading catalog for app()")?;
    let topics = catalog.topics.len();

    let metrics = metrics::Metrics::init(topics)?;
    let path = config.catalog_path.clone();
    let state = AppState::new(config, catalog);
    catalog::start_hot_reload_thread(state.catalog.clone(), path);

    info!(target: "related_posts", topics, "app ready");
    Ok(create_router(state).merge(metrics.router()))
}
