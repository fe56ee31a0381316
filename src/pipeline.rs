// src/pipeline.rs
//! # Related Posts Pipeline
//! Pure, single-pass pipeline mapping `(catalog, location, viewport, now)` to
//! a `RenderOutcome`. No I/O besides reads from the injected environment.
//!
//! Stages: keyword index → URL match → tier ranking → post assembly →
//! viewport gate. Every run rebuilds all derived state from scratch.

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::sync::RwLock;
use tracing::debug;

use crate::assembler::assemble_posts;
use crate::catalog::Catalog;
use crate::config::WidgetConfig;
use crate::devlog::dev_log_outcome;
use crate::indexer::build_keyword_index;
use crate::matcher::{match_location, opt_out_requested};
use crate::ranker::rank_topics;
use crate::viewport::{gate_and_truncate, RenderOutcome, SuppressReason, ViewportPolicy};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("related_posts_runs_total", "Pipeline runs.");
        describe_counter!(
            "related_posts_suppressed_total",
            "Runs that rendered nothing, by reason."
        );
        describe_counter!(
            "related_posts_rendered_total",
            "Runs that rendered a panel, by device."
        );
        describe_histogram!(
            "related_posts_rendered_posts",
            "Number of posts in a rendered panel."
        );
        describe_gauge!(
            "related_posts_catalog_topics",
            "Topics in the currently loaded catalog."
        );
    });
}

/// Host capabilities the pipeline reads. `None` means "not available here"
/// (e.g. a headless context), which never fails a run.
pub trait EnvironmentReader: Send + Sync {
    /// Raw location: an absolute href or a site-relative path with query.
    fn location(&self) -> Option<String>;
    fn viewport_width(&self) -> Option<u32>;
    fn now(&self) -> DateTime<Utc>;
}

/// Fixed snapshot of the environment; used by the stateless API and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEnvironment {
    pub location: Option<String>,
    pub viewport_width: Option<u32>,
    pub now: DateTime<Utc>,
}

impl StaticEnvironment {
    pub fn new(location: impl Into<String>, viewport_width: u32, now: DateTime<Utc>) -> Self {
        Self {
            location: Some(location.into()),
            viewport_width: Some(viewport_width),
            now,
        }
    }
}

impl EnvironmentReader for StaticEnvironment {
    fn location(&self) -> Option<String> {
        self.location.clone()
    }
    fn viewport_width(&self) -> Option<u32> {
        self.viewport_width
    }
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Live environment updated by the host on navigation; reads the wall clock.
#[derive(Debug, Default)]
pub struct HostEnvironment {
    inner: RwLock<(Option<String>, Option<u32>)>,
}

impl HostEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigate(&self, location: impl Into<String>, viewport_width: Option<u32>) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        g.0 = Some(location.into());
        if viewport_width.is_some() {
            g.1 = viewport_width;
        }
    }

    pub fn resize(&self, viewport_width: u32) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        g.1 = Some(viewport_width);
    }
}

impl EnvironmentReader for HostEnvironment {
    fn location(&self) -> Option<String> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).0.clone()
    }
    fn viewport_width(&self) -> Option<u32> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).1
    }
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Per-deployment knobs the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub viewport: ViewportPolicy,
    pub opt_out_param: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&WidgetConfig::default())
    }
}

impl From<&WidgetConfig> for PipelineSettings {
    fn from(cfg: &WidgetConfig) -> Self {
        Self {
            viewport: cfg.viewport_policy(),
            opt_out_param: cfg.opt_out_param.clone(),
        }
    }
}

/// Run the full pipeline once.
pub fn run(catalog: &Catalog, env: &dyn EnvironmentReader, settings: &PipelineSettings) -> RenderOutcome {
    ensure_metrics_described();
    counter!("related_posts_runs_total").increment(1);

    let outcome = evaluate(catalog, env, settings);

    match &outcome {
        RenderOutcome::Suppressed { reason } => {
            counter!("related_posts_suppressed_total", "reason" => reason.as_str()).increment(1);
        }
        RenderOutcome::Render { device, posts } => {
            counter!("related_posts_rendered_total", "device" => device.as_str()).increment(1);
            histogram!("related_posts_rendered_posts").record(posts.len() as f64);
        }
    }
    outcome
}

fn evaluate(catalog: &Catalog, env: &dyn EnvironmentReader, settings: &PipelineSettings) -> RenderOutcome {
    let Some(location) = env.location() else {
        debug!(target: "related_posts", "no location available");
        return RenderOutcome::suppressed(SuppressReason::NoEnvironment);
    };

    if opt_out_requested(&location, &settings.opt_out_param) {
        debug!(target: "related_posts", param = %settings.opt_out_param, "opt-out flag set");
        return RenderOutcome::suppressed(SuppressReason::OptOut);
    }

    // 1) + 2) keyword index and URL match
    let index = build_keyword_index(&catalog.topics);
    let matched = match_location(&index, &location);
    if matched.is_empty() {
        debug!(target: "related_posts", keywords = index.len(), "no keyword matched");
        dev_log_outcome("no_match", &location, &[], 0);
        return RenderOutcome::suppressed(SuppressReason::NoTopicMatch);
    }

    let Some(width) = env.viewport_width() else {
        debug!(target: "related_posts", "no viewport width available");
        return RenderOutcome::suppressed(SuppressReason::NoEnvironment);
    };

    // 3) tier ranking
    let ranked = rank_topics(&matched, &catalog.topics);

    // 4) assembly
    let assembly = assemble_posts(&ranked, &catalog.topics, &catalog.priority_posts, env.now());
    debug!(
        target: "related_posts",
        matched = matched.len(),
        assembled = assembly.posts.len(),
        pinned = assembly.pinned_survivors,
        filtered = assembly.filtered_out,
        dedup = assembly.dedup_out,
        "assembled"
    );

    // 5) viewport gate
    let outcome = gate_and_truncate(assembly, width, &settings.viewport);

    let labels: Vec<String> = ranked
        .iter()
        .filter_map(|&i| catalog.topics.get(i))
        .map(|t| t.label.clone())
        .collect();
    let event = match outcome.suppress_reason() {
        Some(r) => r.as_str(),
        None => "render",
    };
    dev_log_outcome(event, &location, &labels, outcome.posts().len());

    outcome
}
