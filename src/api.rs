use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics::gauge;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogHandle};
use crate::config::WidgetConfig;
use crate::pipeline::{self, HostEnvironment, PipelineSettings, StaticEnvironment};
use crate::trigger::{TriggerBus, TriggerEvent};
use crate::viewport::RenderOutcome;
use crate::widget::{RelatedPostsWidget, WidgetState};

#[derive(Clone)]
pub struct AppState {
    pub config: WidgetConfig,
    pub settings: PipelineSettings,
    pub catalog: CatalogHandle,
    pub host: Arc<HostEnvironment>,
    pub widget: Arc<RelatedPostsWidget>,
    pub bus: TriggerBus,
}

impl AppState {
    /// Wire catalog, host environment, widget and trigger bus; mounts the widget.
    pub fn new(config: WidgetConfig, catalog: Catalog) -> Self {
        let settings = PipelineSettings::from(&config);
        let catalog = CatalogHandle::new(catalog);
        let host = Arc::new(HostEnvironment::new());
        let widget = RelatedPostsWidget::new(catalog.clone(), host.clone(), settings.clone());
        let bus = TriggerBus::new();
        widget.subscribe(&bus);
        widget.mount();

        Self {
            config,
            settings,
            catalog,
            host,
            widget,
            bus,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/related", post(related))
        .route("/widget", get(widget_state))
        .route("/widget/navigate", post(widget_navigate))
        .route("/widget/events", post(widget_events))
        .route("/admin/reload-catalog", get(admin_reload_catalog))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct RelatedReq {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    viewport_width: Option<u32>,
    #[serde(default)]
    now: Option<DateTime<Utc>>, // if missing, use wall clock
}

/// Stateless evaluation for callers that supply the whole environment.
async fn related(State(state): State<AppState>, Json(body): Json<RelatedReq>) -> Json<RenderOutcome> {
    let env = StaticEnvironment {
        location: body.location,
        viewport_width: body.viewport_width,
        now: body.now.unwrap_or_else(Utc::now),
    };
    let catalog = state.catalog.snapshot();
    Json(pipeline::run(&catalog, &env, &state.settings))
}

async fn widget_state(State(state): State<AppState>) -> Json<WidgetState> {
    Json(state.widget.state())
}

#[derive(serde::Deserialize)]
struct NavigateReq {
    location: String,
    #[serde(default)]
    viewport_width: Option<u32>,
}

/// Client-side route change: update the host environment, then signal a rerun.
async fn widget_navigate(
    State(state): State<AppState>,
    Json(body): Json<NavigateReq>,
) -> Json<WidgetState> {
    let payload = serde_json::json!({
        "location": &body.location,
        "viewport_width": body.viewport_width,
    });
    state.host.navigate(body.location, body.viewport_width);
    state.bus.publish(&TriggerEvent::refresh().with_payload(payload));
    Json(state.widget.state())
}

#[derive(serde::Serialize)]
struct EventResp {
    delivered: usize,
    state: WidgetState,
}

async fn widget_events(
    State(state): State<AppState>,
    Json(event): Json<TriggerEvent>,
) -> Json<EventResp> {
    let delivered = state.bus.publish(&event);
    Json(EventResp {
        delivered,
        state: state.widget.state(),
    })
}

async fn admin_reload_catalog(State(state): State<AppState>) -> String {
    match state.catalog.reload_from(&state.config.catalog_path) {
        Ok(topics) => {
            gauge!("related_posts_catalog_topics").set(topics as f64);
            info!(target: "related_posts", topics, "catalog reloaded via admin");
            format!("reloaded ({topics} topics)")
        }
        Err(e) => {
            warn!(target: "related_posts", "catalog reload failed: {e:#}");
            format!("failed: {e:#}")
        }
    }
}
