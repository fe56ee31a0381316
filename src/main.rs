//! Related Posts Service - Binary Entrypoint
//! Boots the Axum HTTP server with the related posts pipeline, widget state
//! and Prometheus metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("related_posts=info,warn"));

    // Shuttle may already have installed a subscriber; keep theirs in that case.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // Picks up RELATED_POSTS_CONFIG_PATH / RELATED_POSTS_CATALOG_PATH.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = related_posts::app().map_err(shuttle_runtime::Error::Custom)?;

    Ok(router.into())
}
