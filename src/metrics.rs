use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::pipeline::ensure_metrics_described;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and publish the catalog size.
    /// Later calls reuse the installed recorder.
    pub fn init(catalog_topics: usize) -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                // Use default buckets to avoid API differences across crate versions.
                PrometheusBuilder::new()
                    .install_recorder()
                    .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))
            })?
            .clone();

        ensure_metrics_described();
        gauge!("related_posts_catalog_topics").set(catalog_topics as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
