//! Prometheus wiring: recorder installation plus the `/metrics` route the
//! binary merges into the main router. Series are registered lazily by the
//! pipeline and providers; this module only owns the exporter side.

use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder. Called once at startup, before any
    /// counter or gauge is touched; a second install would panic, which is
    /// the right failure mode for a wiring bug.
    pub fn init(cache_ttl_secs: u64) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        // Static config surfaced as a gauge so dashboards can display the
        // effective TTL next to cache hit rates.
        gauge!("search_cache_ttl_secs").set(cache_ttl_secs as f64);

        Self { handle }
    }

    /// `/metrics` in Prometheus exposition format.
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
