// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod cache;
pub mod classify;
pub mod config;
pub mod event;
pub mod geo;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod rate_limit;
pub mod score;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::event::{Category, Event, EventSource, PartySubcategory, SearchParams};
pub use crate::pipeline::{AggregationPipeline, SearchOutcome};

use std::sync::Arc;
use std::time::Duration;

/// Build the full application state from configuration: providers, rate
/// limiter, and search cache wired the same way the binary does it, so
/// integration tests exercise the real composition.
pub fn build_state(cfg: &config::AppConfig) -> AppState {
    let limiter = rate_limit::RateLimiter::new(
        cfg.pipeline.rate_limit_max,
        Duration::from_secs(cfg.pipeline.rate_limit_window_secs),
    );
    let pipeline = AggregationPipeline::new(cfg.build_providers())
        .with_retry(cfg.pipeline.retry)
        .with_rate_limiter(limiter);
    AppState {
        pipeline: Arc::new(pipeline),
        cache: Arc::new(cache::TtlCache::new(Duration::from_secs(
            cfg.pipeline.cache_ttl_secs,
        ))),
    }
}
