//! Event Aggregation Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use event_scout::config::AppConfig;
use event_scout::metrics::Metrics;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("event_scout=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments. This is how
    // EVENTS_CONFIG_PATH and the provider API keys usually arrive.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load_default();
    let metrics = Metrics::init(cfg.pipeline.cache_ttl_secs);
    let state = event_scout::build_state(&cfg);

    let router = event_scout::create_router(state).merge(metrics.router());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "event-scout listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
