//! Provider adapters: one per upstream API, each converting provider-raw
//! JSON records into canonical [`Event`]s.
//!
//! `normalize` is total: a malformed record yields a minimal valid fallback
//! event instead of an error, so one bad upstream record never aborts a
//! batch. Fetch errors are the pipeline's problem and surface only in
//! per-source stats.

pub mod predicthq;
pub mod rapidapi;
pub mod ticketmaster;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use rand::Rng;
use serde_json::Value;

use crate::event::{placeholder_image, Category, Event, EventSource, SearchParams};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait EventProvider: Send + Sync {
    fn source(&self) -> EventSource;
    fn name(&self) -> &'static str;

    /// Per-provider fetch deadline; exceeding it makes this a failed source,
    /// never a pipeline-fatal error.
    fn timeout(&self) -> Duration {
        DEFAULT_FETCH_TIMEOUT
    }

    /// Issue the upstream query and return the raw event records.
    async fn fetch_raw(&self, params: &SearchParams) -> Result<Vec<Value>>;

    /// Pure, total normalization of one raw record.
    fn normalize(&self, raw: &Value) -> Event;
}

/// Minimal valid event for a record that could not be normalized. Tagged
/// with a source-scoped error-recovery id so it never collides with real
/// ids and stays identifiable downstream.
pub fn fallback_event(source: EventSource) -> Event {
    counter!("aggregate_fallback_total").increment(1);
    let suffix: u16 = rand::rng().random_range(0..10_000);
    let now = chrono::Utc::now();
    Event {
        id: format!("{}-error-{}-{:04}", source.prefix(), now.timestamp_millis(), suffix),
        source,
        title: "Event details unavailable".to_string(),
        description: "This event could not be read from its source.".to_string(),
        date: now.format("%Y-%m-%d").to_string(),
        time: now.format("%H:%M:%S").to_string(),
        raw_start: now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        location: "Location unavailable".to_string(),
        venue: None,
        coordinates: None,
        category: Category::Other,
        party_subcategory: None,
        image: placeholder_image(Category::Other),
        url: None,
        price: None,
        rank: None,
        local_relevance: None,
        attendance_forecast: None,
    }
}

/// Deterministic id for records that come without one upstream: short hex
/// digest of stable fields, so repeated normalization yields the same id.
pub(crate) fn derived_id(source: EventSource, seed: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{:02x}", b);
    }
    format!("{}-{}", source.prefix(), hex)
}

/// ISO-8601 "now", the documented default for unknown start times.
pub(crate) fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Join non-empty location segments with ", ".
pub(crate) fn join_location(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fetch a provider response body as JSON with error context and telemetry.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    name: &'static str,
    url: &str,
    query: &[(String, String)],
) -> Result<Value> {
    use anyhow::Context;

    let t0 = std::time::Instant::now();
    let resp = client
        .get(url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("{name} http get"))?;

    let status = resp.status();
    if !status.is_success() {
        counter!("provider_errors_total").increment(1);
        anyhow::bail!("{name} responded with status {status}");
    }

    let body = resp
        .json::<Value>()
        .await
        .with_context(|| format!("{name} response body"))?;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    metrics::histogram!("provider_fetch_ms").record(ms);
    Ok(body)
}
