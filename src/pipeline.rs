//! # Aggregation Pipeline
//!
//! Orchestrates the whole search: validate params, fan provider fetches out
//! concurrently, normalize, geofilter, merge with per-source stats, rank
//! party results, paginate. A failing provider degrades completeness, never
//! availability; only parameter validation errors reach the caller.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::classify;
use crate::event::{Event, SearchParams};
use crate::geo::{self, CoordinateFallback, GeoPoint};
use crate::merge::{self, SourceBatch, SourceStats};
use crate::providers::EventProvider;
use crate::rate_limit::RateLimiter;
use crate::score;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("aggregate_events_total", "Raw records fetched from providers.");
        describe_counter!("aggregate_kept_total", "Events returned after the full pipeline.");
        describe_counter!(
            "aggregate_fallback_total",
            "Malformed records replaced by fallback events."
        );
        describe_counter!("aggregate_dedup_total", "Events removed by id deduplication.");
        describe_counter!("provider_errors_total", "Provider fetch/parse errors.");
        describe_histogram!("provider_fetch_ms", "Provider fetch time in milliseconds.");
        describe_gauge!("aggregate_last_run_ts", "Unix ts of the last pipeline run.");
    });
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub page: usize,
    pub limit: usize,
    pub returned: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub events: Vec<Event>,
    pub source_stats: BTreeMap<String, SourceStats>,
    pub meta: SearchMeta,
}

pub struct AggregationPipeline {
    providers: Vec<Arc<dyn EventProvider>>,
    retry: bool,
    limiter: Option<Mutex<RateLimiter>>,
}

impl AggregationPipeline {
    pub fn new(providers: Vec<Arc<dyn EventProvider>>) -> Self {
        Self {
            providers,
            retry: true,
            limiter: None,
        }
    }

    pub fn with_retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(Mutex::new(limiter));
        self
    }

    /// Run one aggregation. Errors only on invalid `params`.
    pub async fn search(&self, params: &SearchParams) -> anyhow::Result<SearchOutcome> {
        params.validate()?;
        ensure_metrics_described();

        // Batches land in a slot per configured provider, so the merged
        // order never depends on task completion order. Pagination slices
        // the merged list; an unstable order here would let consecutive
        // pages overlap or skip events.
        let mut set: JoinSet<(usize, SourceBatch)> = JoinSet::new();
        let mut slots: Vec<Option<SourceBatch>> = Vec::new();
        slots.resize_with(self.providers.len(), || None);

        for (idx, provider) in self.providers.iter().enumerate() {
            if let Some(limiter) = &self.limiter {
                let allowed = limiter
                    .lock()
                    .map(|mut l| l.check(provider.name(), Instant::now()))
                    .unwrap_or(true);
                if !allowed {
                    warn!(provider = provider.name(), "rate limit exceeded, skipping fetch");
                    slots[idx] = Some(SourceBatch::failed(provider.source(), "rate limited"));
                    continue;
                }
            }
            let provider = provider.clone();
            let params = params.clone();
            let retry = self.retry;
            set.spawn(async move { (idx, fetch_batch(provider, params, retry).await) });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, batch)) => slots[idx] = Some(batch),
                Err(e) => warn!(error = ?e, "provider task failed to join"),
            }
        }
        let mut batches: Vec<SourceBatch> = slots.into_iter().flatten().collect();

        // Geofilter per batch, before stats are counted, so sourceStats
        // reflect what actually reaches the caller.
        let center = match (params.latitude, params.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };
        if let Some(center) = center {
            let fallback = if params.wants_party() {
                CoordinateFallback::Jitter
            } else {
                CoordinateFallback::Exclude
            };
            for batch in &mut batches {
                let events = std::mem::take(&mut batch.events);
                batch.events = geo::filter_by_radius(events, center, params.radius, fallback);
            }
        }

        let (mut events, source_stats) = merge::merge(batches);

        if params.wants_party() {
            events = party_post_filter(events);
            events = score::score_and_sort(events);
        }

        let start = (params.page - 1).saturating_mul(params.limit);
        let events: Vec<Event> = events.into_iter().skip(start).take(params.limit).collect();
        let returned = events.len();

        counter!("aggregate_kept_total").increment(returned as u64);
        gauge!("aggregate_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        info!(
            returned,
            page = params.page,
            party = params.wants_party(),
            sources = source_stats.len(),
            "aggregation run complete"
        );

        Ok(SearchOutcome {
            events,
            source_stats,
            meta: SearchMeta {
                page: params.page,
                limit: params.limit,
                returned,
                has_more: returned >= params.limit,
            },
        })
    }
}

/// Fetch one provider with deadline and (optionally) a single retry, then
/// normalize every raw record. Never returns an error: failures become an
/// errored batch.
async fn fetch_batch(
    provider: Arc<dyn EventProvider>,
    params: SearchParams,
    retry: bool,
) -> SourceBatch {
    let source = provider.source();
    let deadline = provider.timeout();
    let attempts = if retry { 2 } else { 1 };

    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match tokio::time::timeout(deadline, provider.fetch_raw(&params)).await {
            Ok(Ok(raws)) => {
                let events = raws.iter().map(|r| provider.normalize(r)).collect();
                return SourceBatch::ok(source, events);
            }
            Ok(Err(e)) => {
                last_error = e.to_string();
            }
            Err(_) => {
                last_error = format!("timeout after {}s", deadline.as_secs());
            }
        }
        warn!(provider = provider.name(), attempt, error = %last_error, "provider fetch failed");
        counter!("provider_errors_total").increment(1);
        if attempt < attempts {
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
    }
    SourceBatch::failed(source, last_error)
}

/// Party post-filter: keep classified party events, reclassify matching
/// candidates, drop the rest.
fn party_post_filter(events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .filter_map(|mut ev| {
            if ev.is_party() {
                return Some(ev);
            }
            if classify::is_party_event(&ev.title, &ev.description, ev.venue.as_deref()) {
                let sub = classify::detect_party_subcategory(&ev.title, &ev.description, &ev.time);
                ev.set_party(sub);
                return Some(ev);
            }
            None
        })
        .collect()
}
