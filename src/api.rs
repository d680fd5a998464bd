use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::cache::{cache_key, TtlCache};
use crate::classify;
use crate::event::SearchParams;
use crate::pipeline::{AggregationPipeline, SearchOutcome};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AggregationPipeline>,
    pub cache: Arc<TtlCache<SearchOutcome>>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search))
        .route("/debug/classify", get(debug_classify))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Query-string shape of a search. `categories` arrives comma-separated;
/// everything else maps straight onto [`SearchParams`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius: Option<f64>,
    categories: Option<String>,
    keyword: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

impl SearchQuery {
    fn into_params(self) -> SearchParams {
        let defaults = SearchParams::default();
        SearchParams {
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            radius: self.radius.unwrap_or(defaults.radius),
            categories: self
                .categories
                .map(|c| {
                    c.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            keyword: self.keyword,
            start_date: self.start_date,
            end_date: self.end_date,
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Response {
    let params = q.into_params();
    let key = cache_key(&params);

    if let Some(hit) = state.cache.get(&key, Instant::now()) {
        return ([("x-search-cache", "HIT")], Json(hit)).into_response();
    }

    match state.pipeline.search(&params).await {
        Ok(outcome) => {
            state.cache.insert(key, outcome.clone(), Instant::now());
            ([("x-search-cache", "MISS")], Json(outcome)).into_response()
        }
        // Only parameter validation fails here; provider failures are data.
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ClassifyQuery {
    title: String,
    #[serde(default)]
    description: String,
    venue: Option<String>,
    #[serde(default = "default_time")]
    time: String,
}

fn default_time() -> String {
    "20:00:00".to_string()
}

#[derive(Debug, Serialize)]
struct ClassifyOut {
    is_party: bool,
    subcategory: Option<crate::event::PartySubcategory>,
    matched: Vec<(String, i32)>,
}

async fn debug_classify(Query(q): Query<ClassifyQuery>) -> Json<ClassifyOut> {
    let is_party = classify::is_party_event(&q.title, &q.description, q.venue.as_deref());
    let subcategory = is_party
        .then(|| classify::detect_party_subcategory(&q.title, &q.description, &q.time));
    Json(ClassifyOut {
        is_party,
        subcategory,
        matched: classify::matched_keywords(&q.title, &q.description),
    })
}
