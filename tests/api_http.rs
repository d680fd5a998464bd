// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt as _; // for `oneshot`

use event_scout::cache::TtlCache;
use event_scout::pipeline::AggregationPipeline;
use event_scout::providers::ticketmaster::TicketmasterProvider;
use event_scout::{create_router, AppState};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Build the same Router the binary uses, backed by a fixture provider.
fn test_router() -> Router {
    let fixture = json!({
        "_embedded": {"events": [{
            "id": "tm1",
            "name": "Test Concert",
            "classifications": [{"segment": {"name": "Music"}}],
            "dates": {"start": {"localDate": "2025-05-15", "localTime": "19:30:00"}},
            "_embedded": {"venues": [{
                "name": "Test Venue",
                "city": {"name": "New York"},
                "location": {"longitude": "-73.986", "latitude": "40.755"}
            }]}
        }]}
    });
    let provider =
        TicketmasterProvider::from_fixture(&fixture.to_string()).expect("fixture parses");
    let pipeline = AggregationPipeline::new(vec![Arc::new(provider)]).with_retry(false);
    create_router(AppState {
        pipeline: Arc::new(pipeline),
        cache: Arc::new(TtlCache::new(Duration::from_secs(300))),
    })
}

async fn get(app: Router, uri: &str) -> axum::http::Response<Body> {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.oneshot(req).await.expect("oneshot")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let resp = get(test_router(), "/health").await;
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn api_search_returns_expected_json_shape() {
    let resp = get(test_router(), "/search?limit=10").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-search-cache"], "MISS");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json");
    let v: Value = serde_json::from_slice(&bytes).expect("parse search json");

    // Contract checks for UI consumers: camelCase end to end.
    assert_eq!(v["events"].as_array().unwrap().len(), 1);
    assert_eq!(v["events"][0]["id"], "ticketmaster-tm1");
    assert_eq!(v["events"][0]["category"], "music");
    assert_eq!(v["sourceStats"]["ticketmaster"]["count"], 1);
    assert_eq!(v["meta"]["hasMore"], false);
    assert!(
        v["events"][0].get("score").is_none(),
        "ranking score must not leak onto the wire"
    );
}

#[tokio::test]
async fn api_repeated_search_hits_the_cache() {
    let app = test_router();

    let first = get(app.clone(), "/search?latitude=40.75&longitude=-73.99").await;
    assert_eq!(first.headers()["x-search-cache"], "MISS");

    let second = get(app.clone(), "/search?latitude=40.75&longitude=-73.99").await;
    assert_eq!(second.headers()["x-search-cache"], "HIT");

    // A different query is its own cache entry.
    let other = get(app, "/search?latitude=40.75&longitude=-73.99&radius=25").await;
    assert_eq!(other.headers()["x-search-cache"], "MISS");
}

#[tokio::test]
async fn api_invalid_params_yield_bad_request() {
    let resp = get(test_router(), "/search?radius=-1").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Latitude without longitude is half a coordinate.
    let resp = get(test_router(), "/search?latitude=40.75").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = get(test_router(), "/search?limit=0").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_debug_classify_reports_party_verdict() {
    let resp = get(
        test_router(),
        "/debug/classify?title=Warehouse%20Rave&description=open%20bar%20and%20dj%20set",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json");
    let v: Value = serde_json::from_slice(&bytes).expect("parse classify json");
    assert_eq!(v["is_party"], true);
    assert_eq!(v["subcategory"], "club");
    assert!(!v["matched"].as_array().unwrap().is_empty());

    let resp = get(test_router(), "/debug/classify?title=Tax%20seminar").await;
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json");
    let v: Value = serde_json::from_slice(&bytes).expect("parse classify json");
    assert_eq!(v["is_party"], false);
    assert!(v["subcategory"].is_null());
}
