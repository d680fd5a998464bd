//! RapidAPI real-time events search adapter.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use metrics::counter;
use serde_json::Value;

use crate::classify;
use crate::event::{
    placeholder_image, sanitize_coordinates, Category, Event, EventSource, SearchParams,
};
use crate::providers::{fallback_event, get_json, join_location, now_iso, EventProvider};

pub struct RapidapiProvider {
    mode: Mode,
}

enum Mode {
    Fixture(Vec<Value>),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl RapidapiProvider {
    pub fn from_fixture(body: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(body)?;
        Ok(Self {
            mode: Mode::Fixture(extract_records(&v)),
        })
    }

    pub fn from_config(base_url: impl Into<String>, api_key: &str) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(v) = reqwest::header::HeaderValue::from_str(api_key) {
            headers.insert("X-RapidAPI-Key", v);
        }
        let client = reqwest::Client::builder()
            .timeout(super::DEFAULT_FETCH_TIMEOUT)
            .default_headers(headers)
            .build()
            .unwrap_or_default();
        Self {
            mode: Mode::Http {
                base_url: base_url.into(),
                client,
            },
        }
    }

    fn build_query(&self, params: &SearchParams) -> Vec<(String, String)> {
        // The search endpoint is text-first; location narrows the query text
        // and the geofilter does the precise radius work afterwards.
        let mut text = params
            .expanded_keyword()
            .unwrap_or_else(|| "events".to_string());
        if let Some(loc) = &params.location {
            if !loc.trim().is_empty() {
                text = format!("{text} in {loc}");
            }
        }
        let mut q = vec![
            ("query".to_string(), text),
            ("limit".to_string(), params.limit.to_string()),
        ];
        if let Some(d) = &params.start_date {
            q.push(("date".to_string(), d.clone()));
        }
        q
    }
}

fn extract_records(body: &Value) -> Vec<Value> {
    body.get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn try_normalize(raw: &Value) -> Option<Event> {
    let title = raw.get("name").and_then(Value::as_str)?;
    let description = raw
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    // "2025-05-15 19:00:00" → display date/time; anything unparseable keeps
    // the provider's human-readable string as-is.
    let start_time = raw.get("start_time").and_then(Value::as_str).unwrap_or("");
    let human = raw
        .get("date_human_readable")
        .and_then(Value::as_str)
        .unwrap_or("");
    let (date, time, raw_start) =
        match NaiveDateTime::parse_from_str(start_time, "%Y-%m-%d %H:%M:%S") {
            Ok(dt) => (
                dt.format("%Y-%m-%d").to_string(),
                dt.format("%H:%M:%S").to_string(),
                dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            ),
            Err(_) if !human.is_empty() => (human.to_string(), "00:00:00".to_string(), now_iso()),
            Err(_) => ("Date TBA".to_string(), "00:00:00".to_string(), now_iso()),
        };

    let venue_obj = raw.get("venue");
    let venue = venue_obj
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let full_address = venue_obj
        .and_then(|v| v.get("full_address"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let city = venue_obj
        .and_then(|v| v.get("city"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let state = venue_obj
        .and_then(|v| v.get("state"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let mut location = if !full_address.is_empty() {
        full_address.to_string()
    } else {
        join_location(&[city, state])
    };
    if location.is_empty() {
        location = "Location TBA".to_string();
    }

    let coordinates = venue_obj.and_then(|v| {
        let lng = v.get("longitude")?.as_f64()?;
        let lat = v.get("latitude")?.as_f64()?;
        sanitize_coordinates(lng, lat)
    });

    let id = match raw.get("event_id").and_then(Value::as_str) {
        Some(raw_id) => format!("rapidapi-{raw_id}"),
        None => super::derived_id(EventSource::Rapidapi, &format!("{title}|{raw_start}")),
    };

    let image = raw
        .get("thumbnail")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let url = raw
        .get("link")
        .and_then(Value::as_str)
        .or_else(|| raw.pointer("/ticket_links/0/link").and_then(Value::as_str))
        .map(str::to_string);

    let mut ev = Event {
        id,
        source: EventSource::Rapidapi,
        title: title.to_string(),
        description,
        date,
        time,
        raw_start,
        location,
        venue: venue.clone(),
        coordinates,
        category: Category::Other,
        party_subcategory: None,
        image: image.unwrap_or_else(|| placeholder_image(Category::Other)),
        url,
        price: None,
        rank: None,
        local_relevance: None,
        attendance_forecast: None,
    };

    if classify::is_party_event(&ev.title, &ev.description, venue.as_deref()) {
        let sub = classify::detect_party_subcategory(&ev.title, &ev.description, &ev.time);
        ev.set_party(sub);
    }

    Some(ev)
}

/// Total normalization; malformed records become fallback events.
pub fn normalize(raw: &Value) -> Event {
    try_normalize(raw).unwrap_or_else(|| fallback_event(EventSource::Rapidapi))
}

#[async_trait]
impl EventProvider for RapidapiProvider {
    fn source(&self) -> EventSource {
        EventSource::Rapidapi
    }

    fn name(&self) -> &'static str {
        "RapidAPI"
    }

    async fn fetch_raw(&self, params: &SearchParams) -> Result<Vec<Value>> {
        match &self.mode {
            Mode::Fixture(records) => Ok(records.clone()),
            Mode::Http { base_url, client } => {
                let url = format!("{}/search-events", base_url.trim_end_matches('/'));
                let body = get_json(client, "RapidAPI", &url, &self.build_query(params)).await?;
                let records = extract_records(&body);
                counter!("aggregate_events_total").increment(records.len() as u64);
                Ok(records)
            }
        }
    }

    fn normalize(&self, raw: &Value) -> Event {
        normalize(raw)
    }
}
