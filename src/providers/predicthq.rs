//! PredictHQ Events API adapter.

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use crate::classify;
use crate::event::{
    placeholder_image, sanitize_coordinates, Category, Event, EventSource, SearchParams,
};
use crate::providers::{fallback_event, get_json, join_location, now_iso, EventProvider};

/// Labels that force `category == party` regardless of the category lookup.
const PARTY_LABELS: &[&str] = &[
    "nightlife",
    "party",
    "club",
    "nightclub",
    "dance-club",
    "disco",
    "dance-party",
    "dj-set",
    "dj-night",
    "dj-party",
    "rave",
];

pub struct PredicthqProvider {
    mode: Mode,
}

enum Mode {
    Fixture(Vec<Value>),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl PredicthqProvider {
    pub fn from_fixture(body: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(body)?;
        Ok(Self {
            mode: Mode::Fixture(extract_records(&v)),
        })
    }

    pub fn from_config(base_url: impl Into<String>, token: &str) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(v) = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(reqwest::header::AUTHORIZATION, v);
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
        let mut q = vec![("limit".to_string(), params.limit.to_string())];
        if let (Some(lat), Some(lng)) = (params.latitude, params.longitude) {
            q.push((
                "within".to_string(),
                format!("{}mi@{lat},{lng}", params.radius.ceil() as i64),
            ));
        }
        if let Some(k) = params.expanded_keyword() {
            q.push(("q".to_string(), k));
        }
        if let Some(d) = &params.start_date {
            q.push(("start.gte".to_string(), d.clone()));
        }
        if let Some(d) = &params.end_date {
            q.push(("start.lte".to_string(), d.clone()));
        }
        q
    }
}

fn extract_records(body: &Value) -> Vec<Value> {
    body.get("results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn map_category(category: &str) -> Category {
    match category {
        "concerts" => Category::Music,
        "festivals" => Category::Party,
        "performing-arts" => Category::Arts,
        "sports" => Category::Sports,
        "community" => Category::Family,
        "food-drink" => Category::Food,
        _ => Category::Other,
    }
}

fn venue_entity_name(raw: &Value) -> Option<String> {
    raw.get("entities")?
        .as_array()?
        .iter()
        .find(|e| {
            let t = e
                .get("type")
                .or_else(|| e.get("entity_type"))
                .and_then(Value::as_str);
            t == Some("venue")
        })?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

fn try_normalize(raw: &Value) -> Option<Event> {
    let title = raw.get("title").and_then(Value::as_str)?;
    let description = raw
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let start = raw.get("start").and_then(Value::as_str);
    let raw_start = start.map(str::to_string).unwrap_or_else(now_iso);
    // Display strings come straight from splitting the ISO timestamp.
    let mut iso_parts = raw_start.splitn(2, 'T');
    let date = iso_parts.next().unwrap_or("").to_string();
    let time = iso_parts
        .next()
        .map(|t| t.trim_end_matches('Z').to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "00:00:00".to_string());

    let venue = venue_entity_name(raw);
    let place = raw
        .pointer("/geo/address/locality")
        .and_then(Value::as_str)
        .unwrap_or("");
    let state = raw
        .pointer("/geo/address/region")
        .and_then(Value::as_str)
        .unwrap_or("");
    let country = raw
        .pointer("/geo/address/country_code")
        .and_then(Value::as_str)
        .or_else(|| raw.get("country").and_then(Value::as_str))
        .unwrap_or("");
    let mut location = join_location(&[venue.as_deref().unwrap_or(""), place, state, country]);
    if location.is_empty() {
        location = "Location TBA".to_string();
    }

    let coordinates = raw.get("location").and_then(Value::as_array).and_then(|a| {
        let lng = a.first()?.as_f64()?;
        let lat = a.get(1)?.as_f64()?;
        sanitize_coordinates(lng, lat)
    });

    let labels: Vec<&str> = raw
        .get("labels")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let has_party_label = labels
        .iter()
        .any(|l| PARTY_LABELS.contains(&l.to_lowercase().as_str()));

    let phq_category = raw.get("category").and_then(Value::as_str).unwrap_or("");
    let mapped = map_category(phq_category);

    let id = match raw.get("id").and_then(Value::as_str) {
        Some(raw_id) => format!("predicthq-{raw_id}"),
        None => super::derived_id(EventSource::Predicthq, &format!("{title}|{raw_start}")),
    };

    let mut ev = Event {
        id,
        source: EventSource::Predicthq,
        title: title.to_string(),
        description,
        date,
        time,
        raw_start,
        location,
        venue,
        coordinates,
        category: mapped,
        party_subcategory: None,
        image: placeholder_image(mapped),
        url: None,
        price: None,
        rank: raw.get("rank").and_then(Value::as_f64),
        local_relevance: raw.get("local_rank").and_then(Value::as_f64),
        attendance_forecast: raw.get("phq_attendance").and_then(Value::as_u64),
    };

    // Label override takes precedence over the category lookup table.
    if has_party_label || ev.category == Category::Party {
        let sub = classify::detect_party_subcategory(&ev.title, &ev.description, &ev.time);
        ev.set_party(sub);
        ev.image = placeholder_image(Category::Party);
    }

    Some(ev)
}

/// Total normalization; malformed records become fallback events.
pub fn normalize(raw: &Value) -> Event {
    try_normalize(raw).unwrap_or_else(|| fallback_event(EventSource::Predicthq))
}

#[async_trait]
impl EventProvider for PredicthqProvider {
    fn source(&self) -> EventSource {
        EventSource::Predicthq
    }

    fn name(&self) -> &'static str {
        "PredictHQ"
    }

    async fn fetch_raw(&self, params: &SearchParams) -> Result<Vec<Value>> {
        match &self.mode {
            Mode::Fixture(records) => Ok(records.clone()),
            Mode::Http { base_url, client } => {
                let url = format!("{}/events/", base_url.trim_end_matches('/'));
                let body = get_json(client, "PredictHQ", &url, &self.build_query(params)).await?;
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
