//! Ticketmaster Discovery API v2 adapter.

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use crate::event::{
    placeholder_image, sanitize_coordinates, Category, Event, EventSource, SearchParams,
};
use crate::providers::{fallback_event, get_json, join_location, now_iso, EventProvider};

pub struct TicketmasterProvider {
    mode: Mode,
}

enum Mode {
    /// Full response body, parsed up front. Used by tests.
    Fixture(Vec<Value>),
    Http {
        base_url: String,
        api_key: String,
        client: reqwest::Client,
    },
}

impl TicketmasterProvider {
    pub fn from_fixture(body: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(body)?;
        Ok(Self {
            mode: Mode::Fixture(extract_records(&v)),
        })
    }

    pub fn from_config(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(super::DEFAULT_FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            mode: Mode::Http {
                base_url: base_url.into(),
                api_key: api_key.into(),
                client,
            },
        }
    }

    fn build_query(&self, params: &SearchParams, api_key: &str) -> Vec<(String, String)> {
        let mut q = vec![
            ("apikey".to_string(), api_key.to_string()),
            ("size".to_string(), params.limit.to_string()),
        ];
        if let (Some(lat), Some(lng)) = (params.latitude, params.longitude) {
            q.push(("latlong".to_string(), format!("{lat},{lng}")));
            q.push(("radius".to_string(), (params.radius.ceil() as i64).to_string()));
            q.push(("unit".to_string(), "miles".to_string()));
        }
        if let Some(k) = params.expanded_keyword() {
            q.push(("keyword".to_string(), k));
        }
        if let Some(d) = &params.start_date {
            q.push(("startDateTime".to_string(), format!("{d}T00:00:00Z")));
        }
        if let Some(d) = &params.end_date {
            q.push(("endDateTime".to_string(), format!("{d}T23:59:59Z")));
        }
        q
    }
}

fn extract_records(body: &Value) -> Vec<Value> {
    body.pointer("/_embedded/events")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Segment name (lower-cased) to taxonomy category. Unmapped segments land
/// in `other`.
fn map_segment(segment: &str) -> Category {
    match segment {
        "music" => Category::Music,
        "sports" => Category::Sports,
        "arts & theatre" => Category::Arts,
        "film" => Category::Arts,
        "family" => Category::Family,
        "miscellaneous" => Category::Other,
        _ => Category::Other,
    }
}

/// Prefer a 16:9 image wider than 500px, else the first image with a url.
fn pick_image(raw: &Value, category: Category) -> String {
    let images = raw.get("images").and_then(Value::as_array);
    if let Some(images) = images {
        let wide = images.iter().find(|img| {
            img.get("ratio").and_then(Value::as_str) == Some("16_9")
                && img.get("width").and_then(Value::as_u64).unwrap_or(0) > 500
        });
        if let Some(url) = wide
            .or_else(|| images.first())
            .and_then(|img| img.get("url"))
            .and_then(Value::as_str)
        {
            if !url.is_empty() {
                return url.to_string();
            }
        }
    }
    placeholder_image(category)
}

fn format_price(raw: &Value) -> Option<String> {
    let range = raw.get("priceRanges")?.as_array()?.first()?;
    let min = range.get("min")?.as_f64()?;
    let max = range.get("max")?.as_f64()?;
    let currency = range.get("currency").and_then(Value::as_str).unwrap_or("USD");
    Some(format!("{} - {} {}", min, max, currency))
}

fn try_normalize(raw: &Value) -> Option<Event> {
    let title = raw.get("name").and_then(Value::as_str)?;

    let description = raw
        .get("description")
        .and_then(Value::as_str)
        .or_else(|| raw.get("info").and_then(Value::as_str))
        .unwrap_or("")
        .to_string();

    let start = raw.pointer("/dates/start");
    let local_date = start
        .and_then(|s| s.get("localDate"))
        .and_then(Value::as_str);
    let local_time = start
        .and_then(|s| s.get("localTime"))
        .and_then(Value::as_str);
    let date_time = start
        .and_then(|s| s.get("dateTime"))
        .and_then(Value::as_str);

    let raw_start = date_time
        .map(str::to_string)
        .or_else(|| match (local_date, local_time) {
            (Some(d), Some(t)) => Some(format!("{d}T{t}Z")),
            (Some(d), None) => Some(format!("{d}T00:00:00Z")),
            _ => None,
        })
        .unwrap_or_else(now_iso);
    let date = local_date
        .map(str::to_string)
        .or_else(|| date_time.and_then(|dt| dt.split('T').next().map(str::to_string)))
        .unwrap_or_else(|| "Date TBA".to_string());
    let time = local_time.unwrap_or("00:00:00").to_string();

    let venue_obj = raw.pointer("/_embedded/venues/0");
    let venue = venue_obj
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let city = venue_obj
        .and_then(|v| v.pointer("/city/name"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let state = venue_obj
        .and_then(|v| v.pointer("/state/stateCode"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let country = venue_obj
        .and_then(|v| v.pointer("/country/countryCode"))
        .and_then(Value::as_str)
        .unwrap_or("");

    // Home-market convention: the country segment is noise for US listings.
    let country_part = if country.eq_ignore_ascii_case("US") { "" } else { country };
    let mut location = join_location(&[venue.as_deref().unwrap_or(""), city, state, country_part]);
    if location.is_empty() {
        location = "Location TBA".to_string();
    }

    let coordinates = venue_obj
        .and_then(|v| v.pointer("/location"))
        .and_then(|loc| {
            let lng = loc.get("longitude")?.as_str()?.parse::<f64>().ok()?;
            let lat = loc.get("latitude")?.as_str()?.parse::<f64>().ok()?;
            sanitize_coordinates(lng, lat)
        });

    let segment = raw
        .pointer("/classifications/0/segment/name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_lowercase();
    let category = map_segment(&segment);

    let id = match raw.get("id").and_then(Value::as_str) {
        Some(raw_id) => format!("ticketmaster-{raw_id}"),
        None => super::derived_id(
            EventSource::Ticketmaster,
            &format!("{title}|{raw_start}|{location}"),
        ),
    };

    Some(Event {
        id,
        source: EventSource::Ticketmaster,
        title: title.to_string(),
        description,
        date,
        time,
        raw_start,
        location,
        venue,
        coordinates,
        category,
        party_subcategory: None,
        image: pick_image(raw, category),
        url: raw.get("url").and_then(Value::as_str).map(str::to_string),
        price: format_price(raw),
        rank: None,
        local_relevance: None,
        attendance_forecast: None,
    })
}

/// Total normalization; malformed records become fallback events.
pub fn normalize(raw: &Value) -> Event {
    try_normalize(raw).unwrap_or_else(|| fallback_event(EventSource::Ticketmaster))
}

#[async_trait]
impl EventProvider for TicketmasterProvider {
    fn source(&self) -> EventSource {
        EventSource::Ticketmaster
    }

    fn name(&self) -> &'static str {
        "Ticketmaster"
    }

    async fn fetch_raw(&self, params: &SearchParams) -> Result<Vec<Value>> {
        match &self.mode {
            Mode::Fixture(records) => Ok(records.clone()),
            Mode::Http {
                base_url,
                api_key,
                client,
            } => {
                let url = format!("{}/events.json", base_url.trim_end_matches('/'));
                let query = self.build_query(params, api_key);
                let body = get_json(client, "Ticketmaster", &url, &query).await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn segment_lookup_table() {
        assert_eq!(map_segment("music"), Category::Music);
        assert_eq!(map_segment("arts & theatre"), Category::Arts);
        assert_eq!(map_segment("miscellaneous"), Category::Other);
        assert_eq!(map_segment("comedy"), Category::Other);
    }

    #[test]
    fn prefers_wide_image_over_first() {
        let raw = json!({
            "images": [
                {"url": "https://img.example/first.jpg", "ratio": "4_3", "width": 300},
                {"url": "https://img.example/wide.jpg", "ratio": "16_9", "width": 1024}
            ]
        });
        assert_eq!(pick_image(&raw, Category::Music), "https://img.example/wide.jpg");

        let narrow_only = json!({
            "images": [{"url": "https://img.example/first.jpg", "ratio": "4_3", "width": 300}]
        });
        assert_eq!(
            pick_image(&narrow_only, Category::Music),
            "https://img.example/first.jpg"
        );

        assert!(pick_image(&json!({}), Category::Music).starts_with("https://placehold.co/"));
    }

    #[test]
    fn price_range_formatting() {
        let raw = json!({"priceRanges": [{"min": 25.0, "max": 99.5, "currency": "USD"}]});
        assert_eq!(format_price(&raw).as_deref(), Some("25 - 99.5 USD"));
        assert_eq!(format_price(&json!({})), None);
    }

    #[test]
    fn us_country_segment_is_omitted() {
        let raw = json!({
            "id": "a1",
            "name": "Show",
            "_embedded": {"venues": [{
                "name": "The Spot",
                "city": {"name": "Austin"},
                "state": {"stateCode": "TX"},
                "country": {"countryCode": "US"}
            }]}
        });
        let ev = normalize(&raw);
        assert_eq!(ev.location, "The Spot, Austin, TX");

        let raw_gb = json!({
            "id": "a2",
            "name": "Show",
            "_embedded": {"venues": [{
                "name": "The Dome",
                "city": {"name": "London"},
                "country": {"countryCode": "GB"}
            }]}
        });
        assert_eq!(normalize(&raw_gb).location, "The Dome, London, GB");
    }
}
