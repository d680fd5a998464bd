//! # Canonical Event Model
//!
//! The single record shape exchanged between every pipeline stage: provider
//! adapters produce it, the geofilter/merger/scorer consume it, and the API
//! serializes it (camelCase, to match the map UI convention of `[lng, lat]`
//! coordinate order).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream origin of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Ticketmaster,
    Predicthq,
    Rapidapi,
    Unknown,
}

impl EventSource {
    /// Id prefix; keeps ids collision-free across sources.
    pub fn prefix(&self) -> &'static str {
        match self {
            EventSource::Ticketmaster => "ticketmaster",
            EventSource::Predicthq => "predicthq",
            EventSource::Rapidapi => "rapidapi",
            EventSource::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Fixed category taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Music,
    Sports,
    Arts,
    Family,
    Food,
    Party,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Music => "music",
            Category::Sports => "sports",
            Category::Arts => "arts",
            Category::Family => "family",
            Category::Food => "food",
            Category::Party => "party",
            Category::Other => "other",
        }
    }
}

/// Finer-grained classification, present iff `category == Party`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartySubcategory {
    Festival,
    Brunch,
    DayParty,
    Club,
    Social,
    Networking,
    Celebration,
    General,
}

/// Canonical, source-agnostic event record.
///
/// Invariants (enforced by the adapters, asserted by tests):
/// - `title`, `date`, `time`, `location`, `image` are non-empty;
/// - `party_subcategory.is_some() == (category == Party)`;
/// - `coordinates`, when present, are finite and within `[-180..180, -90..90]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub source: EventSource,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    /// ISO-8601, machine-sortable. Defaults to "now" when the upstream start
    /// is unknown; fallback records stay identifiable via their `-error-` id.
    pub raw_start: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// `[longitude, latitude]`, mapping-library order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<[f64; 2]>,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_subcategory: Option<PartySubcategory>,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_relevance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_forecast: Option<u64>,
}

impl Event {
    /// Mark an event as a party event, keeping the category/sub-category
    /// coupling invariant in one place.
    pub fn set_party(&mut self, sub: PartySubcategory) {
        self.category = Category::Party;
        self.party_subcategory = Some(sub);
    }

    pub fn is_party(&self) -> bool {
        self.category == Category::Party
    }
}

/// Deterministic per-category placeholder, used whenever upstream supplies no
/// usable image so `image` is always a valid URL.
pub fn placeholder_image(category: Category) -> String {
    format!(
        "https://placehold.co/640x360?text={}",
        category.as_str()
    )
}

/// True when `url` is one of our own placeholders (scorer treats those as
/// "no image").
pub fn is_placeholder_image(url: &str) -> bool {
    url.starts_with("https://placehold.co/")
}

/// Validate a `[lng, lat]` pair; anything non-finite or out of range is
/// treated as absent so the geofilter never sees garbage as "present".
pub fn sanitize_coordinates(lng: f64, lat: f64) -> Option<[f64; 2]> {
    if lng.is_finite() && lat.is_finite() && (-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat) {
        Some([lng, lat])
    } else {
        None
    }
}

fn default_radius() -> f64 {
    10.0
}
fn default_page() -> usize {
    1
}
fn default_limit() -> usize {
    100
}

/// Search request, as supplied by the map/chat layers (query string or
/// in-process call).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            location: None,
            latitude: None,
            longitude: None,
            radius: default_radius(),
            categories: Vec::new(),
            keyword: None,
            start_date: None,
            end_date: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl SearchParams {
    /// Reject malformed parameters before any provider is called. This is
    /// the only error class that propagates to the caller as a hard failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            anyhow::bail!("radius must be a positive number of miles, got {}", self.radius);
        }
        match (self.latitude, self.longitude) {
            (None, None) => {}
            (Some(lat), Some(lng)) => {
                if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                    anyhow::bail!("latitude out of range: {lat}");
                }
                if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
                    anyhow::bail!("longitude out of range: {lng}");
                }
            }
            _ => anyhow::bail!("latitude and longitude must be provided together"),
        }
        if self.page == 0 {
            anyhow::bail!("page is 1-based, got 0");
        }
        if self.limit == 0 {
            anyhow::bail!("limit must be at least 1");
        }
        Ok(())
    }

    pub fn wants_party(&self) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case("party"))
    }

    /// Search keyword with party-specific query augmentation applied when a
    /// party search is requested.
    pub fn expanded_keyword(&self) -> Option<String> {
        if !self.wants_party() {
            return self.keyword.clone();
        }
        let expansion = "party OR club OR nightlife OR dance";
        Some(match self.keyword.as_deref() {
            Some(k) if !k.trim().is_empty() => format!("{k} {expansion}"),
            _ => expansion.to_string(),
        })
    }
}
