//! Great-circle radius filtering. Miles end-to-end (Earth radius 3958.8 mi);
//! no km conversion anywhere in the pipeline.

use rand::Rng;

use crate::event::Event;

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Maximum synthetic offset (degrees) applied to coordinate-less events in
/// jitter mode.
pub const JITTER_DEGREES: f64 = 0.05;

/// Search center, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// What to do with events that carry no coordinates.
///
/// `Jitter` is the party-search "never lose an event" trade-off: the event
/// gets a synthetic coordinate near the center so it still renders on the
/// map. It must be opted into, never silently applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateFallback {
    Exclude,
    Jitter,
}

/// Haversine distance in miles between two points given as (lat, lng).
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Keep events within `radius_miles` of `center`.
///
/// Events with no coordinates are dropped in `Exclude` mode; in `Jitter`
/// mode they get a uniformly-random offset within ±0.05° of the center and
/// are always retained. A "present" but non-finite coordinate pair is
/// treated as absent.
pub fn filter_by_radius(
    events: Vec<Event>,
    center: GeoPoint,
    radius_miles: f64,
    fallback: CoordinateFallback,
) -> Vec<Event> {
    let mut rng = rand::rng();
    let mut out = Vec::with_capacity(events.len());

    for mut ev in events {
        let coords = ev
            .coordinates
            .filter(|[lng, lat]| lng.is_finite() && lat.is_finite());

        match coords {
            Some([lng, lat]) => {
                let d = haversine_miles(center, GeoPoint { lat, lng });
                if d <= radius_miles {
                    out.push(ev);
                }
            }
            None => match fallback {
                CoordinateFallback::Exclude => {}
                CoordinateFallback::Jitter => {
                    let d_lng: f64 = rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES);
                    let d_lat: f64 = rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES);
                    ev.coordinates = Some([center.lng + d_lng, center.lat + d_lat]);
                    out.push(ev);
                }
            },
        }
    }
    out
}
