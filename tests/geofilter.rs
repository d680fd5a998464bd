// tests/geofilter.rs
//
// Radius filtering against the Haversine distance, plus the explicit
// jitter fallback for coordinate-less events.

use event_scout::event::{placeholder_image, Category, Event, EventSource};
use event_scout::geo::{filter_by_radius, haversine_miles, CoordinateFallback, GeoPoint, JITTER_DEGREES};

fn ev(id: &str, coordinates: Option<[f64; 2]>) -> Event {
    Event {
        id: id.to_string(),
        source: EventSource::Ticketmaster,
        title: "t".into(),
        description: String::new(),
        date: "2025-06-01".into(),
        time: "20:00:00".into(),
        raw_start: "2025-06-01T20:00:00Z".into(),
        location: "loc".into(),
        venue: None,
        coordinates,
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

const CENTER: GeoPoint = GeoPoint { lat: 40.8, lng: -74.0 };

#[test]
fn event_seven_miles_out_is_excluded_at_5_and_included_at_10() {
    let event = ev("a", Some([-74.0, 40.7]));
    let d = haversine_miles(CENTER, GeoPoint { lat: 40.7, lng: -74.0 });
    assert!((d - 6.9).abs() < 0.1, "sanity: distance is ~6.9mi, got {d}");

    let out = filter_by_radius(vec![event.clone()], CENTER, 5.0, CoordinateFallback::Exclude);
    assert!(out.is_empty());

    let out = filter_by_radius(vec![event], CENTER, 10.0, CoordinateFallback::Exclude);
    assert_eq!(out.len(), 1);
}

#[test]
fn retained_events_are_within_radius_and_excluded_ones_are_not() {
    let radius = 8.0;
    let events = vec![
        ev("in-1", Some([-74.0, 40.79])),
        ev("out-1", Some([-74.0, 40.5])),
        ev("in-2", Some([-73.95, 40.82])),
        ev("out-2", Some([-75.0, 40.8])),
    ];
    let kept = filter_by_radius(events, CENTER, radius, CoordinateFallback::Exclude);
    let kept_ids: Vec<&str> = kept.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(kept_ids, vec!["in-1", "in-2"]);
    for e in &kept {
        let [lng, lat] = e.coordinates.unwrap();
        assert!(haversine_miles(CENTER, GeoPoint { lat, lng }) <= radius + 1e-9);
    }
}

#[test]
fn coordinate_less_events_are_dropped_unless_jitter_is_requested() {
    let events = vec![ev("no-coords", None)];
    let dropped = filter_by_radius(events.clone(), CENTER, 5.0, CoordinateFallback::Exclude);
    assert!(dropped.is_empty());

    let jittered = filter_by_radius(events, CENTER, 5.0, CoordinateFallback::Jitter);
    assert_eq!(jittered.len(), 1);
    let [lng, lat] = jittered[0].coordinates.expect("jitter assigns coordinates");
    assert!((lng - CENTER.lng).abs() <= JITTER_DEGREES + 1e-12);
    assert!((lat - CENTER.lat).abs() <= JITTER_DEGREES + 1e-12);
}

#[test]
fn non_finite_coordinates_are_treated_as_absent() {
    let weird = ev("nan", Some([f64::NAN, 40.8]));
    let out = filter_by_radius(vec![weird], CENTER, 100.0, CoordinateFallback::Exclude);
    assert!(out.is_empty());
}
