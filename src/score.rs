//! # Party Scorer/Ranker
//!
//! Pure, testable ranking for party search results. Filters to
//! `category == party` first, then assigns each event an additive quality
//! score and returns a stable descending sort. The score is transient — it
//! lives in a side table during sorting and never appears on the serialized
//! event.

use crate::classify;
use crate::event::{is_placeholder_image, Event, PartySubcategory};

/// Sub-category base score.
fn base_score(sub: Option<PartySubcategory>) -> i32 {
    match sub {
        Some(PartySubcategory::Club) => 15,
        Some(PartySubcategory::DayParty) => 12,
        Some(PartySubcategory::Celebration) => 10,
        Some(PartySubcategory::Brunch) => 8,
        Some(PartySubcategory::Social) => 7,
        Some(PartySubcategory::Networking) => 6,
        _ => 5,
    }
}

fn hour_of(ev: &Event) -> Option<u32> {
    // Display time first (cheap), then the ISO timestamp.
    if let Some(head) = ev.time.split(':').next() {
        if let Ok(h) = head.trim().parse::<u32>() {
            if h < 24 {
                return Some(h);
            }
        }
    }
    chrono::DateTime::parse_from_rfc3339(&ev.raw_start)
        .ok()
        .map(|dt| chrono::Timelike::hour(&dt))
}

/// Compute the quality score for a single (party) event.
pub fn score_event(ev: &Event) -> i32 {
    let mut score = base_score(ev.party_subcategory);

    // Longer descriptions read as better-curated listings, capped at +5.
    score += (ev.description.len() as i32 / 100).min(5);

    // Cumulative tier-weighted keyword matches (3/2/1).
    score += classify::keyword_score(&ev.title, &ev.description);

    if !is_placeholder_image(&ev.image) {
        score += 4;
    }
    if ev.venue.is_some() {
        score += 3;
    }
    if ev.price.is_some() {
        score += 2;
    }

    score += match hour_of(ev) {
        Some(h) if (20..24).contains(&h) || h < 4 => 4,
        Some(h) if (16..20).contains(&h) => 2,
        _ => 0,
    };

    score
}

/// Filter to party events and sort descending by score. Ties keep input
/// order (stable sort).
pub fn score_and_sort(events: Vec<Event>) -> Vec<Event> {
    let mut scored: Vec<(i32, Event)> = events
        .into_iter()
        .filter(Event::is_party)
        .map(|ev| (score_event(&ev), ev))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, ev)| ev).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{placeholder_image, Category, EventSource};

    fn party(id: &str, sub: PartySubcategory) -> Event {
        Event {
            id: format!("rapidapi-{id}"),
            source: EventSource::Rapidapi,
            title: "Party".into(),
            description: String::new(),
            date: "2025-06-01".into(),
            time: "21:00:00".into(),
            raw_start: "2025-06-01T21:00:00Z".into(),
            location: "Somewhere".into(),
            venue: None,
            coordinates: None,
            category: Category::Party,
            party_subcategory: Some(sub),
            image: placeholder_image(Category::Party),
            url: None,
            price: None,
            rank: None,
            local_relevance: None,
            attendance_forecast: None,
        }
    }

    #[test]
    fn non_party_events_are_filtered_out() {
        let mut music = party("m", PartySubcategory::Club);
        music.category = Category::Music;
        music.party_subcategory = None;
        let out = score_and_sort(vec![music, party("p", PartySubcategory::General)]);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_party());
    }

    #[test]
    fn richer_club_event_outscores_bare_general_event() {
        let mut club = party("club", PartySubcategory::Club);
        club.image = "https://cdn.example.com/club.jpg".into();
        club.venue = Some("Echo Room".into());
        club.price = Some("20 - 40 USD".into());
        club.time = "21:00:00".into();

        let mut general = party("gen", PartySubcategory::General);
        general.time = "14:00:00".into();

        assert!(score_event(&club) > score_event(&general));
        let out = score_and_sort(vec![general.clone(), club.clone()]);
        assert_eq!(out[0].id, club.id);
    }

    #[test]
    fn ties_keep_input_order() {
        let a = party("a", PartySubcategory::General);
        let b = party("b", PartySubcategory::General);
        let out = score_and_sort(vec![a.clone(), b.clone()]);
        assert_eq!(out[0].id, a.id);
        assert_eq!(out[1].id, b.id);
    }

    #[test]
    fn evening_hour_beats_afternoon_beats_morning() {
        let mut evening = party("e", PartySubcategory::General);
        evening.time = "22:00:00".into();
        let mut late = party("l", PartySubcategory::General);
        late.time = "02:00:00".into();
        let mut afternoon = party("a", PartySubcategory::General);
        afternoon.time = "17:00:00".into();
        let mut morning = party("m", PartySubcategory::General);
        morning.time = "09:00:00".into();

        let se = score_event(&evening);
        assert_eq!(se, score_event(&late));
        assert_eq!(se - 2, score_event(&afternoon));
        assert_eq!(se - 4, score_event(&morning));
    }
}
