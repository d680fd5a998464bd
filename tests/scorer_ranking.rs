// tests/scorer_ranking.rs
//
// Party scorer ordering contract: descending scores, party-only output, and
// the rich-club-beats-bare-general scenario.

use event_scout::event::{placeholder_image, Category, Event, EventSource, PartySubcategory};
use event_scout::score::{score_and_sort, score_event};

fn party(id: &str, sub: PartySubcategory) -> Event {
    Event {
        id: id.to_string(),
        source: EventSource::Rapidapi,
        title: "Untitled".into(),
        description: String::new(),
        date: "2025-06-01".into(),
        time: "21:00:00".into(),
        raw_start: "2025-06-01T21:00:00Z".into(),
        location: "loc".into(),
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
fn rich_club_event_sorts_above_bare_general_event() {
    let mut club = party("club", PartySubcategory::Club);
    club.image = "https://cdn.example.com/flyer.jpg".into();
    club.venue = Some("Vault 21".into());
    club.price = Some("15 - 30 USD".into());
    club.time = "21:00:00".into();

    let mut general = party("general", PartySubcategory::General);
    general.time = "14:00:00".into();

    assert!(score_event(&club) > score_event(&general));

    // Input order deliberately reversed; score decides.
    let out = score_and_sort(vec![general, club]);
    assert_eq!(out[0].id, "club");
    assert_eq!(out[1].id, "general");
}

#[test]
fn output_is_sorted_descending_and_party_exhaustive() {
    let mut music = party("music", PartySubcategory::General);
    music.category = Category::Music;
    music.party_subcategory = None;

    let mut brunch = party("brunch", PartySubcategory::Brunch);
    brunch.description = "Bottomless mimosas and a live dj on the terrace. \
        Reserve a table for the best weekend brunch in town."
        .into();
    let day = party("day", PartySubcategory::DayParty);
    let social = party("social", PartySubcategory::Social);

    let out = score_and_sort(vec![music, social, brunch, day]);
    assert_eq!(out.len(), 3, "non-party events are filtered out");
    let scores: Vec<i32> = out.iter().map(score_event).collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "not sorted descending: {scores:?}");
    }
}

#[test]
fn description_length_bonus_caps_at_five() {
    let short = party("short", PartySubcategory::General);
    let mut long = party("long", PartySubcategory::General);
    long.description = "x".repeat(2000);
    // 2000 chars would naively add 20; the cap keeps it at +5.
    assert_eq!(score_event(&long) - score_event(&short), 5);
}

#[test]
fn transient_score_never_appears_in_serialized_output() {
    let out = score_and_sort(vec![party("p", PartySubcategory::Club)]);
    let v = serde_json::to_value(&out[0]).unwrap();
    let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
    assert!(
        !keys.iter().any(|k| k.to_lowercase().contains("score")),
        "serialized event leaked a score field: {keys:?}"
    );
}
