// tests/classifier.rs
//
// Classifier behavior at the public API: party detection and the
// first-match sub-category cascade.

use event_scout::classify::{detect_party_subcategory, is_party_event, matched_keywords};
use event_scout::PartySubcategory;

#[test]
fn saturday_night_rave_is_a_party_with_high_value_matches() {
    let title = "Saturday Night Rave";
    let description = "open bar, dance floor, dj set all night";
    assert!(is_party_event(title, description, None));

    let matched = matched_keywords(title, description);
    for expected in ["rave", "open bar", "dance floor", "dj set"] {
        let hit = matched.iter().find(|(k, _)| k == expected);
        assert_eq!(
            hit.map(|(_, w)| *w),
            Some(3),
            "{expected} should match at weight 3"
        );
    }
}

#[test]
fn day_party_cooccurrence_beats_later_cascade_stages() {
    // "Pool" and "Bash" could plausibly read as club/social, but the
    // day+party co-occurrence check runs first and wins.
    assert_eq!(
        detect_party_subcategory("Sunday Day Party Pool Bash", "", "14:00:00"),
        PartySubcategory::DayParty
    );
}

#[test]
fn plain_text_without_keywords_is_not_a_party() {
    assert!(!is_party_event("Intro to watercolors", "supplies provided", None));
    assert!(matched_keywords("Intro to watercolors", "supplies provided").is_empty());
}

#[test]
fn venue_keyword_list_catches_quiet_titles() {
    assert!(is_party_event("Thursday residency", "", Some("The Basement Nightclub")));
    assert!(is_party_event("Summer series", "", Some("Harbor Rooftop Terrace")));
}

#[test]
fn subcategory_is_deterministic_for_ambiguous_text() {
    // Could be festival or club; the cascade resolves it the same way every
    // time.
    let a = detect_party_subcategory("Techno Festival Warehouse Night", "djs", "23:00:00");
    let b = detect_party_subcategory("Techno Festival Warehouse Night", "djs", "23:00:00");
    assert_eq!(a, b);
    assert_eq!(a, PartySubcategory::Festival);
}
