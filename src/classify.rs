//! # Party Classifier
//!
//! Heuristic keyword matching over a case-folded title+description blob.
//! The keyword universe lives in `party_lexicon.json` (embedded at compile
//! time), partitioned into three weighted tiers; a separate venue-name list
//! catches events whose text says nothing but whose venue screams nightlife.
//!
//! Sub-category resolution is a first-match cascade. Later checks are never
//! reached once an earlier one matches, even when the later one would be a
//! better semantic fit. That precedence is part of the contract.

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::event::PartySubcategory;

pub const HIGH_WEIGHT: i32 = 3;
pub const MEDIUM_WEIGHT: i32 = 2;
pub const LOW_WEIGHT: i32 = 1;

#[derive(Debug, Deserialize)]
struct Lexicon {
    keywords: Tiers,
    venues: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Tiers {
    high: Vec<String>,
    medium: Vec<String>,
    low: Vec<String>,
}

static LEXICON: Lazy<Lexicon> = Lazy::new(|| {
    let raw = include_str!("../party_lexicon.json");
    serde_json::from_str::<Lexicon>(raw).expect("valid party lexicon")
});

fn blob(title: &str, description: &str) -> String {
    format!("{} {}", title, description).to_lowercase()
}

/// True if the title/description blob contains any lexicon keyword, or the
/// venue name matches the venue-keyword list.
pub fn is_party_event(title: &str, description: &str, venue: Option<&str>) -> bool {
    let text = blob(title, description);
    let lex = &*LEXICON;

    let any_keyword = lex
        .keywords
        .high
        .iter()
        .chain(lex.keywords.medium.iter())
        .chain(lex.keywords.low.iter())
        .any(|k| text.contains(k.as_str()));
    if any_keyword {
        return true;
    }

    if let Some(v) = venue {
        let v = v.to_lowercase();
        if lex.venues.iter().any(|k| v.contains(k.as_str())) {
            return true;
        }
    }
    false
}

/// Cumulative tier-weighted keyword score over the blob (each distinct
/// keyword counts once at its tier weight). Used by the scorer.
pub fn keyword_score(title: &str, description: &str) -> i32 {
    let text = blob(title, description);
    let lex = &*LEXICON;
    let mut score = 0;
    for k in &lex.keywords.high {
        if text.contains(k.as_str()) {
            score += HIGH_WEIGHT;
        }
    }
    for k in &lex.keywords.medium {
        if text.contains(k.as_str()) {
            score += MEDIUM_WEIGHT;
        }
    }
    for k in &lex.keywords.low {
        if text.contains(k.as_str()) {
            score += LOW_WEIGHT;
        }
    }
    score
}

/// Distinct matched keywords with their tier weight, for the debug endpoint.
pub fn matched_keywords(title: &str, description: &str) -> Vec<(String, i32)> {
    let text = blob(title, description);
    let lex = &*LEXICON;
    let mut out = Vec::new();
    for (tier, weight) in [
        (&lex.keywords.high, HIGH_WEIGHT),
        (&lex.keywords.medium, MEDIUM_WEIGHT),
        (&lex.keywords.low, LOW_WEIGHT),
    ] {
        for k in tier {
            if text.contains(k.as_str()) {
                out.push((k.clone(), weight));
            }
        }
    }
    out
}

/// Parse an `HH:MM[:SS]` display time into an hour, best effort.
fn parse_hour(time: &str) -> Option<u32> {
    let head = time.split(':').next()?;
    head.trim().parse::<u32>().ok().filter(|h| *h < 24)
}

/// First-match cascade: festival → brunch → day-party → club → social →
/// celebration → general. `time` only feeds the day-party check (a "party"
/// starting between 10:00 and 16:59 counts as a day party); it never
/// overrides an earlier match.
pub fn detect_party_subcategory(title: &str, description: &str, time: &str) -> PartySubcategory {
    let text = blob(title, description);

    if text.contains("festival") || text.contains("fest") {
        return PartySubcategory::Festival;
    }

    if text.contains("brunch") {
        return PartySubcategory::Brunch;
    }

    let day_party_cooccurrence = text.contains("day") && text.contains("party");
    let day_party_standalone = text.contains("pool party")
        || text.contains("rooftop")
        || text.contains("afternoon");
    let day_party_hour = text.contains("party")
        && matches!(parse_hour(time), Some(h) if (10..17).contains(&h));
    if day_party_cooccurrence || day_party_standalone || day_party_hour {
        return PartySubcategory::DayParty;
    }

    if text.contains("dj")
        || text.contains("dance")
        || text.contains("nightlife")
        || text.contains("club")
    {
        return PartySubcategory::Club;
    }

    if text.contains("networking") {
        return PartySubcategory::Networking;
    }
    if text.contains("social") || text.contains("mixer") {
        return PartySubcategory::Social;
    }

    if text.contains("celebration") || text.contains("gala") {
        return PartySubcategory::Celebration;
    }

    PartySubcategory::General
}
