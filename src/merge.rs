//! Dedup/merge across per-source batches.
//!
//! The dedup key is the (already source-prefixed) event id, so two sources
//! listing the same physical event are deliberately kept as independent
//! records. `SourceStats` carries per-provider counts and the last error so
//! callers can see partial failures without the pipeline ever aborting.

use std::collections::{BTreeMap, HashSet};

use metrics::counter;
use serde::Serialize;

use crate::event::{Event, EventSource};

/// Per-provider outcome surfaced to the caller.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SourceStats {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One provider's contribution to a search: its normalized events, or the
/// error that kept it from contributing.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: EventSource,
    pub events: Vec<Event>,
    pub error: Option<String>,
}

impl SourceBatch {
    pub fn ok(source: EventSource, events: Vec<Event>) -> Self {
        Self {
            source,
            events,
            error: None,
        }
    }

    pub fn failed(source: EventSource, error: impl Into<String>) -> Self {
        Self {
            source,
            events: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Merge batches, dropping id duplicates, and record per-source stats.
pub fn merge(batches: Vec<SourceBatch>) -> (Vec<Event>, BTreeMap<String, SourceStats>) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut events = Vec::new();
    let mut stats: BTreeMap<String, SourceStats> = BTreeMap::new();
    let mut dupes = 0u64;

    for batch in batches {
        let entry = stats.entry(batch.source.prefix().to_string()).or_default();
        if let Some(err) = batch.error {
            entry.error = Some(err);
        }
        for ev in batch.events {
            if !seen.insert(ev.id.clone()) {
                dupes += 1;
                continue;
            }
            entry.count += 1;
            events.push(ev);
        }
    }

    counter!("aggregate_dedup_total").increment(dupes);
    (events, stats)
}
