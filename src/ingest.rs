//! Merging month batches into one event list.
//!
//! Month files are concatenated in month order, deduplicated by id (first
//! occurrence wins) and sorted newest first. The report records what was
//! dropped so bad data can be fixed at the source.

use std::collections::HashSet;
use std::hash::Hash;

use serde::Serialize;
use tracing::{info, warn};

use crate::models::{EventId, EventRecord};

/// One month's worth of records, labelled by where they came from.
#[derive(Debug, Clone)]
pub struct Batch {
    pub source: String,
    pub events: Vec<EventRecord>,
}

impl Batch {
    pub fn new(source: impl Into<String>, events: Vec<EventRecord>) -> Self {
        Self {
            source: source.into(),
            events,
        }
    }
}

/// Summary of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Month files (or URLs) that were read successfully
    pub files_read: usize,
    pub events_kept: usize,

    /// Ids seen again after their first occurrence
    pub duplicates: Vec<EventId>,

    /// Kept records whose `when` could not be parsed
    pub undated: Vec<EventId>,

    /// Sources that failed and contributed nothing
    pub skipped: Vec<String>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.undated.is_empty() && self.skipped.is_empty()
    }
}

/// Keep the first item for each key, returning the kept items and the keys
/// of everything dropped.
pub fn dedup_by_id<T, K, F>(items: Vec<T>, key: F) -> (Vec<T>, Vec<K>)
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    let mut dropped = Vec::new();

    for item in items {
        let k = key(&item);
        if seen.insert(k.clone()) {
            kept.push(item);
        } else {
            dropped.push(k);
        }
    }

    (kept, dropped)
}

/// Sort newest first; records without a usable date go last.
pub fn sort_newest_first(events: &mut [EventRecord]) {
    events.sort_by(|a, b| b.date().cmp(&a.date()));
}

/// Concatenate batches in the given order, dedup and sort.
pub fn merge_batches(
    batches: Vec<Batch>,
    skipped: Vec<String>,
) -> (Vec<EventRecord>, IngestReport) {
    let files_read = batches.len();
    let all: Vec<EventRecord> = batches.into_iter().flat_map(|b| b.events).collect();

    let (mut events, duplicates) = dedup_by_id(all, |e| e.id.clone());
    for id in &duplicates {
        warn!("Dropping duplicate event {}", id);
    }

    sort_newest_first(&mut events);

    let undated: Vec<EventId> = events
        .iter()
        .filter(|e| e.date().is_none())
        .map(|e| e.id.clone())
        .collect();

    let report = IngestReport {
        files_read,
        events_kept: events.len(),
        duplicates,
        undated,
        skipped,
    };

    info!(
        "Loaded {} events from {} files ({} duplicates, {} undated)",
        report.events_kept,
        report.files_read,
        report.duplicates.len(),
        report.undated.len()
    );

    (events, report)
}
