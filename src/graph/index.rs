//! Searchable concept list view

use super::{Concept, ConceptId, TimelineIndex};
use serde::Serialize;

/// One row of the concept list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptListEntry {
    pub id: ConceptId,
    pub label: String,
    pub definition: Option<String>,
    pub timestamp: f64,
    /// Position in the filtered list, zero-padded below ten ("01", "02", ... "10")
    pub ordinal: String,
    pub display_time: String,
    pub active: bool,
}

/// Concept list ordered by timestamp, filterable by text
#[derive(Debug, Clone, Default)]
pub struct ConceptIndex {
    timeline: TimelineIndex,
}

impl ConceptIndex {
    pub fn new(concepts: &[Concept]) -> Self {
        Self {
            timeline: TimelineIndex::new(concepts),
        }
    }

    pub fn timeline(&self) -> &TimelineIndex {
        &self.timeline
    }

    /// Rows matching `search` (case-insensitive, label or definition).
    ///
    /// The active flag is resolved against the whole lecture, so filtering
    /// never moves the highlight to a different concept.
    pub fn entries(&self, search: &str, time: f64) -> Vec<ConceptListEntry> {
        let needle = search.trim().to_lowercase();
        let active = self.timeline.active_id(time);

        self.timeline
            .concepts()
            .iter()
            .filter(|c| needle.is_empty() || matches_search(c, &needle))
            .enumerate()
            .map(|(idx, c)| ConceptListEntry {
                id: c.id.clone(),
                label: c.label.clone(),
                definition: c.definition.clone(),
                timestamp: c.timestamp,
                ordinal: format!("{:02}", idx + 1),
                display_time: format_time(c.timestamp),
                active: Some(&c.id) == active,
            })
            .collect()
    }
}

fn matches_search(concept: &Concept, needle: &str) -> bool {
    concept.label.to_lowercase().contains(needle)
        || concept
            .definition
            .as_deref()
            .map_or(false, |d| d.to_lowercase().contains(needle))
}

/// Format seconds as `MM:SS`, or `H:MM:SS` past the hour
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
