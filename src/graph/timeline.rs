//! Active concept resolution for a playback time
//!
//! The active concept is the last concept, in stable ascending timestamp
//! order, whose timestamp is not after the playback time. Concepts sharing a
//! timestamp are ordered by their position in the input, so the one listed
//! last wins.

use super::{Concept, ConceptId};
use std::cmp::Ordering;

/// Resolve the active concept for `time` in a single pass.
///
/// `concepts` may be empty, unsorted and contain duplicate timestamps.
/// Concepts with a non-finite timestamp never become active.
pub fn resolve_active(concepts: &[Concept], time: f64) -> Option<&ConceptId> {
    let mut best: Option<&Concept> = None;

    for concept in concepts {
        let eligible = concept.timestamp.is_finite()
            && matches!(
                concept.timestamp.partial_cmp(&time),
                Some(Ordering::Less | Ordering::Equal)
            );
        if !eligible {
            continue;
        }
        match best {
            // equal timestamps fall through so the later concept takes over
            Some(current) if concept.timestamp < current.timestamp => {}
            _ => best = Some(concept),
        }
    }

    best.map(|c| &c.id)
}

/// Pre-sorted timeline for repeated lookups against the same lecture.
///
/// Built once per lecture; each lookup is a binary search with no allocation,
/// so it can run on every player time update.
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    entries: Vec<Concept>,
}

impl TimelineIndex {
    pub fn new(concepts: &[Concept]) -> Self {
        let mut entries: Vec<Concept> = concepts
            .iter()
            .filter(|c| c.timestamp.is_finite())
            .cloned()
            .collect();
        // `sort_by` is stable, which keeps input order among equal timestamps.
        // `partial_cmp` treats -0.0 and 0.0 as equal, same as `resolve_active`.
        entries.sort_by(|a, b| {
            a.timestamp
                .partial_cmp(&b.timestamp)
                .unwrap_or(Ordering::Equal)
        });
        Self { entries }
    }

    /// Concept active at `time`, if any
    pub fn active(&self, time: f64) -> Option<&Concept> {
        if time.is_nan() {
            return None;
        }
        let upper = self.entries.partition_point(|c| c.timestamp <= time);
        upper.checked_sub(1).map(|i| &self.entries[i])
    }

    pub fn active_id(&self, time: f64) -> Option<&ConceptId> {
        self.active(time).map(|c| &c.id)
    }

    /// Timestamp to seek to when a concept is selected
    pub fn timestamp_of(&self, id: &ConceptId) -> Option<f64> {
        self.entries
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.timestamp)
    }

    /// Concepts in ascending timestamp order
    pub fn concepts(&self) -> &[Concept] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
