//! Lecture view session: playback clock wired to the concept timeline

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{LectureGraphError, Result};
use crate::graph::{ConceptId, ConceptIndex, ConceptListEntry, GraphData, Relationship};
use crate::playback::{PlaybackController, SeekRequest};
use crate::store::LectureRecord;

/// Highlight moved from one concept to another (either side may be none)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveChange {
    pub previous: Option<ConceptId>,
    pub current: Option<ConceptId>,
}

/// State of one mounted lecture view.
///
/// Owns its playback controller exclusively; dropping the session discards
/// all playback state.
#[derive(Debug)]
pub struct LectureSession {
    index: Arc<ConceptIndex>,
    relationships: Vec<Relationship>,
    controller: PlaybackController,
    active: Option<ConceptId>,
}

impl LectureSession {
    pub fn new(record: &LectureRecord) -> Self {
        let index = Arc::new(ConceptIndex::new(&record.concepts));
        let active = index.timeline().active_id(0.0).cloned();
        Self {
            index,
            relationships: record.relationships.clone(),
            controller: PlaybackController::new(),
            active,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    pub fn active(&self) -> Option<&ConceptId> {
        self.active.as_ref()
    }

    /// Feed a media time update; reports a highlight change if one happened
    pub fn on_time_update(&mut self, time: f64) -> Option<ActiveChange> {
        if !self.controller.time_update(time) {
            return None;
        }
        self.refresh_active()
    }

    /// Media backend finished a seek
    pub fn on_seek_confirmed(&mut self, time: f64) -> Result<Option<ActiveChange>> {
        self.controller.confirm_seek(time)?;
        Ok(self.refresh_active())
    }

    /// Concept clicked in the list or graph view: always seeks, even when
    /// the same concept is clicked twice in a row
    pub fn click_concept(&mut self, id: &ConceptId) -> Result<SeekRequest> {
        let timestamp = self
            .index
            .timeline()
            .timestamp_of(id)
            .ok_or_else(|| LectureGraphError::Validation(format!("unknown concept: {}", id)))?;
        debug!("Concept {} clicked, seeking to {:.2}s", id, timestamp);
        Ok(self.controller.request_seek(timestamp))
    }

    /// Progress-bar click; returns the new time
    pub fn scrub(&mut self, fraction: f64) -> Result<(f64, Option<ActiveChange>)> {
        let time = self.controller.scrub(fraction)?;
        Ok((time, self.refresh_active()))
    }

    pub fn progress(&self) -> f64 {
        self.controller.progress()
    }

    pub fn concept_list(&self, search: &str) -> Vec<ConceptListEntry> {
        self.index.entries(search, self.controller.current_time())
    }

    pub fn graph(&self) -> GraphData {
        GraphData::build(
            self.index.timeline().concepts(),
            &self.relationships,
            self.active.as_ref(),
        )
    }

    /// Push active-concept changes to views as the clock moves.
    ///
    /// The spawned task follows the controller's time channel and publishes
    /// only when the resolved concept actually changes. It ends when the
    /// controller is dropped.
    pub fn watch_active(&self) -> (watch::Receiver<Option<ConceptId>>, JoinHandle<()>) {
        let mut time_rx = self.controller.subscribe();
        let index = Arc::clone(&self.index);
        let (active_tx, active_rx) = watch::channel(self.active.clone());

        let handle = tokio::spawn(async move {
            while time_rx.changed().await.is_ok() {
                let time = *time_rx.borrow_and_update();
                let resolved = index.timeline().active_id(time).cloned();
                active_tx.send_if_modified(|current| {
                    if *current != resolved {
                        *current = resolved;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        (active_rx, handle)
    }

    fn refresh_active(&mut self) -> Option<ActiveChange> {
        let resolved = self
            .index
            .timeline()
            .active_id(self.controller.current_time())
            .cloned();
        if resolved == self.active {
            return None;
        }
        let previous = std::mem::replace(&mut self.active, resolved.clone());
        Some(ActiveChange {
            previous,
            current: resolved,
        })
    }
}
