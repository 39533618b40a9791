//! API request handlers

use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

use super::models::{LectureSummary, ResultsPayload, ViewQuery};
use super::server::AppState;
use crate::client::GENERIC_PERSISTENCE_ERROR;
use crate::error::{LectureGraphError, Result};
use crate::graph::{Concept, ConceptIndex, ConceptListEntry, GraphData};
use crate::store::{LectureRecord, ProcessingResults};
use crate::upload::{
    issue_upload_target, RegisterLectureRequest, RegisterLectureResponse, UploadTarget,
    UploadTargetRequest,
};

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(serde_json::json!({
        "status": "healthy",
        "service": "lecture-graph",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Sign an upload target for a new object
pub async fn upload_target(state: &AppState, request: &UploadTargetRequest) -> Result<UploadTarget> {
    let expiry = Duration::from_secs(state.config.storage.presign_expiry_secs);
    issue_upload_target(state.storage.as_ref(), request, expiry).await
}

/// Persist a lecture record, then trigger processing without waiting for it.
///
/// Failures become `{success: false, error}`; a failed trigger never does.
pub async fn register_lecture(state: &AppState, request: &RegisterLectureRequest) -> RegisterLectureResponse {
    let title = request.title.trim();
    let storage_key = request.storage_key.trim();
    if title.is_empty() || storage_key.is_empty() {
        warn!("Registration rejected: missing title or storageKey");
        return RegisterLectureResponse::failed("title and storageKey are required".to_string());
    }

    let record = LectureRecord::new(
        title.to_string(),
        storage_key.to_string(),
        state.storage.public_url(storage_key),
    );

    match state.store.create_lecture(record).await {
        Ok(record) => {
            // handle dropped on purpose: the outcome is only logged
            let _ = state
                .notifier
                .notify_detached(record.id.clone(), record.storage_key.clone());
            RegisterLectureResponse::registered(record.id)
        }
        Err(e) => {
            error!("DATABASE SAVE ERROR: {}", e);
            let message = match e {
                LectureGraphError::Persistence(msg) if !msg.is_empty() => msg,
                _ => GENERIC_PERSISTENCE_ERROR.to_string(),
            };
            RegisterLectureResponse::failed(message)
        }
    }
}

pub async fn get_lecture(state: &AppState, id: &str) -> Result<LectureRecord> {
    state.store.get_lecture(id).await
}

pub async fn list_lectures(state: &AppState) -> Result<Vec<LectureSummary>> {
    let records = state.store.list_lectures().await?;
    Ok(records.iter().map(LectureSummary::from).collect())
}

/// Graph view at playback time `t` (defaults to the start)
pub async fn lecture_graph(state: &AppState, id: &str, query: &ViewQuery) -> Result<GraphData> {
    let record = state.store.get_lecture(id).await?;
    let index = ConceptIndex::new(&record.concepts);
    let active = index.timeline().active_id(query.t.unwrap_or(0.0));
    Ok(GraphData::build(&record.concepts, &record.relationships, active))
}

/// Concept list view at playback time `t`, filtered by `q`
pub async fn concept_list(state: &AppState, id: &str, query: &ViewQuery) -> Result<Vec<ConceptListEntry>> {
    let record = state.store.get_lecture(id).await?;
    let index = ConceptIndex::new(&record.concepts);
    Ok(index.entries(query.q.as_deref().unwrap_or(""), query.t.unwrap_or(0.0)))
}

/// Store processing backend output for a lecture
pub async fn save_results(state: &AppState, id: &str, payload: ResultsPayload) -> Result<LectureRecord> {
    if let Some(bad) = payload
        .concepts
        .iter()
        .find(|c| !c.timestamp.is_finite() || c.timestamp < 0.0)
    {
        return Err(LectureGraphError::Validation(format!(
            "concept '{}' has invalid timestamp {}",
            bad.label, bad.timestamp
        )));
    }

    let concepts: Vec<Concept> = payload
        .concepts
        .into_iter()
        .map(|input| {
            let mut concept = Concept::from(input);
            // fold -0.0 into 0.0
            if concept.timestamp == 0.0 {
                concept.timestamp = 0.0;
            }
            concept
        })
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = concepts.iter().find(|c| !seen.insert(&c.id)) {
        return Err(LectureGraphError::Validation(format!(
            "duplicate concept id '{}'",
            dup.id
        )));
    }

    let results = ProcessingResults {
        transcript: payload.transcript,
        concepts,
        relationships: payload.relationships,
    };

    let record = state.store.save_processing_results(id, results).await?;
    info!("🧠 Lecture {} now has {} concepts", id, record.concepts.len());
    Ok(record)
}
