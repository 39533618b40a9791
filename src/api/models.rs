//! API data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::{Concept, ConceptId, Relationship};
use crate::store::LectureRecord;

/// Error body returned with every non-2xx status
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Lecture as shown in the lecture list
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureSummary {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub concept_count: usize,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&LectureRecord> for LectureSummary {
    fn from(record: &LectureRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            url: record.url.clone(),
            concept_count: record.concepts.len(),
            processed: record.transcript.is_some() || !record.concepts.is_empty(),
            created_at: record.created_at,
        }
    }
}

/// Concept as delivered by the processing backend; ids are optional and
/// the extractor calls the label `name`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default)]
    pub definition: Option<String>,
    pub timestamp: f64,
}

impl From<ConceptInput> for Concept {
    fn from(input: ConceptInput) -> Self {
        Concept {
            id: input.id.map(ConceptId::from).unwrap_or_else(ConceptId::generate),
            label: input.label,
            definition: input.definition,
            timestamp: input.timestamp,
        }
    }
}

/// Processing backend output for one lecture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsPayload {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub concepts: Vec<ConceptInput>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// `?t=<seconds>&q=<search>` on view endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub t: Option<f64>,
    #[serde(default)]
    pub q: Option<String>,
}
