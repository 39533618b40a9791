//! Knowledge graph data model
//!
//! Concepts and relationships are produced by the external extraction backend
//! and only read here. The submodules derive view data from them: the active
//! concept for a playback time, renderer edges, and the searchable concept list.

pub mod edges;
pub mod index;
pub mod timeline;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use edges::{project, GraphData, GraphEdge, GraphNode};
pub use index::{format_time, ConceptIndex, ConceptListEntry};
pub use timeline::{resolve_active, TimelineIndex};

/// Opaque concept identifier, stable for the lecture's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(String);

impl ConceptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier for concepts delivered without one
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConceptId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConceptId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A timestamped knowledge-graph node extracted from a lecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,

    /// Short display name
    pub label: String,

    /// Free-text explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// Seconds into the source video where this concept becomes current
    pub timestamp: f64,
}

impl Concept {
    pub fn new(id: impl Into<ConceptId>, label: impl Into<String>, timestamp: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            definition: None,
            timestamp,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }
}

/// A directed, typed edge between two concepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source_id: ConceptId,
    pub target_id: ConceptId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Relationship {
    pub fn new(source: impl Into<ConceptId>, target: impl Into<ConceptId>) -> Self {
        Self {
            source_id: source.into(),
            target_id: target.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}
