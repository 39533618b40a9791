//! Renderer-agnostic graph projection

use super::{Concept, ConceptId, Relationship};
use serde::{Deserialize, Serialize};

/// Edge in the shape generic force-graph widgets expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: ConceptId,
    pub target: ConceptId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl From<&Relationship> for GraphEdge {
    fn from(rel: &Relationship) -> Self {
        Self {
            source: rel.source_id.clone(),
            target: rel.target_id.clone(),
            kind: rel.kind.clone(),
        }
    }
}

/// Project relationships into renderer edges.
///
/// One edge per relationship, in input order. Endpoints are not checked
/// against the concept list; renderers skip edges whose nodes are missing.
pub fn project(relationships: &[Relationship]) -> Vec<GraphEdge> {
    relationships.iter().map(GraphEdge::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: ConceptId,
    pub label: String,
    pub timestamp: f64,
    pub active: bool,
}

/// Nodes and links ready for a force-directed renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphEdge>,
    pub active_node_id: Option<ConceptId>,
}

impl GraphData {
    pub fn build(
        concepts: &[Concept],
        relationships: &[Relationship],
        active: Option<&ConceptId>,
    ) -> Self {
        let nodes = concepts
            .iter()
            .map(|c| GraphNode {
                id: c.id.clone(),
                label: c.label.clone(),
                timestamp: c.timestamp,
                active: Some(&c.id) == active,
            })
            .collect();

        Self {
            nodes,
            links: project(relationships),
            active_node_id: active.cloned(),
        }
    }
}
