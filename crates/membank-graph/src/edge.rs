//! Edge types: directed, typed relationships between nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::node::EntityMetadata;

/// A directed edge in its persisted record shape.
///
/// The key is engine-assigned and opaque to callers. Several edges may join
/// the same ordered pair, with equal or different relationship types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub key: String,
    pub source: String,
    pub target: String,
    pub attributes: EdgeAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeAttributes {
    #[serde(default)]
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntityMetadata>,
}

impl Edge {
    /// Build a new edge with a fresh key and version-1 metadata.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key: new_edge_key(),
            source: source.into(),
            target: target.into(),
            attributes: EdgeAttributes {
                relationship_type: relationship_type.into(),
                metadata: Some(EntityMetadata::fresh(now)),
            },
        }
    }

    pub fn relationship_type(&self) -> &str {
        &self.attributes.relationship_type
    }

    /// Canonical ordering: (source, target, relationshipType), ties by key.
    pub fn sort_key(&self) -> (&str, &str, &str, &str) {
        (
            &self.source,
            &self.target,
            &self.attributes.relationship_type,
            &self.key,
        )
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

fn new_edge_key() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_parses_graph_record_shape() {
        let raw = r#"{
            "key":"e-1",
            "source":"A",
            "target":"B",
            "attributes":{"relationshipType":"CALLS"}
        }"#;

        let edge: Edge = serde_json::from_str(raw).expect("must parse edge record");
        assert_eq!(edge.relationship_type(), "CALLS");
        assert!(edge.attributes.metadata.is_none());
        assert!(edge.touches("B"));
    }

    #[test]
    fn new_edges_get_distinct_keys() {
        let now = Utc::now();
        let first = Edge::new("A", "A", "SELF", now);
        let second = Edge::new("A", "A", "SELF", now);
        assert_ne!(first.key, second.key);
        assert!(first.touches("A"));
        assert!(!first.touches("B"));
        assert_eq!(
            first.attributes.metadata.as_ref().map(|m| m.version),
            Some(1)
        );
    }
}
