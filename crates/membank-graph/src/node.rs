//! Node type: the entities of a project knowledge graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended structured payload attached to a node.
pub type NodeData = Map<String, Value>;

/// Per-entity bookkeeping shared by nodes and edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub version: u64,
}

impl EntityMetadata {
    /// Metadata for an entity created at `now`.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_modified: now,
            version: 1,
        }
    }

    /// Record one accepted change.
    ///
    /// `last_modified` never moves backwards, even if the wall clock does.
    pub fn bump(&mut self, now: DateTime<Utc>) {
        self.last_modified = self.last_modified.max(now);
        self.version += 1;
    }
}

/// A node: caller-identified entity with a type tag, a label and optional data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identity. Decoders fill this from the record key when it is absent.
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default)]
    pub node_type: String,

    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntityMetadata>,
}

impl Node {
    /// Build a node as batch-add creates it: data always present, version 1.
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        label: impl Into<String>,
        data: Option<NodeData>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            label: label.into(),
            data: Some(data.unwrap_or_default()),
            metadata: Some(EntityMetadata::fresh(now)),
        }
    }

    /// Current entity version (0 when the node carries no metadata).
    pub fn version(&self) -> u64 {
        self.metadata.as_ref().map_or(0, |m| m.version)
    }

    /// Shallow-merge `patch` into `data`: patch keys win, other keys survive.
    pub fn merge_data(&mut self, patch: &NodeData) {
        let data = self.data.get_or_insert_with(NodeData::new);
        for (key, value) in patch {
            data.insert(key.clone(), value.clone());
        }
    }

    /// Record an accepted update, backfilling metadata when it was missing.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.metadata
            .get_or_insert_with(|| EntityMetadata::fresh(now))
            .bump(now);
    }

    /// Compact JSON text of `data`, the form substring search runs over.
    pub fn data_text(&self) -> Option<String> {
        self.data
            .as_ref()
            .map(|data| Value::Object(data.clone()).to_string())
    }
}
