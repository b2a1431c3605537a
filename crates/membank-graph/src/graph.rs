//! Canonical in-memory representation of one project's knowledge graph.
//!
//! A directed multigraph that permits self-loops, indexed by id:
//! - node id -> node record
//! - edge key -> edge record
//! - node id -> outgoing / incoming edge keys
//!
//! Iteration is deterministic: nodes by ascending id, edges by
//! `(source, target, relationshipType, key)`.

use crate::edge::Edge;
use crate::node::Node;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Structural errors raised while assembling a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node already exists: {0}")]
    DuplicateNode(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("edge key already exists: {0}")]
    DuplicateEdge(String),
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<String, Edge>,
    outgoing: BTreeMap<String, BTreeSet<String>>,
    incoming: BTreeMap<String, BTreeSet<String>>,
    document_version: u64,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save version of the document this graph was decoded from (0 if none).
    pub fn document_version(&self) -> u64 {
        self.document_version
    }

    pub(crate) fn set_document_version(&mut self, version: u64) {
        self.document_version = version;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Iterate all nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in canonical order.
    pub fn edges(&self) -> Vec<&Edge> {
        sorted(self.edges.values())
    }

    /// Insert a node. Existing ids are never overwritten.
    pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert a fully-formed edge. Both endpoints must already exist.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !self.has_node(&edge.source) {
            return Err(GraphError::NodeNotFound(edge.source));
        }
        if !self.has_node(&edge.target) {
            return Err(GraphError::NodeNotFound(edge.target));
        }
        if self.edges.contains_key(&edge.key) {
            return Err(GraphError::DuplicateEdge(edge.key));
        }

        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.key.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.key.clone());
        self.edges.insert(edge.key.clone(), edge);
        Ok(())
    }

    /// Create a new directed edge and return its key.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        relationship_type: &str,
        now: DateTime<Utc>,
    ) -> Result<String, GraphError> {
        let edge = Edge::new(source, target, relationship_type, now);
        let key = edge.key.clone();
        self.insert_edge(edge)?;
        Ok(key)
    }

    /// Remove one edge by key.
    pub fn remove_edge(&mut self, key: &str) -> Option<Edge> {
        let edge = self.edges.remove(key)?;
        if let Some(keys) = self.outgoing.get_mut(&edge.source) {
            keys.remove(key);
            if keys.is_empty() {
                self.outgoing.remove(&edge.source);
            }
        }
        if let Some(keys) = self.incoming.get_mut(&edge.target) {
            keys.remove(key);
            if keys.is_empty() {
                self.incoming.remove(&edge.target);
            }
        }
        Some(edge)
    }

    /// Remove a node together with every incident edge, in both directions.
    ///
    /// Returns the node and the cascaded edges in canonical order.
    pub fn remove_node(&mut self, id: &str) -> Option<(Node, Vec<Edge>)> {
        let node = self.nodes.remove(id)?;

        let mut keys: BTreeSet<String> = BTreeSet::new();
        if let Some(out) = self.outgoing.get(id) {
            keys.extend(out.iter().cloned());
        }
        if let Some(inc) = self.incoming.get(id) {
            keys.extend(inc.iter().cloned());
        }

        let mut removed: Vec<Edge> = keys
            .iter()
            .filter_map(|key| self.remove_edge(key))
            .collect();
        removed.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Some((node, removed))
    }

    /// Directed edges from `source` to `target`, in canonical order.
    pub fn edges_between(&self, source: &str, target: &str) -> Vec<&Edge> {
        let Some(keys) = self.outgoing.get(source) else {
            return Vec::new();
        };
        sorted(
            keys.iter()
                .filter_map(|key| self.edges.get(key))
                .filter(|edge| edge.target == target),
        )
    }

    /// Ids reachable over one outgoing edge, ascending.
    pub fn out_neighbors(&self, id: &str) -> BTreeSet<&str> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|key| self.edges.get(key))
            .map(|edge| edge.target.as_str())
            .collect()
    }

    /// Ids with an edge pointing at `id`, ascending.
    pub fn in_neighbors(&self, id: &str) -> BTreeSet<&str> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|key| self.edges.get(key))
            .map(|edge| edge.source.as_str())
            .collect()
    }

    /// Edges whose endpoints both lie in `ids`, in canonical order.
    pub fn induced_edges(&self, ids: &BTreeSet<String>) -> Vec<&Edge> {
        if ids.is_empty() {
            return Vec::new();
        }
        let mut keys: BTreeSet<&str> = BTreeSet::new();
        for id in ids {
            for key in self.outgoing.get(id).into_iter().flatten() {
                if let Some(edge) = self.edges.get(key)
                    && ids.contains(&edge.target)
                {
                    keys.insert(key.as_str());
                }
            }
        }
        sorted(keys.into_iter().filter_map(|key| self.edges.get(key)))
    }
}

fn sorted<'a>(edges: impl Iterator<Item = &'a Edge>) -> Vec<&'a Edge> {
    let mut edges: Vec<&Edge> = edges.collect();
    edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> Node {
        Node::new(id, "Concept", format!("Node {id}"), None, Utc::now())
    }

    fn graph_with(ids: &[&str]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        for id in ids {
            graph.insert_node(node(id)).expect("node should insert");
        }
        graph
    }

    #[test]
    fn insert_node_rejects_duplicates_without_overwrite() {
        let mut graph = graph_with(&["a"]);
        let mut replacement = node("a");
        replacement.label = "changed".to_string();

        let err = graph
            .insert_node(replacement)
            .expect_err("duplicate id must error");
        assert_eq!(err, GraphError::DuplicateNode("a".to_string()));
        assert_eq!(graph.node("a").expect("node kept").label, "Node a");
    }

    #[test]
    fn add_edge_requires_existing_endpoints() {
        let mut graph = graph_with(&["a"]);
        let err = graph
            .add_edge("a", "missing", "CALLS", Utc::now())
            .expect_err("missing endpoint must error");
        assert_eq!(err, GraphError::NodeNotFound("missing".to_string()));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn multi_edges_and_self_loops_are_kept() {
        let mut graph = graph_with(&["a", "b"]);
        let now = Utc::now();
        graph.add_edge("a", "b", "CALLS", now).expect("first");
        graph.add_edge("a", "b", "CALLS", now).expect("second");
        graph.add_edge("a", "b", "USES", now).expect("third");
        graph.add_edge("a", "a", "RECURSES", now).expect("loop");

        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.edges_between("a", "b").len(), 3);
        assert_eq!(graph.edges_between("b", "a").len(), 0);
        assert_eq!(graph.edges_between("a", "a").len(), 1);
        assert_eq!(graph.out_neighbors("a"), BTreeSet::from(["a", "b"]));
        assert_eq!(graph.in_neighbors("a"), BTreeSet::from(["a"]));
    }

    #[test]
    fn remove_node_cascades_both_directions() {
        let mut graph = graph_with(&["a", "b", "c"]);
        let now = Utc::now();
        graph.add_edge("a", "b", "CALLS", now).expect("a->b");
        graph.add_edge("c", "a", "USES", now).expect("c->a");
        graph.add_edge("a", "a", "LOOP", now).expect("a->a");
        graph.add_edge("b", "c", "USES", now).expect("b->c");

        let (_, removed) = graph.remove_node("a").expect("node exists");
        assert_eq!(removed.len(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edges().iter().all(|edge| !edge.touches("a")));
        assert!(graph.out_neighbors("c").is_empty());
        assert!(graph.in_neighbors("b").is_empty());
    }

    #[test]
    fn neighbors_follow_direction() {
        let mut graph = graph_with(&["a", "b", "c"]);
        let now = Utc::now();
        graph.add_edge("a", "b", "CALLS", now).expect("a->b");
        graph.add_edge("c", "a", "CALLS", now).expect("c->a");

        assert_eq!(graph.out_neighbors("a").into_iter().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(graph.in_neighbors("a").into_iter().collect::<Vec<_>>(), vec!["c"]);
        assert!(graph.out_neighbors("b").is_empty());
    }

    #[test]
    fn edges_iterate_in_canonical_order() {
        let mut graph = graph_with(&["a", "b", "c"]);
        let now = Utc::now();
        graph.add_edge("b", "c", "USES", now).expect("b->c");
        graph.add_edge("a", "c", "USES", now).expect("a->c USES");
        graph.add_edge("a", "c", "CALLS", now).expect("a->c CALLS");
        graph.add_edge("a", "b", "USES", now).expect("a->b");

        let order: Vec<(&str, &str, &str)> = graph
            .edges()
            .into_iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.relationship_type()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a", "b", "USES"),
                ("a", "c", "CALLS"),
                ("a", "c", "USES"),
                ("b", "c", "USES"),
            ]
        );
    }

    #[test]
    fn induced_edges_include_self_loops_and_skip_outside_nodes() {
        let mut graph = graph_with(&["a", "b", "c"]);
        let now = Utc::now();
        graph.add_edge("a", "b", "CALLS", now).expect("a->b");
        graph.add_edge("b", "c", "CALLS", now).expect("b->c");
        graph.add_edge("a", "a", "LOOP", now).expect("a->a");

        let ids: BTreeSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        let induced = graph.induced_edges(&ids);
        assert_eq!(induced.len(), 2);
        assert!(induced.iter().all(|e| e.target != "c"));
    }
}
