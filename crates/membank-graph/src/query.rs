//! Read-only graph queries: substring search, filtered and neighbor queries,
//! and direct lookup by id.
//!
//! Every entry point loads the project graph and never saves it. Node
//! results come out in ascending id order (direct lookup keeps request
//! order) and edge results in canonical edge order, so identical stored
//! state and parameters always produce identical output. A result read from
//! an unreadable document is empty and carries the read failure in
//! `recovered`.

use crate::edge::Edge;
use crate::graph::KnowledgeGraph;
use crate::node::Node;
use crate::request::{
    FilterAttribute, GraphQuery, OpenNodesRequest, RequestError, SearchField, SearchRequest,
    validate_project_name,
};
use crate::store::GraphStore;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// A node as returned to callers: id plus the full stored attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub attributes: Node,
}

impl NodeView {
    fn of(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            attributes: node.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<Edge>,
    /// Set when a neighbor query names a seed that does not exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_found: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovered: Option<String>,
}

impl QueryResult {
    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|view| view.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpenNodesResult {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<Edge>,
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovered: Option<String>,
}

/// Nodes plus the edges induced among them.
fn with_induced_edges(graph: &KnowledgeGraph, nodes: Vec<&Node>) -> QueryResult {
    let ids: BTreeSet<String> = nodes.iter().map(|node| node.id.clone()).collect();
    QueryResult {
        nodes: nodes.into_iter().map(NodeView::of).collect(),
        edges: graph.induced_edges(&ids).into_iter().cloned().collect(),
        ..QueryResult::default()
    }
}

fn field_text(node: &Node, field: SearchField) -> Option<String> {
    match field {
        SearchField::Id => Some(node.id.clone()),
        SearchField::Type => Some(node.node_type.clone()),
        SearchField::Label => Some(node.label.clone()),
        SearchField::Data => node.data_text(),
    }
}

/// Substring search over selected node fields.
pub fn evaluate_search(graph: &KnowledgeGraph, request: &SearchRequest) -> QueryResult {
    let needle = if request.case_sensitive {
        request.query.clone()
    } else {
        request.query.to_lowercase()
    };
    let fields: BTreeSet<SearchField> = request.search_in.iter().copied().collect();

    let is_match = |node: &Node| {
        fields.iter().any(|field| {
            field_text(node, *field).is_some_and(|text| {
                if request.case_sensitive {
                    text.contains(&needle)
                } else {
                    text.to_lowercase().contains(&needle)
                }
            })
        })
    };

    let nodes: Vec<&Node> = graph
        .nodes()
        .filter(|node| is_match(*node))
        .take(request.limit)
        .collect();
    with_induced_edges(graph, nodes)
}

/// Filtered, neighbor or unfiltered query.
///
/// A non-blank seed takes precedence over filters.
pub fn evaluate_query(graph: &KnowledgeGraph, query: &GraphQuery) -> QueryResult {
    match query.seed() {
        Some(seed) => neighbors(graph, seed, query),
        None => filtered(graph, query),
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn passes_filters(node: &Node, query: &GraphQuery) -> bool {
    query.filters.iter().all(|filter| match filter.attribute {
        FilterAttribute::Type => contains_folded(&node.node_type, &filter.value),
        FilterAttribute::Label => contains_folded(&node.label, &filter.value),
        FilterAttribute::DataKey => {
            let Some(key) = filter.data_key.as_deref() else {
                return false;
            };
            matches!(
                node.data.as_ref().and_then(|data| data.get(key)),
                Some(Value::String(text)) if contains_folded(text, &filter.value)
            )
        }
    })
}

fn filtered(graph: &KnowledgeGraph, query: &GraphQuery) -> QueryResult {
    let nodes: Vec<&Node> = graph
        .nodes()
        .filter(|node| passes_filters(node, query))
        .take(query.effective_limit())
        .collect();
    with_induced_edges(graph, nodes)
}

fn neighbors(graph: &KnowledgeGraph, seed: &str, query: &GraphQuery) -> QueryResult {
    let Some(seed_node) = graph.node(seed) else {
        return QueryResult {
            not_found: Some(seed.to_string()),
            ..QueryResult::default()
        };
    };

    let limit = query.effective_limit();
    let direction = query.direction;
    let wanted = query.relationship_filter();
    let qualifies = |edge: &&Edge| wanted.is_none_or(|rel| edge.relationship_type() == rel);

    let mut candidates: BTreeSet<&str> = BTreeSet::new();
    if direction.includes_out() {
        candidates.extend(graph.out_neighbors(seed));
    }
    if direction.includes_in() {
        candidates.extend(graph.in_neighbors(seed));
    }
    candidates.remove(seed);

    let mut nodes = vec![NodeView::of(seed_node)];
    let mut edges: Vec<&Edge> = Vec::new();
    for neighbor in candidates {
        if nodes.len() >= limit {
            break;
        }
        let mut found: Vec<&Edge> = Vec::new();
        if direction.includes_out() {
            found.extend(graph.edges_between(seed, neighbor).into_iter().filter(qualifies));
        }
        if direction.includes_in() {
            found.extend(graph.edges_between(neighbor, seed).into_iter().filter(qualifies));
        }
        if found.is_empty() {
            continue;
        }
        if let Some(node) = graph.node(neighbor) {
            nodes.push(NodeView::of(node));
            edges.extend(found);
        }
    }

    edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    QueryResult {
        nodes,
        edges: edges.into_iter().cloned().collect(),
        ..QueryResult::default()
    }
}

/// Direct lookup by id; request order, duplicates collapsed.
pub fn evaluate_open_nodes(graph: &KnowledgeGraph, request: &OpenNodesRequest) -> OpenNodesResult {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut nodes: Vec<NodeView> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for id in &request.node_ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match graph.node(id) {
            Some(node) => nodes.push(NodeView::of(node)),
            None => missing.push(id.clone()),
        }
    }

    let edges = if request.include_relations {
        let ids: BTreeSet<String> = nodes.iter().map(|view| view.id.clone()).collect();
        graph.induced_edges(&ids).into_iter().cloned().collect()
    } else {
        Vec::new()
    };

    OpenNodesResult {
        nodes,
        edges,
        missing,
        recovered: None,
    }
}

pub fn search(
    store: &GraphStore,
    project: &str,
    request: &SearchRequest,
) -> Result<QueryResult, QueryError> {
    validate_project_name(project)?;
    request.validate()?;

    let loaded = store.load(project);
    let result = QueryResult {
        recovered: loaded.status.corrupt_reason().map(str::to_string),
        ..evaluate_search(&loaded.graph, request)
    };
    debug!(
        project,
        query = %request.query,
        nodes = result.nodes.len(),
        edges = result.edges.len(),
        "search evaluated"
    );
    Ok(result)
}

pub fn query(
    store: &GraphStore,
    project: &str,
    query: &GraphQuery,
) -> Result<QueryResult, QueryError> {
    validate_project_name(project)?;
    query.validate()?;

    let loaded = store.load(project);
    let result = QueryResult {
        recovered: loaded.status.corrupt_reason().map(str::to_string),
        ..evaluate_query(&loaded.graph, query)
    };
    debug!(
        project,
        nodes = result.nodes.len(),
        edges = result.edges.len(),
        not_found = result.not_found.as_deref(),
        "graph query evaluated"
    );
    Ok(result)
}

pub fn open_nodes(
    store: &GraphStore,
    project: &str,
    request: &OpenNodesRequest,
) -> Result<OpenNodesResult, QueryError> {
    validate_project_name(project)?;
    request.validate()?;

    let loaded = store.load(project);
    let result = OpenNodesResult {
        recovered: loaded.status.corrupt_reason().map(str::to_string),
        ..evaluate_open_nodes(&loaded.graph, request)
    };
    if !result.missing.is_empty() {
        debug!(project, missing = ?result.missing, "requested nodes not found");
    }
    Ok(result)
}
