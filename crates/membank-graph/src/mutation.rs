//! Batch mutations: one load, best-effort application, one save.
//!
//! The `apply_*` functions are pure over an in-memory graph. The `batch_*`
//! functions wrap them in a store round-trip and attach the snapshot
//! metadata of the save.

use crate::document::SnapshotMetadata;
use crate::graph::KnowledgeGraph;
use crate::node::Node;
use crate::request::{
    BatchAddRequest, BatchDeleteRequest, BatchUpdateRequest, RequestError, validate_project_name,
};
use crate::store::{GraphStore, LoadStatus, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why an item in a batch was skipped, or what the call recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    DuplicateNode,
    MissingNode,
    MissingEndpoint,
    NothingToUpdate,
    NoMatchingEdge,
    RecoveredCorrupt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReport {
    pub nodes_added: usize,
    pub nodes_skipped: usize,
    pub edges_added: usize,
    pub edges_skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub nodes_updated: usize,
    pub nodes_skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub nodes_deleted: usize,
    pub nodes_skipped: usize,
    /// Edges removed because one of their endpoints was deleted.
    pub cascaded_edges: usize,
    pub edges_deleted: usize,
    pub edges_skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotMetadata>,
}

/// Collects diagnostics, dropping expected-skip notices in silent mode.
struct Diagnostics {
    silent: bool,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    fn new(silent: bool) -> Self {
        Self {
            silent,
            entries: Vec::new(),
        }
    }

    fn skip(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        if !self.silent {
            self.entries.push(Diagnostic::new(kind, message));
        }
    }

    fn always(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.entries.push(Diagnostic::new(kind, message));
    }
}

/// Add nodes (ascending id) and then edges (ascending endpoint/type order).
pub fn apply_add(
    graph: &mut KnowledgeGraph,
    request: &BatchAddRequest,
    now: DateTime<Utc>,
) -> AddReport {
    let mut report = AddReport::default();
    let mut diagnostics = Diagnostics::new(request.silent_mode);

    let mut nodes: Vec<_> = request.nodes.iter().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    for input in nodes {
        let node = Node::new(
            &input.id,
            &input.node_type,
            &input.label,
            input.data.clone(),
            now,
        );
        if graph.insert_node(node).is_ok() {
            report.nodes_added += 1;
        } else {
            report.nodes_skipped += 1;
            diagnostics.skip(
                DiagnosticKind::DuplicateNode,
                format!("node `{}` already exists; skipped", input.id),
            );
        }
    }

    let mut edges: Vec<_> = request.edges.iter().collect();
    edges.sort_by(|a, b| {
        (&a.source_id, &a.target_id, &a.relationship_type).cmp(&(
            &b.source_id,
            &b.target_id,
            &b.relationship_type,
        ))
    });
    for input in edges {
        let missing = [&input.source_id, &input.target_id]
            .into_iter()
            .find(|id| !graph.has_node(id));
        if let Some(missing) = missing {
            report.edges_skipped += 1;
            diagnostics.skip(
                DiagnosticKind::MissingEndpoint,
                format!(
                    "edge {} -> {} ({}): node `{missing}` does not exist; skipped",
                    input.source_id, input.target_id, input.relationship_type
                ),
            );
            continue;
        }
        // Endpoints checked above, so only a key collision could fail here.
        match graph.add_edge(
            &input.source_id,
            &input.target_id,
            &input.relationship_type,
            now,
        ) {
            Ok(_) => report.edges_added += 1,
            Err(err) => {
                report.edges_skipped += 1;
                diagnostics.always(DiagnosticKind::MissingEndpoint, err.to_string());
            }
        }
    }

    report.diagnostics = diagnostics.entries;
    report
}

/// Update labels and merge data of existing nodes, in ascending id order.
pub fn apply_update(
    graph: &mut KnowledgeGraph,
    request: &BatchUpdateRequest,
    now: DateTime<Utc>,
) -> UpdateReport {
    let mut report = UpdateReport::default();
    let mut diagnostics = Diagnostics::new(request.silent_mode);

    let mut inputs: Vec<_> = request.nodes.iter().collect();
    inputs.sort_by(|a, b| a.id.cmp(&b.id));
    for input in inputs {
        let Some(node) = graph.node_mut(&input.id) else {
            report.nodes_skipped += 1;
            diagnostics.skip(
                DiagnosticKind::MissingNode,
                format!("node `{}` not found; skipped", input.id),
            );
            continue;
        };

        let new_label = input.new_label.as_deref().filter(|label| !label.is_empty());
        if new_label.is_none() && input.data.is_none() {
            report.nodes_skipped += 1;
            diagnostics.always(
                DiagnosticKind::NothingToUpdate,
                format!("node `{}`: no label or data supplied; skipped", input.id),
            );
            continue;
        }

        if let Some(label) = new_label {
            node.label = label.to_string();
        }
        if let Some(patch) = &input.data {
            node.merge_data(patch);
        }
        node.touch(now);
        report.nodes_updated += 1;
    }

    report.diagnostics = diagnostics.entries;
    report
}

/// Delete nodes (with cascade) and then matching edges.
pub fn apply_delete(graph: &mut KnowledgeGraph, request: &BatchDeleteRequest) -> DeleteReport {
    let mut report = DeleteReport::default();
    let mut diagnostics = Diagnostics::new(request.silent_mode);

    let mut ids: Vec<&String> = request.node_ids.iter().collect();
    ids.sort();
    for id in ids {
        match graph.remove_node(id) {
            Some((_, cascaded)) => {
                report.nodes_deleted += 1;
                report.cascaded_edges += cascaded.len();
            }
            None => {
                report.nodes_skipped += 1;
                diagnostics.skip(
                    DiagnosticKind::MissingNode,
                    format!("node `{id}` not found; skipped"),
                );
            }
        }
    }

    let mut edges: Vec<_> = request.edges.iter().collect();
    edges.sort_by(|a, b| {
        (&a.source_id, &a.target_id, &a.relationship_type).cmp(&(
            &b.source_id,
            &b.target_id,
            &b.relationship_type,
        ))
    });
    for input in edges {
        let missing = [&input.source_id, &input.target_id]
            .into_iter()
            .find(|id| !graph.has_node(id));
        if let Some(missing) = missing {
            report.edges_skipped += 1;
            diagnostics.skip(
                DiagnosticKind::MissingEndpoint,
                format!(
                    "edge {} -> {}: node `{missing}` not found; skipped",
                    input.source_id, input.target_id
                ),
            );
            continue;
        }

        let wanted = input.relationship_filter();
        let keys: Vec<String> = graph
            .edges_between(&input.source_id, &input.target_id)
            .into_iter()
            .filter(|edge| wanted.is_none_or(|rel| edge.relationship_type() == rel))
            .map(|edge| edge.key.clone())
            .collect();

        if keys.is_empty() {
            report.edges_skipped += 1;
            let qualifier = wanted
                .map(|rel| format!(" of type `{rel}`"))
                .unwrap_or_default();
            diagnostics.skip(
                DiagnosticKind::NoMatchingEdge,
                format!(
                    "no edges{qualifier} from {} to {}; skipped",
                    input.source_id, input.target_id
                ),
            );
            continue;
        }

        for key in &keys {
            graph.remove_edge(key);
        }
        report.edges_deleted += keys.len();
    }

    report.diagnostics = diagnostics.entries;
    report
}

fn recovery_diagnostic(status: &LoadStatus, quarantined: Option<&Path>) -> Option<Diagnostic> {
    let LoadStatus::Corrupt { reason } = status else {
        return None;
    };
    let message = match quarantined {
        Some(path) => format!(
            "stored graph was unreadable ({reason}); started empty and moved it to {}",
            path.display()
        ),
        None => format!("stored graph was unreadable ({reason}); started empty"),
    };
    Some(Diagnostic::new(DiagnosticKind::RecoveredCorrupt, message))
}

fn with_recovery(
    mut diagnostics: Vec<Diagnostic>,
    status: &LoadStatus,
    quarantined: Option<&Path>,
) -> Vec<Diagnostic> {
    if let Some(recovered) = recovery_diagnostic(status, quarantined) {
        diagnostics.insert(0, recovered);
    }
    diagnostics
}

pub fn batch_add(
    store: &GraphStore,
    project: &str,
    request: &BatchAddRequest,
) -> Result<AddReport, MutationError> {
    validate_project_name(project)?;
    request.validate()?;

    let (mut report, snapshot) = store.mutate(project, |graph, status, quarantined| {
        let mut report = apply_add(graph, request, Utc::now());
        report.diagnostics = with_recovery(report.diagnostics, status, quarantined);
        report
    })?;
    debug!(
        project,
        nodes_added = report.nodes_added,
        nodes_skipped = report.nodes_skipped,
        edges_added = report.edges_added,
        edges_skipped = report.edges_skipped,
        "batch add applied"
    );
    report.snapshot = Some(snapshot);
    Ok(report)
}

pub fn batch_update(
    store: &GraphStore,
    project: &str,
    request: &BatchUpdateRequest,
) -> Result<UpdateReport, MutationError> {
    validate_project_name(project)?;
    request.validate()?;

    let (mut report, snapshot) = store.mutate(project, |graph, status, quarantined| {
        let mut report = apply_update(graph, request, Utc::now());
        report.diagnostics = with_recovery(report.diagnostics, status, quarantined);
        report
    })?;
    debug!(
        project,
        nodes_updated = report.nodes_updated,
        nodes_skipped = report.nodes_skipped,
        "batch update applied"
    );
    report.snapshot = Some(snapshot);
    Ok(report)
}

pub fn batch_delete(
    store: &GraphStore,
    project: &str,
    request: &BatchDeleteRequest,
) -> Result<DeleteReport, MutationError> {
    validate_project_name(project)?;
    request.validate()?;

    let (mut report, snapshot) = store.mutate(project, |graph, status, quarantined| {
        let mut report = apply_delete(graph, request);
        report.diagnostics = with_recovery(report.diagnostics, status, quarantined);
        report
    })?;
    debug!(
        project,
        nodes_deleted = report.nodes_deleted,
        cascaded_edges = report.cascaded_edges,
        edges_deleted = report.edges_deleted,
        "batch delete applied"
    );
    report.snapshot = Some(snapshot);
    Ok(report)
}
