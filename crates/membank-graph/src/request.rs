//! Operation inputs and their shape validation.
//!
//! Field names follow the JSON the calling agent sends (camelCase, with the
//! snake_case spellings accepted as aliases). Validation collects every
//! violation instead of stopping at the first one.

use crate::node::NodeData;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// One failed shape constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid request: {}", join_violations(.violations))]
pub struct RequestError {
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn fail(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(Violation {
            field: field.into(),
            reason: reason.into(),
        });
    }

    fn non_empty(&mut self, field: impl Into<String>, value: &str) {
        if value.is_empty() {
            self.fail(field, "must not be empty");
        }
    }

    fn finish(self) -> Result<(), RequestError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(RequestError {
                violations: self.violations,
            })
        }
    }
}

/// Reject blank names and names that would escape the base directory.
pub fn validate_project_name(name: &str) -> Result<(), RequestError> {
    let mut checker = Checker::default();
    check_project_name(&mut checker, name);
    checker.finish()
}

fn check_project_name(checker: &mut Checker, name: &str) {
    if name.trim().is_empty() {
        checker.fail("project", "must not be blank");
    } else if name == "." || name == ".." {
        checker.fail("project", "must not be a relative directory name");
    }
}

// ── Mutation inputs ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeInput {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdateInput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDeleteInput {
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
}

impl EdgeDeleteInput {
    /// The relationship type to match, if any. Blank means every type.
    pub fn relationship_filter(&self) -> Option<&str> {
        non_blank(self.relationship_type.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAddRequest {
    #[serde(default)]
    pub nodes: Vec<NodeInput>,
    #[serde(default)]
    pub edges: Vec<EdgeInput>,
    #[serde(default, alias = "silent_mode")]
    pub silent_mode: bool,
}

impl BatchAddRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut checker = Checker::default();
        if self.nodes.is_empty() && self.edges.is_empty() {
            checker.fail("nodes|edges", "at least one node or edge is required");
        }
        for (i, node) in self.nodes.iter().enumerate() {
            checker.non_empty(format!("nodes[{i}].id"), &node.id);
            checker.non_empty(format!("nodes[{i}].type"), &node.node_type);
            checker.non_empty(format!("nodes[{i}].label"), &node.label);
        }
        for (i, edge) in self.edges.iter().enumerate() {
            checker.non_empty(format!("edges[{i}].sourceId"), &edge.source_id);
            checker.non_empty(format!("edges[{i}].targetId"), &edge.target_id);
            checker.non_empty(
                format!("edges[{i}].relationshipType"),
                &edge.relationship_type,
            );
        }
        checker.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateRequest {
    #[serde(default)]
    pub nodes: Vec<NodeUpdateInput>,
    #[serde(default, alias = "silent_mode")]
    pub silent_mode: bool,
}

impl BatchUpdateRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut checker = Checker::default();
        if self.nodes.is_empty() {
            checker.fail("nodes", "at least one node is required");
        }
        for (i, node) in self.nodes.iter().enumerate() {
            checker.non_empty(format!("nodes[{i}].id"), &node.id);
        }
        checker.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    #[serde(default, alias = "node_ids")]
    pub node_ids: Vec<String>,
    #[serde(default)]
    pub edges: Vec<EdgeDeleteInput>,
    /// Deletes are quiet about missing targets unless asked otherwise.
    #[serde(default = "default_true", alias = "silent_mode")]
    pub silent_mode: bool,
}

impl Default for BatchDeleteRequest {
    fn default() -> Self {
        Self {
            node_ids: Vec::new(),
            edges: Vec::new(),
            silent_mode: true,
        }
    }
}

impl BatchDeleteRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut checker = Checker::default();
        if self.node_ids.is_empty() && self.edges.is_empty() {
            checker.fail("nodeIds|edges", "at least one node id or edge is required");
        }
        for (i, id) in self.node_ids.iter().enumerate() {
            checker.non_empty(format!("nodeIds[{i}]"), id);
        }
        for (i, edge) in self.edges.iter().enumerate() {
            checker.non_empty(format!("edges[{i}].sourceId"), &edge.source_id);
            checker.non_empty(format!("edges[{i}].targetId"), &edge.target_id);
        }
        checker.finish()
    }
}

// ── Query inputs ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Id,
    Type,
    Label,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_search_fields", alias = "search_in")]
    pub search_in: Vec<SearchField>,
    #[serde(default, alias = "case_sensitive")]
    pub case_sensitive: bool,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

impl SearchRequest {
    /// A request with the default fields, case folding and cap.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_in: default_search_fields(),
            case_sensitive: false,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        let mut checker = Checker::default();
        checker.non_empty("query", &self.query);
        if self.limit == 0 {
            checker.fail("limit", "must be a positive integer");
        }
        checker.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterAttribute {
    Type,
    Label,
    DataKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub attribute: FilterAttribute,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "data_key")]
    pub data_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    #[default]
    Both,
}

impl Direction {
    pub fn includes_out(self) -> bool {
        matches!(self, Self::Out | Self::Both)
    }

    pub fn includes_in(self) -> bool {
        matches!(self, Self::In | Self::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQuery {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbors_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl GraphQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_QUERY_LIMIT)
    }

    /// The neighbor seed; a blank seed means no neighbor query.
    pub fn seed(&self) -> Option<&str> {
        non_blank(self.neighbors_of.as_deref())
    }

    pub fn relationship_filter(&self) -> Option<&str> {
        non_blank(self.relationship_type.as_deref())
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        let mut checker = Checker::default();
        if self.limit == Some(0) {
            checker.fail("limit", "must be a positive integer");
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if filter.attribute == FilterAttribute::DataKey
                && filter.data_key.as_deref().is_none_or(str::is_empty)
            {
                checker.fail(
                    format!("filters[{i}].dataKey"),
                    "required when attribute is dataKey",
                );
            }
        }
        checker.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenNodesRequest {
    #[serde(alias = "node_ids")]
    pub node_ids: Vec<String>,
    #[serde(default = "default_true", alias = "include_relations")]
    pub include_relations: bool,
}

impl OpenNodesRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut checker = Checker::default();
        if self.node_ids.is_empty() {
            checker.fail("nodeIds", "at least one node id is required");
        }
        checker.finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

fn default_true() -> bool {
    true
}

fn default_search_fields() -> Vec<SearchField> {
    vec![SearchField::Id, SearchField::Type, SearchField::Label]
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_name_rejects_blank_and_relative_names() {
        assert!(validate_project_name("demo").is_ok());
        assert!(validate_project_name("   ").is_err());
        assert!(validate_project_name("..").is_err());
        assert!(validate_project_name(".").is_err());
    }

    #[test]
    fn batch_add_collects_every_violation() {
        let raw = r#"{
            "nodes":[{"id":"","type":"","label":"ok"}],
            "edges":[{"sourceId":"a","targetId":"","relationshipType":"R"}]
        }"#;
        let request: BatchAddRequest = serde_json::from_str(raw).expect("must parse");
        let err = request.validate().expect_err("empty fields must fail");
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["nodes[0].id", "nodes[0].type", "edges[0].targetId"]);
        assert!(!request.silent_mode);
    }

    #[test]
    fn batch_add_requires_some_work() {
        let err = BatchAddRequest::default()
            .validate()
            .expect_err("empty batch must fail");
        assert_eq!(err.violations.len(), 1);
        assert!(err.to_string().contains("at least one node or edge"));
    }

    #[test]
    fn batch_delete_defaults_to_silent_and_accepts_snake_case() {
        let request: BatchDeleteRequest =
            serde_json::from_str(r#"{"node_ids":["a"]}"#).expect("must parse alias");
        assert!(request.silent_mode);
        assert_eq!(request.node_ids, vec!["a".to_string()]);
        assert!(request.validate().is_ok());

        let loud: BatchDeleteRequest =
            serde_json::from_str(r#"{"nodeIds":["a"],"silentMode":false}"#).expect("must parse");
        assert!(!loud.silent_mode);
    }

    #[test]
    fn search_request_applies_defaults() {
        let request: SearchRequest =
            serde_json::from_str(r#"{"query":"doThing"}"#).expect("must parse");
        assert_eq!(request, SearchRequest::new("doThing"));
        assert!(request.validate().is_ok());

        let zero: SearchRequest =
            serde_json::from_str(r#"{"query":"x","limit":0}"#).expect("must parse");
        assert!(zero.validate().is_err());
    }

    #[test]
    fn graph_query_parses_camel_case_shape() {
        let raw = r#"{
            "filters":[{"attribute":"dataKey","value":"rs","dataKey":"lang"}],
            "direction":"out"
        }"#;
        let query: GraphQuery = serde_json::from_str(raw).expect("must parse");
        assert_eq!(query.direction, Direction::Out);
        assert_eq!(query.effective_limit(), DEFAULT_QUERY_LIMIT);
        assert!(query.validate().is_ok());

        let missing_key: GraphQuery =
            serde_json::from_str(r#"{"filters":[{"attribute":"dataKey","value":"rs"}]}"#)
                .expect("must parse");
        assert!(missing_key.validate().is_err());
    }

    #[test]
    fn blank_seed_and_relationship_type_read_as_absent() {
        let query: GraphQuery =
            serde_json::from_str(r#"{"neighborsOf":"","relationshipType":""}"#)
                .expect("must parse");
        assert_eq!(query.seed(), None);
        assert_eq!(query.relationship_filter(), None);

        let edge: EdgeDeleteInput =
            serde_json::from_str(r#"{"sourceId":"a","targetId":"b","relationshipType":""}"#)
                .expect("must parse");
        assert_eq!(edge.relationship_filter(), None);

        let typed = EdgeDeleteInput {
            relationship_type: Some("CALLS".to_string()),
            ..edge
        };
        assert_eq!(typed.relationship_filter(), Some("CALLS"));
    }

    #[test]
    fn open_nodes_defaults_to_including_relations() {
        let request: OpenNodesRequest =
            serde_json::from_str(r#"{"nodeIds":["a","b"]}"#).expect("must parse");
        assert!(request.include_relations);
        assert!(request.validate().is_ok());
    }
}
