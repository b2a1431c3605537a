//! # membank-graph
//!
//! Per-project persistent knowledge graph for agent memory.
//!
//! This crate provides:
//! - `Node` and `Edge` types (the graph entities)
//! - `KnowledgeGraph` (adjacency-indexed directed multigraph)
//! - JSON document codec with atomic writes (portable persistence)
//! - `GraphStore` (fail-open load, fail-closed save, corrupt-file quarantine)
//! - batch mutations and read-only queries over one project graph
//!
//! Every call is one load, optional mutation, and at most one save. There is
//! no cross-process locking: the last writer wins, and atomic rename keeps
//! readers from ever seeing a half-written document.
//!
//! ## Data model
//!
//! ```text
//! <base>/<project>/graph.json (one pretty JSON document per project)
//!     ↕  decode / encode
//! KnowledgeGraph (deterministic in-memory projection)
//! ```

pub mod bootstrap;
pub mod config;
pub mod document;
pub mod edge;
pub mod graph;
pub mod mutation;
pub mod node;
pub mod project;
pub mod query;
pub mod request;
pub mod store;

pub use bootstrap::{
    CreatedProject, InitReport, ProjectError, create_project, init_memory_bank, list_projects,
};
pub use config::{ConfigError, DEFAULT_BASE_PATH, MemoryBankConfig};
pub use document::{
    DocumentError, GraphDocument, NodeRecord, SnapshotMetadata, decode, encode,
    read_document_from_path, write_document_to_path,
};
pub use edge::{Edge, EdgeAttributes};
pub use graph::{GraphError, KnowledgeGraph};
pub use mutation::{
    AddReport, DeleteReport, Diagnostic, DiagnosticKind, MutationError, UpdateReport, apply_add,
    apply_delete, apply_update, batch_add, batch_delete, batch_update,
};
pub use node::{EntityMetadata, Node, NodeData};
pub use project::{GRAPH_FILE_NAME, ProjectResolver, sanitize_project_name};
pub use query::{
    NodeView, OpenNodesResult, QueryError, QueryResult, evaluate_open_nodes, evaluate_query,
    evaluate_search, open_nodes, query, search,
};
pub use request::{
    BatchAddRequest, BatchDeleteRequest, BatchUpdateRequest, DEFAULT_QUERY_LIMIT,
    DEFAULT_SEARCH_LIMIT, Direction, EdgeDeleteInput, EdgeInput, Filter, FilterAttribute,
    GraphQuery, NodeInput, NodeUpdateInput, OpenNodesRequest, RequestError, SearchField,
    SearchRequest, Violation, validate_project_name,
};
pub use store::{GraphStore, LoadStatus, LoadedGraph, StoreError};
