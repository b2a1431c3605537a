//! Whole-document graph storage for one base directory.
//!
//! Loading is fail-open: a missing or unreadable document yields an empty
//! graph, and the outcome says which of the two happened. Saving is
//! fail-closed: any I/O failure is returned to the caller.

use crate::document::{
    DocumentError, SnapshotMetadata, decode, encode, read_document_from_path,
    write_document_to_path,
};
use crate::graph::KnowledgeGraph;
use crate::project::ProjectResolver;
use chrono::Utc;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How a load produced its graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No document on disk yet.
    Missing,
    /// Document read and decoded.
    Loaded,
    /// Document exists but could not be read or decoded; graph is empty.
    Corrupt { reason: String },
}

impl LoadStatus {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Why the stored document was unreadable, if it was.
    pub fn corrupt_reason(&self) -> Option<&str> {
        match self {
            Self::Corrupt { reason } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: KnowledgeGraph,
    pub status: LoadStatus,
}

/// Errors raised while persisting a graph.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to save graph for project `{project}`: {source}")]
    Save {
        project: String,
        #[source]
        source: DocumentError,
    },

    #[error("failed to quarantine corrupt document {path}: {message}")]
    Quarantine { path: String, message: String },

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },
}

impl StoreError {
    pub(crate) fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Loads and saves project graph documents below a base directory.
#[derive(Debug, Clone)]
pub struct GraphStore {
    resolver: ProjectResolver,
}

impl GraphStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            resolver: ProjectResolver::new(base),
        }
    }

    pub fn resolver(&self) -> &ProjectResolver {
        &self.resolver
    }

    pub fn graph_path(&self, project: &str) -> PathBuf {
        self.resolver.graph_path(project)
    }

    /// Load a project graph. Never fails.
    pub fn load(&self, project: &str) -> LoadedGraph {
        let path = self.graph_path(project);
        if !path.exists() {
            debug!(project, path = %path.display(), "no graph document; starting empty");
            return LoadedGraph {
                graph: KnowledgeGraph::new(),
                status: LoadStatus::Missing,
            };
        }

        match read_document_from_path(&path).and_then(decode) {
            Ok(graph) => {
                debug!(
                    project,
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    version = graph.document_version(),
                    "graph loaded"
                );
                LoadedGraph {
                    graph,
                    status: LoadStatus::Loaded,
                }
            }
            Err(err) => {
                warn!(
                    project,
                    path = %path.display(),
                    error = %err,
                    "graph document unreadable; continuing with an empty graph"
                );
                LoadedGraph {
                    graph: KnowledgeGraph::new(),
                    status: LoadStatus::Corrupt {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    /// Encode and atomically write a project graph.
    ///
    /// On success the graph's document version advances to the saved one.
    pub fn save(
        &self,
        project: &str,
        graph: &mut KnowledgeGraph,
    ) -> Result<SnapshotMetadata, StoreError> {
        let path = self.graph_path(project);
        let document = encode(graph, Utc::now());
        let metadata = document
            .metadata
            .clone()
            .ok_or_else(|| StoreError::io(&path, "encoded document carries no metadata"))?;

        write_document_to_path(&path, &document).map_err(|source| StoreError::Save {
            project: project.to_string(),
            source,
        })?;
        graph.set_document_version(metadata.version);

        info!(
            project,
            nodes = metadata.node_count,
            edges = metadata.edge_count,
            version = metadata.version,
            "graph saved"
        );
        Ok(metadata)
    }

    /// Move a corrupt document aside so the next save cannot overwrite it.
    ///
    /// Returns the quarantine path, or `None` when there was nothing to move.
    pub fn quarantine_corrupt(&self, project: &str) -> Result<Option<PathBuf>, StoreError> {
        let path = self.graph_path(project);
        if !path.exists() {
            return Ok(None);
        }

        let mut target: OsString = path.as_os_str().to_os_string();
        target.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.9fZ")));
        let target = PathBuf::from(target);

        fs::rename(&path, &target).map_err(|e| StoreError::Quarantine {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        warn!(
            project,
            quarantined = %target.display(),
            "corrupt graph document moved aside"
        );
        Ok(Some(target))
    }

    /// Run one load -> mutate -> save cycle.
    ///
    /// The mutator sees the load status so it can report recovery. A corrupt
    /// document is quarantined before the save replaces it.
    pub fn mutate<T, F>(
        &self,
        project: &str,
        mutator: F,
    ) -> Result<(T, SnapshotMetadata), StoreError>
    where
        F: FnOnce(&mut KnowledgeGraph, &LoadStatus, Option<&Path>) -> T,
    {
        let LoadedGraph { mut graph, status } = self.load(project);
        let quarantined = if status.is_corrupt() {
            self.quarantine_corrupt(project)?
        } else {
            None
        };

        let value = mutator(&mut graph, &status, quarantined.as_deref());
        let metadata = self.save(project, &mut graph)?;
        Ok((value, metadata))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::node::Node;
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) struct TempDirGuard {
        path: PathBuf,
    }

    impl TempDirGuard {
        pub(crate) fn new(prefix: &str) -> Self {
            let unique = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock should be after unix epoch")
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "membank-graph-{prefix}-{}-{unique}",
                std::process::id()
            ));
            fs::create_dir_all(&path).expect("temp dir should be created");
            Self { path }
        }

        pub(crate) fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TempDirGuard {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn load_missing_document_is_empty() {
        let tmp = TempDirGuard::new("missing");
        let store = GraphStore::new(tmp.path());

        let loaded = store.load("demo");
        assert!(loaded.graph.is_empty());
        assert_eq!(loaded.status, LoadStatus::Missing);
    }

    #[test]
    fn load_corrupt_document_is_empty_and_flagged() {
        let tmp = TempDirGuard::new("corrupt");
        let store = GraphStore::new(tmp.path());
        let path = store.graph_path("demo");
        fs::create_dir_all(path.parent().expect("parent")).expect("project dir");
        fs::write(&path, "{ not json").expect("fixture should write");

        let loaded = store.load("demo");
        assert!(loaded.graph.is_empty());
        assert!(loaded.status.is_corrupt());
    }

    #[test]
    fn save_creates_directory_and_counts_versions() {
        let tmp = TempDirGuard::new("save");
        let store = GraphStore::new(tmp.path());

        let mut graph = KnowledgeGraph::new();
        graph
            .insert_node(Node::new("a", "T", "L", None, Utc::now()))
            .expect("insert");
        let first = store.save("demo", &mut graph).expect("first save");
        assert_eq!(first.version, 1);
        assert_eq!(first.node_count, 1);

        let mut reloaded = store.load("demo").graph;
        assert_eq!(reloaded.document_version(), 1);
        let second = store.save("demo", &mut reloaded).expect("second save");
        assert_eq!(second.version, 2);
    }

    #[test]
    fn save_fails_closed_when_directory_cannot_be_created() {
        let tmp = TempDirGuard::new("blocked");
        // A regular file where the project directory should be.
        fs::write(tmp.path().join("demo"), "occupied").expect("blocker should write");
        let store = GraphStore::new(tmp.path());

        let err = store
            .save("demo", &mut KnowledgeGraph::new())
            .expect_err("save must fail");
        assert!(matches!(err, StoreError::Save { ref project, .. } if project == "demo"));
    }

    #[test]
    fn mutate_quarantines_corrupt_document_before_saving() {
        let tmp = TempDirGuard::new("quarantine");
        let store = GraphStore::new(tmp.path());
        let path = store.graph_path("demo");
        fs::create_dir_all(path.parent().expect("parent")).expect("project dir");
        fs::write(&path, "[1, 2").expect("fixture should write");

        let (moved, meta) = store
            .mutate("demo", |graph, status, quarantined| {
                assert!(status.is_corrupt());
                graph
                    .insert_node(Node::new("fresh", "T", "L", None, Utc::now()))
                    .expect("insert");
                quarantined.map(Path::to_path_buf)
            })
            .expect("mutate should save");

        let moved = moved.expect("corrupt file should be quarantined");
        assert_eq!(fs::read_to_string(&moved).expect("kept"), "[1, 2");
        assert_eq!(meta.node_count, 1);
        assert!(store.load("demo").graph.has_node("fresh"));
    }
}
