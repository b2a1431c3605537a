//! Project name resolution: sanitized identifiers and graph document paths.

use std::path::PathBuf;

/// File name of the graph document inside a project directory.
pub const GRAPH_FILE_NAME: &str = "graph.json";

const RESERVED_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace every filesystem-reserved character with `_`.
///
/// Idempotent: the output never contains a reserved character.
pub fn sanitize_project_name(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Maps project names onto directories below one base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectResolver {
    base: PathBuf,
}

impl ProjectResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// `<base>/<sanitized-name>`
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.base.join(sanitize_project_name(project))
    }

    /// `<base>/<sanitized-name>/graph.json`
    pub fn graph_path(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(GRAPH_FILE_NAME)
    }
}
