//! Memory bank and project lifecycle: base directory setup, project
//! creation and listing.

use crate::graph::KnowledgeGraph;
use crate::project::sanitize_project_name;
use crate::request::{RequestError, validate_project_name};
use crate::store::{GraphStore, StoreError};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error(transparent)]
    Invalid(#[from] RequestError),

    #[error("project `{0}` already exists")]
    AlreadyExists(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn io_error(path: &Path, source: io::Error) -> ProjectError {
    ProjectError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub base_path: PathBuf,
    pub already_existed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProject {
    pub name: String,
    pub path: PathBuf,
    pub version: u64,
}

/// Create the base directory if missing.
pub fn init_memory_bank(base: &Path) -> Result<InitReport, ProjectError> {
    let already_existed = base.is_dir();
    if !already_existed {
        fs::create_dir_all(base).map_err(|source| io_error(base, source))?;
        info!(base = %base.display(), "memory bank initialized");
    }
    Ok(InitReport {
        base_path: base.to_path_buf(),
        already_existed,
    })
}

/// Create a project directory holding an empty graph document.
pub fn create_project(store: &GraphStore, name: &str) -> Result<CreatedProject, ProjectError> {
    validate_project_name(name)?;

    let sanitized = sanitize_project_name(name);
    if sanitized != name {
        info!(requested = name, sanitized = %sanitized, "project name sanitized");
    }
    let dir = store.resolver().project_dir(&sanitized);
    if dir.exists() {
        return Err(ProjectError::AlreadyExists(sanitized));
    }
    fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;

    let snapshot = store.save(&sanitized, &mut KnowledgeGraph::new())?;
    info!(project = %sanitized, path = %dir.display(), "project created");
    Ok(CreatedProject {
        name: sanitized,
        path: dir,
        version: snapshot.version,
    })
}

/// Project directory names under `base`, ascending.
pub fn list_projects(base: &Path) -> Result<Vec<String>, ProjectError> {
    if !base.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(base).map_err(|source| io_error(base, source))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| io_error(base, source))?;
        let is_dir = entry
            .file_type()
            .map_err(|source| io_error(&entry.path(), source))?
            .is_dir();
        if is_dir {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
