//! Memory bank configuration loaded from an optional TOML file.

use crate::request::{DEFAULT_QUERY_LIMIT, DEFAULT_SEARCH_LIMIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_PATH: &str = "./memory-bank";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config at {path}: {message}")]
    Invalid { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryBankConfig {
    pub base_path: PathBuf,
    pub search_limit: usize,
    pub query_limit: usize,
}

impl Default for MemoryBankConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            search_limit: DEFAULT_SEARCH_LIMIT,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl MemoryBankConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: path.display().to_string(),
            source,
        })?;
        config.check(path)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `path` when given, otherwise defaults; then apply an explicit
    /// base path override (CLI flag or environment).
    pub fn resolve(
        path: Option<&Path>,
        base_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(base) = base_override {
            config.base_path = base;
        }
        Ok(config)
    }

    fn check(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::Invalid {
            path: path.display().to_string(),
            message: message.to_string(),
        };
        if self.base_path.as_os_str().is_empty() {
            return Err(invalid("base_path must not be empty"));
        }
        if self.search_limit == 0 {
            return Err(invalid("search_limit must be positive"));
        }
        if self.query_limit == 0 {
            return Err(invalid("query_limit must be positive"));
        }
        Ok(())
    }
}
