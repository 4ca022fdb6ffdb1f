//! Filesystem layout helpers for lokalise-mcp.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Result;

use crate::error::CoreError;

/// Environment variable that overrides the default root directory.
const ROOT_ENV_KEY: &str = "LOKALISE_MCP_ROOT";
const DEFAULT_ROOT_DIRNAME: &str = ".lokalise-mcp";

/// Descriptor for the on-disk directory structure.
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
    logs_dir: PathBuf,
}

impl Layout {
    /// Construct a new layout without touching the filesystem.
    pub fn new(root: PathBuf) -> Self {
        let logs_dir = root.join("logs");
        Self { root, logs_dir }
    }

    /// Ensure that all directories exist on disk.
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.root(), self.logs_dir()] {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|source| CoreError::CreateDirectory {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that stores process and tool-call logs.
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Default location of the optional TOML config file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Append-only JSON-lines audit log of tool calls.
    pub fn tool_log_path(&self) -> PathBuf {
        self.logs_dir.join("tools.log")
    }
}

/// Determine the default root directory for lokalise-mcp.
pub fn default_root() -> Result<PathBuf> {
    if let Ok(value) = env::var(ROOT_ENV_KEY) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }

    let home = user_home_dir().ok_or(CoreError::HomeDirectoryUnknown)?;
    Ok(home.join(DEFAULT_ROOT_DIRNAME))
}

/// Resolve a root override, expanding a leading `~`.
pub fn resolve_root(root_override: Option<PathBuf>) -> Result<PathBuf> {
    match root_override {
        Some(path) => expand_tilde(path),
        None => default_root(),
    }
}

fn expand_tilde(path: PathBuf) -> Result<PathBuf> {
    if let Some(str_path) = path.to_str() {
        if let Some(stripped) = str_path.strip_prefix('~') {
            let home = user_home_dir().ok_or(CoreError::HomeDirectoryUnknown)?;
            let stripped = stripped.trim_start_matches(['/', '\\']);
            if stripped.is_empty() {
                return Ok(home);
            }
            return Ok(home.join(stripped));
        }
    }
    Ok(path)
}

fn user_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    None
}
