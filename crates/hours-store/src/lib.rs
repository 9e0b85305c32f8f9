//! Persistence for the hours tracker.
//!
//! The stats store is kept as a JSON object keyed by root-relative path:
//!
//! ```json
//! {".": {"LastModified": 1700000300, "TotalWorked": 90},
//!  "./src/main.rs": {"LastModified": 1700000300, "TotalWorked": 90}}
//! ```
//!
//! Ignore rules are a JSON array read once at startup:
//!
//! ```json
//! [{"Pattern": "./keep.log", "IsNeg": true}, {"Pattern": "./*.log", "IsNeg": false}]
//! ```
//!
//! # Atomicity
//!
//! [`StateFile::save`] writes to a temporary file in the same directory and
//! renames it over the state file, so a crash mid-write leaves the previous
//! state intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use hours_core::{IgnoreRule, StatsStore};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Default name of the state file, relative to the repository root.
pub const DEFAULT_STATE_FILE: &str = "hours.json";

/// Default name of the ignore file, relative to the repository root.
pub const DEFAULT_IGNORE_FILE: &str = ".hoursignore.json";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode stats: {0}")]
    Encode(#[source] serde_json::Error),
}

/// The on-disk stats store.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the store. A missing file is an empty store.
    pub fn load(&self) -> Result<StatsStore, StoreError> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(StatsStore::new());
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads the store, starting empty if the file is unreadable or corrupt.
    pub fn load_or_default(&self) -> StatsStore {
        match self.load() {
            Ok(store) => {
                tracing::debug!(path = %self.path.display(), entries = store.len(), "loaded stats");
                store
            }
            Err(e) => {
                tracing::warn!(error = %e, "starting with empty stats");
                StatsStore::new()
            }
        }
    }

    /// Replaces the file with the encoded `store`.
    pub fn save(&self, store: &StatsStore) -> Result<(), StoreError> {
        let json = serde_json::to_vec(store).map_err(StoreError::Encode)?;
        let write_error = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
        tmp.write_all(&json).map_err(write_error)?;
        match_permissions(tmp.as_file(), &self.path).map_err(write_error)?;
        tmp.as_file().sync_all().map_err(write_error)?;
        tmp.persist(&self.path).map_err(|e| write_error(e.error))?;

        tracing::trace!(path = %self.path.display(), entries = store.len(), "saved stats");
        Ok(())
    }
}

/// Reads the ordered ignore rules. A missing file means no rules.
pub fn load_ignore_rules(path: &Path) -> Result<Vec<IgnoreRule>, StoreError> {
    let Some(content) = read_optional(path)? else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Gives the replacement file the permissions of the file it replaces, or
/// `0644` for a new one. Temporary files start out as `0600`.
#[cfg(unix)]
fn match_permissions(file: &fs::File, target: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::metadata(target)
        .map_or_else(|_| fs::Permissions::from_mode(0o644), |m| m.permissions());
    file.set_permissions(permissions)
}

#[cfg(not(unix))]
fn match_permissions(_file: &fs::File, _target: &Path) -> io::Result<()> {
    Ok(())
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
