//! Recursive aggregation of worked time over a directory tree.
//!
//! Each directory merges the spans its children report into one span on the
//! `total_worked` timeline and adds that span's width to its own total.
//! Only children that changed since the directory was last aggregated take
//! part:
//!
//! - a child whose newest mtime is at or after the directory's last seen
//!   mtime can lower the span start;
//! - a child whose newest mtime is strictly after it can raise the span end.
//!
//! When nothing qualifies the span collapses to zero width, so an untouched
//! directory keeps its total.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, DirEntry};
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::estimate::estimate_leaf;
use crate::ignore::IgnoreRules;
use crate::stats::{IntervalResult, PathStats, ROOT_KEY, StatsStore, Timeline};

/// Version-control metadata directories that are never tracked.
const VCS_DIRS: &[&str] = &[".git"];

/// Why an entry was skipped during a walk.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("failed to list {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read an entry of {path}: {source}")]
    Entry {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read metadata of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file name is not valid UTF-8: {name:?}")]
    NonUtf8Name { name: OsString },
}

/// Walks a repository and folds its file modification times into a
/// [`StatsStore`].
///
/// Store keys are root-relative: `.` for the root, `./src/main.rs` below it.
/// Ignore rules are matched against those keys.
#[derive(Debug)]
pub struct TreeAggregator<'a> {
    root: PathBuf,
    rules: &'a IgnoreRules,
    excluded: BTreeSet<String>,
}

impl<'a> TreeAggregator<'a> {
    pub fn new(root: impl Into<PathBuf>, rules: &'a IgnoreRules) -> Self {
        Self {
            root: root.into(),
            rules,
            excluded: BTreeSet::new(),
        }
    }

    /// Never tracks `key`, whatever the ignore rules say.
    #[must_use]
    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.excluded.insert(key.into());
        self
    }

    /// Runs one pass over the whole repository.
    pub fn run(&self, store: &mut StatsStore) -> IntervalResult {
        let result = self.aggregate(ROOT_KEY, store);
        tracing::debug!(
            root = %self.root.display(),
            total_worked = store.get_or_zero(ROOT_KEY).total_worked,
            "aggregation pass complete"
        );
        result
    }

    /// Aggregates the directory at `key` and everything tracked beneath it.
    ///
    /// A directory that cannot be listed is treated as empty.
    pub fn aggregate(&self, key: &str, store: &mut StatsStore) -> IntervalResult {
        let children = self.visit_children(key, store).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "directory skipped");
            Vec::new()
        });
        merge_children(key, &children, store)
    }

    fn visit_children(
        &self,
        key: &str,
        store: &mut StatsStore,
    ) -> Result<Vec<IntervalResult>, WalkError> {
        let dir = self.fs_path(key);
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|source| WalkError::ReadDir {
            path: dir.clone(),
            source,
        })? {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(source) => {
                    let e = WalkError::Entry {
                        path: dir.clone(),
                        source,
                    };
                    tracing::warn!(error = %e, "entry skipped");
                }
            }
        }
        entries.sort_by_key(DirEntry::file_name);

        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.visit_entry(key, entry, store) {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "entry skipped"),
            }
        }
        Ok(results)
    }

    fn visit_entry(
        &self,
        parent_key: &str,
        entry: &DirEntry,
        store: &mut StatsStore,
    ) -> Result<Option<IntervalResult>, WalkError> {
        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| WalkError::NonUtf8Name { name })?;
        let key = format!("{parent_key}/{name}");
        if self.is_excluded(&name, &key) {
            tracing::trace!(path = %key, "excluded");
            return Ok(None);
        }

        let metadata_error = |source| WalkError::Metadata {
            path: entry.path(),
            source,
        };
        // Symlinks are sampled as themselves, never followed.
        let file_type = entry.file_type().map_err(metadata_error)?;
        if file_type.is_dir() {
            return Ok(Some(self.aggregate(&key, store)));
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(metadata_error)?;
        Ok(Some(estimate_leaf(&key, epoch_secs(modified), store)))
    }

    fn is_excluded(&self, name: &str, key: &str) -> bool {
        VCS_DIRS.contains(&name) || self.excluded.contains(key) || self.rules.is_ignored(key)
    }

    fn fs_path(&self, key: &str) -> PathBuf {
        key.strip_prefix("./")
            .map_or_else(|| self.root.clone(), |relative| self.root.join(relative))
    }
}

/// Merges child spans into the directory at `key` and records the result.
fn merge_children(key: &str, children: &[IntervalResult], store: &mut StatsStore) -> IntervalResult {
    let prev = store.get_or_zero(key);

    let mut newest = 0;
    let mut earliest_start = Timeline::UNBOUNDED;
    let mut latest_end = Timeline::at(0);
    for child in children {
        newest = newest.max(child.newest_mod_time);
        if child.newest_mod_time >= prev.last_seen_mod_time {
            earliest_start = earliest_start.min(child.session_start);
        }
        if child.newest_mod_time > prev.last_seen_mod_time {
            latest_end = latest_end.max(child.session_end);
        }
    }
    if latest_end < earliest_start {
        latest_end = earliest_start;
    }

    let total_worked = prev
        .total_worked
        .saturating_add(latest_end.width_since(earliest_start));
    store.record(
        key,
        PathStats {
            last_seen_mod_time: newest,
            total_worked,
        },
    );

    IntervalResult {
        newest_mod_time: newest,
        session_start: earliest_start,
        session_end: latest_end,
    }
}

/// Whole epoch seconds, rounded down.
fn epoch_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(e) => {
            let before = e.duration();
            let secs = before.as_secs() + u64::from(before.subsec_nanos() > 0);
            i64::try_from(secs).map_or(i64::MIN, |s| -s)
        }
    }
}
