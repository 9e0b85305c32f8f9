//! The tracked repository: its root, rules and state file.

use std::fs::{self, File, OpenOptions};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use hours_core::{IgnoreRules, StatsStore, TreeAggregator};
use hours_store::{StateFile, load_ignore_rules};

use crate::Config;

/// Everything a sampling pass needs, resolved once at startup.
#[derive(Debug)]
pub struct Repo {
    root: PathBuf,
    state: StateFile,
    lock_path: PathBuf,
    rules: IgnoreRules,
    /// Store keys of the state and lock files when they live in the tree.
    own_keys: Vec<String>,
}

impl Repo {
    /// Resolves paths from `config` and reads the ignore rules.
    ///
    /// A malformed ignore file is logged and treated as empty.
    pub fn open(root: &Path, config: &Config) -> Self {
        let ignore_path = config.ignore_path(root);
        let rules = match load_ignore_rules(&ignore_path) {
            Ok(rules) => {
                tracing::debug!(path = %ignore_path.display(), count = rules.len(), "loaded ignore rules");
                IgnoreRules::new(&rules)
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring nothing");
                IgnoreRules::empty()
            }
        };

        let state_path = config.state_path(root);
        let lock_path = state_path.with_extension("lock");
        let canonical_root = resolve(root);
        let own_keys = [&state_path, &lock_path]
            .into_iter()
            .filter_map(|path| store_key(&canonical_root, &resolve(path)))
            .collect();

        Self {
            root: root.to_path_buf(),
            lock_path,
            state: StateFile::new(state_path),
            rules,
            own_keys,
        }
    }

    pub fn state(&self) -> &StateFile {
        &self.state
    }

    /// Loads the persisted stats, or an empty store if there are none.
    pub fn load_store(&self) -> StatsStore {
        self.state.load_or_default()
    }

    /// Takes the exclusive tracking lock for this repository.
    ///
    /// The lock is held until the returned file is dropped.
    pub fn lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .with_context(|| format!("failed to open {}", self.lock_path.display()))?;
        file.try_lock_exclusive().with_context(|| {
            format!(
                "another hours process is tracking {} (lock: {})",
                self.root.display(),
                self.lock_path.display()
            )
        })?;
        Ok(file)
    }

    /// Runs one aggregation pass over the repository and saves the result.
    pub fn sample(&self, store: &mut StatsStore) -> Result<()> {
        let mut aggregator = TreeAggregator::new(&self.root, &self.rules);
        for key in &self.own_keys {
            aggregator = aggregator.exclude(key.as_str());
        }

        aggregator.run(store);
        self.state
            .save(store)
            .with_context(|| format!("failed to save {}", self.state.path().display()))
    }
}

/// Absolute, symlink-free form of `path`.
///
/// A file that does not exist yet is resolved through its parent directory.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(parent), Some(name)) => parent.join(name),
        _ => path.to_path_buf(),
    }
}

/// Store key of `path` when it lies under `root`, e.g. `./hours.json`.
fn store_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut key = String::from(".");
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                key.push('/');
                key.push_str(name.to_str()?);
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(key)
}
