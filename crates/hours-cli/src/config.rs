//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use hours_store::{DEFAULT_IGNORE_FILE, DEFAULT_STATE_FILE};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between sampling passes in `watch`.
    pub poll_interval_secs: u64,

    /// Stats file. Relative paths resolve against the repository root.
    pub state_file: PathBuf,

    /// Ignore rule file. Relative paths resolve against the repository root.
    pub ignore_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: 20,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            ignore_file: PathBuf::from(DEFAULT_IGNORE_FILE),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // HOURS_POLL_INTERVAL_SECS, HOURS_STATE_FILE, ...
        figment = figment.merge(Env::prefixed("HOURS_"));

        figment.extract()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn state_path(&self, root: &Path) -> PathBuf {
        root.join(&self.state_file)
    }

    pub fn ignore_path(&self, root: &Path) -> PathBuf {
        root.join(&self.ignore_file)
    }
}

/// Returns the platform-specific config directory for hours.
///
/// On Linux: `~/.config/hours`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hours"))
}
