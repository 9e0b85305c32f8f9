//! Per-path statistics and the values that flow through one aggregation pass.
//!
//! # Two kinds of seconds
//!
//! Modification times are wall-clock epoch seconds. `total_worked` is a
//! duration, but it is also reused as a synthetic timeline: a pass reports the
//! span of work it added as `[session_start, session_end]` on that timeline so
//! a directory can merge its children's spans without knowing how their
//! edits overlapped in real time. [`Timeline`] keeps those coordinates apart
//! from wall-clock values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of the repository root in a [`StatsStore`].
pub const ROOT_KEY: &str = ".";

/// Recorded statistics for one tracked file or directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStats {
    /// Newest modification time (epoch seconds) seen for this path.
    #[serde(rename = "LastModified", alias = "lastModified")]
    pub last_seen_mod_time: i64,

    /// Estimated seconds worked on this path and, for directories, on
    /// everything tracked beneath it. Never decreases.
    #[serde(rename = "TotalWorked", alias = "totalWorked")]
    pub total_worked: i64,
}

/// A coordinate on the `total_worked` timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeline(i64);

impl Timeline {
    /// Start bound used when nothing in a directory qualified this pass.
    pub const UNBOUNDED: Self = Self(i64::MAX);

    /// A point on the timeline expressed as a running worked total.
    pub const fn at(total_worked: i64) -> Self {
        Self(total_worked)
    }

    /// Places a wall-clock value on the timeline.
    ///
    /// Only the idle clamp does this: after a long gap the session start is
    /// taken to be shortly before the save itself.
    pub const fn from_wall_clock(epoch_secs: i64) -> Self {
        Self(epoch_secs)
    }

    pub const fn is_unbounded(self) -> bool {
        self.0 == i64::MAX
    }

    /// Width of `[start, self]`, zero when the span is empty.
    pub const fn width_since(self, start: Self) -> i64 {
        if self.0 <= start.0 {
            0
        } else {
            self.0.saturating_sub(start.0)
        }
    }
}

/// What one aggregation call reports to its parent. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalResult {
    /// Newest modification time seen anywhere in the subtree this pass.
    pub newest_mod_time: i64,
    pub session_start: Timeline,
    pub session_end: Timeline,
}

/// Mapping from root-relative path to recorded statistics.
///
/// Entries are created the first time a path is observed and are never
/// removed, even when the path disappears from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsStore {
    entries: BTreeMap<String, PathStats>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PathStats> {
        self.entries.get(key)
    }

    /// Stats recorded for `key`, or all zeroes when it has never been seen.
    pub fn get_or_zero(&self, key: &str) -> PathStats {
        self.entries.get(key).copied().unwrap_or_default()
    }

    /// Records new stats for `key`.
    ///
    /// `total_worked` never moves backwards: a smaller value than the one
    /// already recorded is raised to it.
    pub fn record(&mut self, key: &str, stats: PathStats) {
        match self.entries.get_mut(key) {
            Some(existing) => {
                existing.last_seen_mod_time = stats.last_seen_mod_time;
                existing.total_worked = existing.total_worked.max(stats.total_worked);
            }
            None => {
                self.entries.insert(key.to_string(), stats);
            }
        }
    }

    /// Stats of the repository root, if a pass has run.
    pub fn root(&self) -> Option<&PathStats> {
        self.get(ROOT_KEY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathStats)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, PathStats)> for StatsStore {
    fn from_iter<I: IntoIterator<Item = (String, PathStats)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Worked seconds split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedTime {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl WorkedTime {
    pub const fn from_secs(total: i64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for WorkedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hours, {} minutes, {} seconds",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_reads_as_zero() {
        let store = StatsStore::new();
        assert_eq!(store.get_or_zero("./nope"), PathStats::default());
        assert!(store.root().is_none());
    }

    #[test]
    fn test_record_never_lowers_total() {
        let mut store = StatsStore::new();
        store.record(
            "./a",
            PathStats {
                last_seen_mod_time: 10,
                total_worked: 100,
            },
        );
        store.record(
            "./a",
            PathStats {
                last_seen_mod_time: 5,
                total_worked: 40,
            },
        );

        let stats = store.get_or_zero("./a");
        assert_eq!(stats.last_seen_mod_time, 5);
        assert_eq!(stats.total_worked, 100);
    }

    #[test]
    fn test_timeline_width_never_negative() {
        assert_eq!(Timeline::at(70).width_since(Timeline::at(10)), 60);
        assert_eq!(Timeline::at(10).width_since(Timeline::at(70)), 0);
        assert_eq!(Timeline::UNBOUNDED.width_since(Timeline::UNBOUNDED), 0);
    }

    #[test]
    fn test_worked_time_split() {
        let worked = WorkedTime::from_secs(3 * 3600 + 25 * 60 + 7);
        assert_eq!(
            worked,
            WorkedTime {
                hours: 3,
                minutes: 25,
                seconds: 7
            }
        );
        assert_eq!(worked.to_string(), "3 hours, 25 minutes, 7 seconds");
    }

    #[test]
    fn test_path_stats_uses_legacy_field_names() {
        let json = serde_json::to_string(&PathStats {
            last_seen_mod_time: 1_700_000_000,
            total_worked: 42,
        })
        .unwrap();
        assert_eq!(json, r#"{"LastModified":1700000000,"TotalWorked":42}"#);

        let parsed: PathStats =
            serde_json::from_str(r#"{"lastModified":7,"totalWorked":3}"#).unwrap();
        assert_eq!(parsed.last_seen_mod_time, 7);
        assert_eq!(parsed.total_worked, 3);
    }
}
