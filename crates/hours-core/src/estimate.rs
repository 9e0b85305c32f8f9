//! Worked-time delta for a single file.

use crate::stats::{IntervalResult, PathStats, StatsStore, Timeline};

/// Gap between two observed saves beyond which the time in between is
/// treated as idle.
pub const IDLE_THRESHOLD_SECS: i64 = 10 * 60;

/// Work credited for a save that follows an idle gap.
pub const GRACE_SECS: i64 = 60;

/// Folds a file's current modification time into `store` and returns the
/// span of work it added.
///
/// A file seen for the first time contributes nothing: there is no earlier
/// sample to diff against. Otherwise the time since the last observed save
/// counts as work, up to [`IDLE_THRESHOLD_SECS`]; past that only the last
/// [`GRACE_SECS`] before the save are credited. An mtime that moved
/// backwards credits nothing.
pub fn estimate_leaf(key: &str, current_mod_time: i64, store: &mut StatsStore) -> IntervalResult {
    let (delta, start, previous_total) = match store.get(key) {
        None => (0, Timeline::at(0), 0),
        Some(prev) => {
            let raw_delta = current_mod_time.saturating_sub(prev.last_seen_mod_time);
            if raw_delta > IDLE_THRESHOLD_SECS {
                (
                    GRACE_SECS,
                    Timeline::from_wall_clock(current_mod_time.saturating_sub(GRACE_SECS)),
                    prev.total_worked,
                )
            } else {
                (
                    raw_delta.max(0),
                    Timeline::at(prev.total_worked),
                    prev.total_worked,
                )
            }
        }
    };

    let total_worked = previous_total.saturating_add(delta);
    store.record(
        key,
        PathStats {
            last_seen_mod_time: current_mod_time,
            total_worked,
        },
    );

    if delta > 0 {
        tracing::trace!(path = key, delta, total_worked, "file worked");
    }

    IntervalResult {
        newest_mod_time: current_mod_time,
        session_start: start,
        session_end: Timeline::at(total_worked),
    }
}
