//! Core logic for estimating time worked on a repository.
//!
//! This crate contains:
//! - Stats: per-path records and the span values passed between directories
//! - Ignore rules: ordered glob patterns with short-circuiting negation
//! - Estimation: the worked-time delta of a single file
//! - Aggregation: the recursive merge of deltas up to the repository root

mod aggregate;
mod estimate;
pub mod ignore;
pub mod stats;

pub use aggregate::{TreeAggregator, WalkError};
pub use estimate::{GRACE_SECS, IDLE_THRESHOLD_SECS, estimate_leaf};
pub use ignore::{IgnoreRule, IgnoreRules, is_ignored};
pub use stats::{IntervalResult, PathStats, ROOT_KEY, StatsStore, Timeline, WorkedTime};
