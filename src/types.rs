//! # Common Types
//!
//! This module contains the common types used throughout the application for
//! representing per-language counts and accounting modes.

use std::ops::AddAssign;

use serde::Deserialize;

/// A (lines, bytes) pair.
///
/// Counts are signed because net accounting subtracts removals; a language's
/// running total can dip negative mid-walk when a selected commit deletes
/// code that an unselected commit added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineByteCount {
    pub lines: i64,
    pub bytes: i64,
}

impl LineByteCount {
    pub fn new(lines: i64, bytes: i64) -> Self {
        Self { lines, bytes }
    }
}

impl AddAssign for LineByteCount {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.bytes += other.bytes;
    }
}

/// How a commit's per-file delta is applied to the accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    /// Additions minus removals: tracks current code volume.
    #[default]
    Net,
    /// Additions plus removals: tracks total historical churn.
    Gross,
}

impl CountMode {
    /// Fold an (added, removed) pair into a single signed delta.
    pub fn apply(self, added: LineByteCount, removed: LineByteCount) -> LineByteCount {
        match self {
            CountMode::Net => {
                LineByteCount::new(added.lines - removed.lines, added.bytes - removed.bytes)
            }
            CountMode::Gross => {
                LineByteCount::new(added.lines + removed.lines, added.bytes + removed.bytes)
            }
        }
    }
}

/// Which accounting pass a repository gets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountingMode {
    /// Count the current checkout once, no history traversal.
    #[default]
    Snapshot,
    /// Walk the author-filtered commit history and accumulate diffs.
    History,
}

/// One repository's contribution to a language, kept for the breakdown
/// report independently of the summed totals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoContribution {
    pub repo: String,
    pub lines: i64,
    pub bytes: i64,
}
