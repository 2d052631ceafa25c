//! Thread-safe cross-repository accumulation.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::{LineByteCount, RepoContribution};

/// One completed repository's results, handed to [`Aggregate::merge`].
#[derive(Clone, Debug, Default)]
pub struct RepoOutcome {
    pub identifier: String,
    pub counts: HashMap<String, LineByteCount>,
    pub unique_file_count: usize,
    /// Commit hashes in walk order with their accumulated totals; empty in
    /// snapshot mode.
    pub commit_order: Vec<String>,
    pub commit_counts: HashMap<String, LineByteCount>,
}

#[derive(Debug, Default)]
struct AggregateState {
    totals: HashMap<String, LineByteCount>,
    breakdown: HashMap<String, Vec<RepoContribution>>,
    unique_files: usize,
    repos: Vec<RepoOutcome>,
}

/// Final merged results, plain data for rendering and reporting.
#[derive(Clone, Debug, Default)]
pub struct AggregateReport {
    pub totals: HashMap<String, LineByteCount>,
    pub breakdown: HashMap<String, Vec<RepoContribution>>,
    pub unique_files: usize,
    pub repos: Vec<RepoOutcome>,
}

/// Mutex-guarded accumulator shared by all workers.
///
/// `merge` is commutative and associative, so the final totals never depend
/// on worker completion order.
#[derive(Debug, Default)]
pub struct Aggregate {
    state: Mutex<AggregateState>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one repository's per-language counts into the shared totals,
    /// recording the contribution triplets for the breakdown report.
    pub fn merge(&self, outcome: RepoOutcome) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        for (lang, count) in &outcome.counts {
            *state.totals.entry(lang.clone()).or_default() += *count;
            state
                .breakdown
                .entry(lang.clone())
                .or_default()
                .push(RepoContribution {
                    repo: outcome.identifier.clone(),
                    lines: count.lines,
                    bytes: count.bytes,
                });
        }

        state.unique_files += outcome.unique_file_count;
        state.repos.push(outcome);
    }

    /// Extract the merged report once all workers are done.
    pub fn into_report(self) -> AggregateReport {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|e| e.into_inner());
        AggregateReport {
            totals: state.totals,
            breakdown: state.breakdown,
            unique_files: state.unique_files,
            repos: state.repos,
        }
    }
}
