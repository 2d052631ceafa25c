//! The worker pool: fixed parallelism, shared queue, cooperative
//! single-shot cancellation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::analysis::repo::Repo;
use crate::analysis::{count_by_commit, count_snapshot};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::aggregate::{Aggregate, AggregateReport, RepoOutcome};
use crate::progress::{Progress, RepoProgress};
use crate::types::AccountingMode;

/// Idempotent one-shot cancellation: the first fault wins, later faults see
/// `trigger` return false and do not re-broadcast.
#[derive(Debug, Default)]
pub struct CancelOnce {
    triggered: AtomicBool,
    token: CancellationToken,
}

impl CancelOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the run; returns whether this call was the one that did it.
    pub fn trigger(&self) -> bool {
        let won = !self.triggered.swap(true, Ordering::SeqCst);
        if won {
            self.token.cancel();
        }
        won
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Everything a finished run hands back to the caller.
#[derive(Debug)]
pub struct RunReport {
    pub report: AggregateReport,
    /// True when any worker faulted; the run is reported failed regardless
    /// of how many repositories completed first.
    pub failed: bool,
}

/// Run the configured repositories through a pool of `config.parallelism()`
/// workers, merging per-language results into one report.
pub async fn run(config: Arc<Config>, progress: Arc<Progress>) -> RunReport {
    let queue: Arc<Mutex<VecDeque<String>>> =
        Arc::new(Mutex::new(config.repositories.iter().cloned().collect()));
    let aggregate = Arc::new(Aggregate::new());
    let cancel = Arc::new(CancelOnce::new());

    let workers = config.parallelism().max(1);
    info!(workers, repositories = config.repositories.len(), "starting worker pool");

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let config = Arc::clone(&config);
        let queue = Arc::clone(&queue);
        let aggregate = Arc::clone(&aggregate);
        let cancel = Arc::clone(&cancel);
        let progress = Arc::clone(&progress);

        handles.push(spawn_blocking(move || {
            worker_loop(worker_id, &config, &queue, &aggregate, &cancel, &progress)
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            // A panicking worker is a fault like any other.
            error!(error = %e, "worker task panicked");
            cancel.trigger();
        }
    }

    let failed = cancel.is_cancelled();
    // Every worker clone was dropped when its handle resolved above.
    let report = Arc::try_unwrap(aggregate)
        .expect("aggregate still shared after all workers joined")
        .into_report();

    RunReport { report, failed }
}

/// One worker: pull identifiers until the queue is empty or cancellation is
/// observed; a fault stops this worker after the usual boundary steps.
fn worker_loop(
    worker_id: usize,
    config: &Config,
    queue: &Mutex<VecDeque<String>>,
    aggregate: &Aggregate,
    cancel: &CancelOnce,
    progress: &Progress,
) {
    loop {
        // Cooperative check, only at the dequeue boundary: a worker
        // mid-repository always finishes (or fails) what it started.
        if cancel.is_cancelled() {
            debug!(worker = worker_id, "cancellation observed, exiting");
            return;
        }

        let Some(repo_id) = queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front() else {
            debug!(worker = worker_id, "queue exhausted");
            return;
        };

        info!(worker = worker_id, repo = repo_id, "processing repository");
        let bar = progress.repo_bar(&repo_id);

        match process_repo(config, &repo_id, &bar) {
            Ok(Some(outcome)) => {
                bar.finish("Finished");
                aggregate.merge(outcome);
            }
            Ok(None) => {
                bar.finish("Finished (empty repository)");
            }
            Err(e) => {
                error!(worker = worker_id, repo = repo_id, error = %e, "repository failed");
                bar.fail(format!("Failed: {e}"));
                if cancel.trigger() {
                    info!(worker = worker_id, "cancellation triggered");
                }
                return;
            }
        }
    }
}

/// Process a single repository end-to-end. `Ok(None)` means an empty
/// repository, tolerated with zero counts. On an accounting error the
/// original branch is restored best-effort before the error propagates to
/// the worker's fault boundary.
fn process_repo(config: &Config, repo_id: &str, bar: &RepoProgress) -> Result<Option<RepoOutcome>> {
    bar.update("Provisioning repository", 0.0);
    let mut repo = Repo::provision(config, repo_id)?;

    if repo.is_empty() {
        info!(repo = repo_id, "repository has no commits, skipping");
        return Ok(None);
    }

    let counts = match config.mode {
        AccountingMode::History => count_by_commit(&mut repo, config, bar),
        AccountingMode::Snapshot => count_snapshot(&mut repo, config, bar),
    };

    let counts = match counts {
        Ok(counts) => counts,
        Err(e) => {
            let branch = repo.latest_branch.clone();
            debug!(repo = repo_id, branch, "reverting to original branch");
            let _ = repo.checkout_branch(&branch);
            return Err(e);
        }
    };

    Ok(Some(RepoOutcome {
        identifier: repo.identifier.clone(),
        counts,
        unique_file_count: repo.unique_files().len(),
        commit_order: repo.commit_order.clone(),
        commit_counts: repo.commit_counts.clone(),
    }))
}
