//! Commit-history accounting: the core walk over the selection sequence.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::analysis::classify;
use crate::analysis::diff::parse_patch;
use crate::analysis::git::run_git;
use crate::analysis::repo::Repo;
use crate::config::Config;
use crate::error::Result;
use crate::progress::RepoProgress;
use crate::types::LineByteCount;

/// Diff baseline for root commits: git's well-known empty tree.
pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

fn force_skipped(config: &Config, hash: &str) -> bool {
    config.skip_commits.iter().any(|prefix| hash.starts_with(prefix))
}

/// Walk the repository's selected commits in timestamp order and accumulate
/// per-language deltas (net or gross per the configured count mode).
///
/// Checkout or diff failures abort the repository: its checkout position is
/// no longer trustworthy for later commits. Per-file classification problems
/// only ever skip that file. The latest branch is restored after the walk.
pub fn count_by_commit(
    repo: &mut Repo,
    config: &Config,
    progress: &RepoProgress,
) -> Result<HashMap<String, LineByteCount>> {
    let mut totals: HashMap<String, LineByteCount> = HashMap::new();

    let commits = repo.select_commits(config)?;
    let total = commits.len() as f64;

    for (i, commit) in commits.iter().enumerate() {
        if force_skipped(config, &commit.hash) {
            info!(repo = repo.identifier, commit = commit.hash, "skipping commit");
            continue;
        }

        progress.update(format!("Checking out commit {}", commit.hash), i as f64 / total);
        info!(repo = repo.identifier, commit = commit.hash, "checking out commit");
        repo.checkout_commit(commit)?;

        let base = if commit.root {
            EMPTY_TREE.to_string()
        } else {
            format!("{}^", commit.hash)
        };
        let patch = run_git(&repo.path, &["diff", &base, &commit.hash])?;

        let mut commit_total = LineByteCount::default();

        for diff in parse_patch(&repo.identifier, &patch, config.min_diff_line_len()) {
            if repo.should_skip(config, &diff.path) {
                continue;
            }

            let langs = repo.languages(&diff.path);
            if langs.len() > 1 {
                warn!(
                    repo = repo.identifier,
                    path = diff.path,
                    candidates = ?langs,
                    "multiple languages detected, using the first"
                );
            }
            let lang = langs
                .into_iter()
                .next()
                .unwrap_or_else(|| "Unknown".to_string());

            if !classify::should_skip_lang(&lang, &config.ignore.langs) {
                repo.insert_unique_file(&diff.path);
            }

            let delta = config.count.apply(diff.added, diff.removed);
            *totals.entry(lang).or_default() += delta;
            commit_total += delta;
        }

        repo.record_commit_count(&commit.hash, commit_total);
    }

    let branch = repo.latest_branch.clone();
    progress.update(format!("Checking out branch {branch}"), 0.99);
    info!(repo = repo.identifier, branch, "restoring branch");
    repo.checkout_branch(&branch)?;

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::repo::CheckoutState;
    use crate::testutil::{commit_file, init_fixture_repo, test_config};
    use crate::types::CountMode;
    use pretty_assertions::assert_eq;

    /// C1 adds a.py (10 lines); C2 adds b.go (5 lines) and modifies a.py
    /// with +2/-1 lines. The scenario from which net/gross totals follow.
    fn scenario_repo() -> (tempfile::TempDir, Config) {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");

        let ten: String = (1..=10).map(|i| format!("line{i}\n")).collect();
        commit_file(&fixture, "a.py", &ten, "c1", 1_700_000_000);

        let eleven: String = (1..=9)
            .map(|i| format!("line{i}\n"))
            .chain(["alpha\n".to_string(), "beta\n".to_string()])
            .collect();
        commit_file(&fixture, "a.py", &eleven, "c2a", 1_700_000_100);
        (dir, config)
    }

    #[test]
    fn test_net_and_gross_scenario() {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");

        let ten: String = (1..=10).map(|i| format!("line{i}\n")).collect();
        commit_file(&fixture, "a.py", &ten, "c1", 1_700_000_000);

        // One commit touching both files: a.py gets +2/-1, b.go is new.
        let eleven: String = (1..=9)
            .map(|i| format!("line{i}\n"))
            .chain(["alpha\n".to_string(), "beta\n".to_string()])
            .collect();
        let five: String = (1..=5).map(|i| format!("go{i}\n")).collect();
        crate::testutil::commit_files(
            &fixture,
            &[("a.py", &eleven), ("b.go", &five)],
            "c2",
            1_700_000_100,
        );

        let mut net_config = config.clone();
        net_config.count = CountMode::Net;
        let mut repo = Repo::open(&net_config, "owner/name").unwrap();
        let totals = count_by_commit(&mut repo, &net_config, &RepoProgress::noop()).unwrap();
        assert_eq!(totals["Python"].lines, 11);
        assert_eq!(totals["Go"].lines, 5);

        let mut gross_config = config;
        gross_config.count = CountMode::Gross;
        let mut repo = Repo::open(&gross_config, "owner/name").unwrap();
        let totals = count_by_commit(&mut repo, &gross_config, &RepoProgress::noop()).unwrap();
        assert_eq!(totals["Python"].lines, 13);
        assert_eq!(totals["Go"].lines, 5);
    }

    #[test]
    fn test_root_commit_counts_as_pure_additions() {
        let (_dir, config) = scenario_repo();
        let mut repo = Repo::open(&config, "owner/name").unwrap();

        let commits = repo.select_commits(&config).unwrap();
        let root = commits.iter().next().unwrap();
        assert!(root.root);

        let totals = count_by_commit(&mut repo, &config, &RepoProgress::noop()).unwrap();
        // Root commit never errors on a missing parent; its 10 lines all
        // land as additions (plus the later +2/-1).
        assert_eq!(totals["Python"].lines, 11);
    }

    #[test]
    fn test_branch_restored_and_files_refreshed() {
        let (_dir, config) = scenario_repo();
        let mut repo = Repo::open(&config, "owner/name").unwrap();

        count_by_commit(&mut repo, &config, &RepoProgress::noop()).unwrap();
        assert_eq!(repo.state, CheckoutState::Branch("main".to_string()));
        assert_eq!(repo.files, vec!["a.py".to_string()]);
    }

    #[test]
    fn test_force_skip_commit_prefix() {
        let (_dir, mut config) = scenario_repo();
        let repo = Repo::open(&config, "owner/name").unwrap();

        let commits = repo.select_commits(&config).unwrap();
        let second = commits.iter().nth(1).unwrap().clone();
        config.skip_commits = vec![second.hash.clone()];

        let mut repo = Repo::open(&config, "owner/name").unwrap();
        let totals = count_by_commit(&mut repo, &config, &RepoProgress::noop()).unwrap();
        assert_eq!(totals["Python"].lines, 10);
    }

    #[test]
    fn test_touched_files_and_commit_counts_recorded() {
        let (_dir, config) = scenario_repo();
        let mut repo = Repo::open(&config, "owner/name").unwrap();

        count_by_commit(&mut repo, &config, &RepoProgress::noop()).unwrap();
        assert_eq!(repo.unique_files(), &["a.py".to_string()]);
        assert_eq!(repo.commit_order.len(), 2);

        let first_total = repo.commit_counts[&repo.commit_order[0]];
        assert_eq!(first_total.lines, 10);
        let second_total = repo.commit_counts[&repo.commit_order[1]];
        assert_eq!(second_total.lines, 1);
    }

    #[test]
    fn test_ignored_vendored_file_contributes_nothing() {
        let (dir, mut config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");
        commit_file(&fixture, "vendor/lib.js", "var x = 1;\n", "vendored", 1_700_000_000);
        commit_file(&fixture, "a.py", "print('hi')\n", "real", 1_700_000_100);
        config.ignore.vendor = true;

        let mut repo = Repo::open(&config, "owner/name").unwrap();
        let totals = count_by_commit(&mut repo, &config, &RepoProgress::noop()).unwrap();

        assert!(!totals.contains_key("JavaScript"));
        assert_eq!(totals["Python"].lines, 1);
        assert_eq!(repo.unique_files(), &["a.py".to_string()]);
    }

    #[test]
    fn test_unknown_language_bucket() {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");
        commit_file(&fixture, "data.xyz", "opaque\n", "data", 1_700_000_000);

        let mut repo = Repo::open(&config, "owner/name").unwrap();
        let totals = count_by_commit(&mut repo, &config, &RepoProgress::noop()).unwrap();

        assert_eq!(totals["Unknown"].lines, 1);
        // Unknown never enters the touched-files set.
        assert!(repo.unique_files().is_empty());
    }
}
