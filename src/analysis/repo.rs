//! Repository state, provisioning, and the checkout state machine.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::analysis::cache::ClassifyCache;
use crate::analysis::classify;
use crate::analysis::commit::{Commit, CommitSequence};
use crate::analysis::git::{run_git, run_git_global, stderr_contains};
use crate::config::Config;
use crate::error::Result;
use crate::types::LineByteCount;

/// Log format used everywhere a commit line is parsed: abbreviated hash,
/// Unix timestamp, parent hashes (whose absence marks a root commit).
const LOG_FORMAT: &str = "--pretty=format:%h %ct %p";

/// Where the working copy currently points.
///
/// Transitions happen only through the checkout methods, and both refresh
/// the tracked file list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutState {
    Branch(String),
    Commit(String),
}

/// One repository's processing state, owned exclusively by the worker
/// currently processing it.
pub struct Repo {
    pub identifier: String,
    pub path: PathBuf,
    /// Compiled `linguist-vendored` globs from the repo's `.gitattributes`.
    vendored_filters: Vec<Regex>,
    /// Files tracked at the current checkout position.
    pub files: Vec<String>,
    /// Sorted set of files touched across the walked history.
    unique_files: Vec<String>,
    pub cache: ClassifyCache,
    pub state: CheckoutState,
    /// Branch recorded at provisioning time, restored after the walk.
    pub latest_branch: String,
    /// Most recent commit on the latest branch; `None` for empty repos.
    pub latest_commit: Option<Commit>,
    /// Per-commit totals in walk order, for the breakdown report.
    pub commit_counts: HashMap<String, LineByteCount>,
    pub commit_order: Vec<String>,
}

impl Repo {
    /// Guarantee a working copy exists and is up to date, then open it.
    ///
    /// A missing path is cloned from `<remote_base><identifier>.git`; an
    /// existing one is fetched and hard-reset to its origin branch. A fetch
    /// failing with "no such ref was fetched" means the remote is empty,
    /// which is tolerated: the repository opens with no latest commit and
    /// reports zero counts.
    pub fn provision(config: &Config, identifier: &str) -> Result<Self> {
        let path = config.repo_path(identifier);

        if !path.exists() {
            let url = format!("{}{}.git", config.remote_base, identifier);
            info!(repo = identifier, %url, "cloning repository");
            run_git_global(&["clone", &url, &path.to_string_lossy()])?;
        } else {
            info!(repo = identifier, path = %path.display(), "updating repository");
            match run_git(&path, &["fetch", "origin"]) {
                Ok(_) => {
                    let branch = current_branch(&path)?;
                    if !branch.is_empty() {
                        run_git(&path, &["reset", "--hard", &format!("origin/{branch}")])?;
                    }
                }
                Err(e) if stderr_contains(&e, "no such ref was fetched") => {
                    info!(repo = identifier, "remote repository is empty");
                }
                Err(e) => return Err(e),
            }
        }

        let repo = Self::open(config, identifier)?;
        info!(repo = identifier, path = %repo.path.display(), "initialized repository");
        Ok(repo)
    }

    /// Open an existing working copy without touching the network.
    pub fn open(config: &Config, identifier: &str) -> Result<Self> {
        let path = config.repo_path(identifier);

        let branch = current_branch(&path)?;
        let latest_commit = latest_commit(&path)?;

        let mut repo = Self {
            identifier: identifier.to_string(),
            vendored_filters: load_vendored_filters(&path),
            files: Vec::new(),
            unique_files: Vec::new(),
            cache: ClassifyCache::new(),
            state: CheckoutState::Branch(branch.clone()),
            latest_branch: branch,
            latest_commit,
            commit_counts: HashMap::new(),
            commit_order: Vec::new(),
            path,
        };
        repo.update_files()?;

        Ok(repo)
    }

    /// No commits reachable: tolerated, the repository contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.latest_commit.is_none()
    }

    /// Refresh the tracked file list from `git ls-files`.
    pub fn update_files(&mut self) -> Result<()> {
        let stdout = run_git(&self.path, &["ls-files"])?;
        self.files = stdout
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Ok(())
    }

    /// Check out a branch; a no-op when already on it.
    pub fn checkout_branch(&mut self, branch: &str) -> Result<()> {
        if self.state == CheckoutState::Branch(branch.to_string()) {
            return Ok(());
        }

        run_git(&self.path, &["checkout", branch])?;
        self.state = CheckoutState::Branch(branch.to_string());
        self.update_files()
    }

    /// Check out a commit; a no-op when already at it.
    pub fn checkout_commit(&mut self, commit: &Commit) -> Result<()> {
        if self.state == CheckoutState::Commit(commit.hash.clone()) {
            return Ok(());
        }

        run_git(&self.path, &["checkout", &commit.hash])?;
        self.state = CheckoutState::Commit(commit.hash.clone());
        self.update_files()
    }

    /// Build the commit selection sequence: all non-merge commits attributed
    /// to any configured author, globally time-ordered and duplicate-free.
    pub fn select_commits(&self, config: &Config) -> Result<CommitSequence> {
        let mut sequence = CommitSequence::new();

        for author in &config.authors {
            let stdout = run_git(
                &self.path,
                &["log", &format!("--author={author}"), "--no-merges", LOG_FORMAT],
            )?;

            for line in stdout.lines() {
                // Malformed or empty log lines are silently skipped.
                if let Some(commit) = Commit::parse_log_line(line) {
                    sequence.insert(commit);
                }
            }
        }

        debug!(repo = self.identifier, commits = sequence.len(), "selected commits");
        Ok(sequence)
    }

    /// Resolve the skip decision for a repository-relative path, memoized.
    ///
    /// Paths that are missing, symlinks, or directories are skipped but
    /// *not* cached: diffs routinely reference paths that only exist around
    /// a later rename, so those stay eligible for re-checking. Name- and
    /// content-based decisions are cached, first decision wins.
    pub fn should_skip(&mut self, config: &Config, rel_path: &str) -> bool {
        if let Some(stored) = self.cache.skip(rel_path) {
            return stored;
        }

        let fpath = self.path.join(rel_path);

        let meta = match fs::symlink_metadata(&fpath) {
            Ok(meta) => meta,
            Err(_) => {
                debug!(repo = self.identifier, path = rel_path, "skipping missing path");
                return true;
            }
        };
        if meta.file_type().is_symlink() || meta.is_dir() {
            debug!(repo = self.identifier, path = rel_path, "skipping symlink or directory");
            return true;
        }

        let skip = self.skip_by_name(config, rel_path)
            || match fs::read(&fpath) {
                Ok(data) => self.skip_by_data(config, rel_path, &data),
                Err(e) => {
                    warn!(repo = self.identifier, path = rel_path, error = %e, "unreadable file, skipping");
                    return true;
                }
            };

        self.cache.store_skip(rel_path, skip);
        skip
    }

    fn skip_by_name(&self, config: &Config, rel_path: &str) -> bool {
        let ignore = &config.ignore;

        if ignore.vendor && classify::is_vendored(rel_path, &self.vendored_filters) {
            debug!(repo = self.identifier, path = rel_path, "skipping vendored file");
            return true;
        }
        if ignore.dotfiles && classify::is_dotfile(rel_path) {
            debug!(repo = self.identifier, path = rel_path, "skipping dotfile");
            return true;
        }
        if ignore.configuration && classify::is_configuration(rel_path) {
            debug!(repo = self.identifier, path = rel_path, "skipping config file");
            return true;
        }
        if ignore.image && classify::is_image(rel_path) {
            debug!(repo = self.identifier, path = rel_path, "skipping image");
            return true;
        }
        if ignore.test && classify::is_test(rel_path) {
            debug!(repo = self.identifier, path = rel_path, "skipping test file");
            return true;
        }

        false
    }

    fn skip_by_data(&self, config: &Config, rel_path: &str, data: &[u8]) -> bool {
        let ignore = &config.ignore;

        if ignore.binary && classify::is_binary(data) {
            debug!(repo = self.identifier, path = rel_path, "skipping binary file");
            return true;
        }
        if ignore.generated && classify::is_generated(rel_path, data) {
            debug!(repo = self.identifier, path = rel_path, "skipping generated file");
            return true;
        }

        false
    }

    /// Resolve detected languages for a path, memoized. Unreadable files
    /// yield no candidates and are left uncached for a later retry.
    pub fn languages(&mut self, rel_path: &str) -> Vec<String> {
        if let Some(stored) = self.cache.languages(rel_path) {
            return stored.clone();
        }

        let data = match fs::read(self.path.join(rel_path)) {
            Ok(data) => data,
            Err(e) => {
                warn!(repo = self.identifier, path = rel_path, error = %e, "unreadable file during detection");
                return Vec::new();
            }
        };

        let langs = classify::detect_languages(rel_path, &data);
        self.cache.store_languages(rel_path, langs.clone());
        langs
    }

    /// Record a touched file, keeping the list sorted and duplicate-free.
    pub fn insert_unique_file(&mut self, file: &str) {
        if let Err(idx) = self.unique_files.binary_search_by(|f| f.as_str().cmp(file)) {
            debug!(repo = self.identifier, file, "adding unique file");
            self.unique_files.insert(idx, file.to_string());
        }
    }

    pub fn unique_files(&self) -> &[String] {
        &self.unique_files
    }

    /// Record a commit's accumulated totals in walk order.
    pub fn record_commit_count(&mut self, hash: &str, count: LineByteCount) {
        if self.commit_counts.insert(hash.to_string(), count).is_none() {
            self.commit_order.push(hash.to_string());
        }
    }
}

fn current_branch(path: &Path) -> Result<String> {
    Ok(run_git(path, &["branch", "--show-current"])?.trim().to_string())
}

/// The latest commit on the current branch, or `None` for a repository that
/// "does not have any commits yet".
fn latest_commit(path: &Path) -> Result<Option<Commit>> {
    match run_git(path, &["log", "-n", "1", LOG_FORMAT]) {
        Ok(stdout) => Ok(Commit::parse_log_line(stdout.trim())),
        Err(e) if stderr_contains(&e, "does not have any commits yet") => Ok(None),
        Err(e) => Err(e),
    }
}

/// Compile `.gitattributes` lines tagged `linguist-vendored` into path
/// filters: `.` is literal, `*` becomes a wildcard.
fn load_vendored_filters(path: &Path) -> Vec<Regex> {
    let attr_path = path.join(".gitattributes");
    let Ok(data) = fs::read_to_string(&attr_path) else {
        return Vec::new();
    };

    let mut filters = Vec::new();
    for line in data.lines() {
        if !line.contains(" linguist-vendored") {
            continue;
        }
        let Some(pattern) = line.split_whitespace().next() else {
            continue;
        };

        let escaped = pattern.replace('.', "\\.").replace('*', ".*");
        match Regex::new(&escaped) {
            Ok(re) => filters.push(re),
            Err(e) => {
                warn!(pattern, error = %e, "unusable linguist-vendored pattern, results may be inaccurate");
            }
        }
    }

    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{commit_file, init_fixture_repo, test_config};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_reads_branch_and_latest_commit() {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");
        commit_file(&fixture, "a.py", "print('hi')\n", "add a", 1_700_000_000);

        let repo = Repo::open(&config, "owner/name").unwrap();
        assert!(!repo.is_empty());
        assert_eq!(repo.latest_branch, "main");
        assert_eq!(repo.latest_commit.as_ref().unwrap().timestamp, 1_700_000_000);
        assert!(repo.latest_commit.as_ref().unwrap().root);
        assert_eq!(repo.files, vec!["a.py".to_string()]);
    }

    #[test]
    fn test_open_empty_repo() {
        let (dir, config) = test_config();
        init_fixture_repo(&dir, "owner/name");

        let repo = Repo::open(&config, "owner/name").unwrap();
        assert!(repo.is_empty());
        assert!(repo.files.is_empty());
    }

    #[test]
    fn test_select_commits_filters_by_author() {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");
        commit_file(&fixture, "a.py", "one\n", "first", 1_700_000_000);
        commit_file(&fixture, "b.py", "two\n", "second", 1_700_000_100);

        let repo = Repo::open(&config, "owner/name").unwrap();

        let commits = repo.select_commits(&config).unwrap();
        assert_eq!(commits.len(), 2);
        assert!(commits.iter().next().unwrap().root);

        let mut other = config.clone();
        other.authors = vec!["nobody@example.com".to_string()];
        assert!(repo.select_commits(&other).unwrap().is_empty());
    }

    #[test]
    fn test_checkout_commit_and_branch_roundtrip() {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");
        commit_file(&fixture, "a.py", "one\n", "first", 1_700_000_000);
        commit_file(&fixture, "b.py", "two\n", "second", 1_700_000_100);

        let mut repo = Repo::open(&config, "owner/name").unwrap();
        let commits = repo.select_commits(&config).unwrap();
        let first = commits.iter().next().unwrap().clone();

        repo.checkout_commit(&first).unwrap();
        assert_eq!(repo.state, CheckoutState::Commit(first.hash.clone()));
        assert_eq!(repo.files, vec!["a.py".to_string()]);

        // Idempotent no-op when already at the commit.
        repo.checkout_commit(&first).unwrap();

        let branch = repo.latest_branch.clone();
        repo.checkout_branch(&branch).unwrap();
        assert_eq!(repo.state, CheckoutState::Branch(branch));
        assert_eq!(repo.files.len(), 2);
    }

    #[test]
    fn test_should_skip_caches_name_decisions_only() {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");
        commit_file(&fixture, "vendor/lib.js", "x\n", "vendor", 1_700_000_000);

        let mut repo = Repo::open(&config, "owner/name").unwrap();

        let mut ignoring = config.clone();
        ignoring.ignore.vendor = true;

        assert!(repo.should_skip(&ignoring, "vendor/lib.js"));
        assert_eq!(repo.cache.skip("vendor/lib.js"), Some(true));

        // A path git mentions but the tree no longer holds: transient skip,
        // never cached.
        assert!(repo.should_skip(&ignoring, "gone.rs"));
        assert_eq!(repo.cache.skip("gone.rs"), None);
    }

    #[test]
    fn test_insert_unique_file_sorted_dedup() {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");
        commit_file(&fixture, "a.py", "x\n", "add", 1_700_000_000);

        let mut repo = Repo::open(&config, "owner/name").unwrap();
        repo.insert_unique_file("b.rs");
        repo.insert_unique_file("a.py");
        repo.insert_unique_file("b.rs");

        assert_eq!(repo.unique_files(), &["a.py".to_string(), "b.rs".to_string()]);
    }

    #[test]
    fn test_gitattributes_vendored_filters() {
        let (dir, config) = test_config();
        let fixture = init_fixture_repo(&dir, "owner/name");
        commit_file(
            &fixture,
            ".gitattributes",
            "generated/* linguist-vendored\n",
            "attrs",
            1_700_000_000,
        );
        commit_file(&fixture, "generated/api.ts", "x\n", "gen", 1_700_000_100);

        let mut repo = Repo::open(&config, "owner/name").unwrap();

        let mut ignoring = config.clone();
        ignoring.ignore.vendor = true;
        assert!(repo.should_skip(&ignoring, "generated/api.ts"));
    }
}
