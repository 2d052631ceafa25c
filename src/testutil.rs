//! Shared test fixtures: deterministic git repositories built with git2.
//!
//! Commit timestamps are fixed through `git2::Time` so selection ordering
//! and log parsing are reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

use crate::config::Config;

pub const TEST_AUTHOR: &str = "Test User";
pub const TEST_EMAIL: &str = "test@example.com";

/// A config whose provisioning location is a fresh temp dir, with one
/// repository `owner/name` and the fixture author preconfigured.
pub fn test_config() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let config = Config {
        location: dir.path().to_string_lossy().to_string(),
        authors: vec![TEST_AUTHOR.to_string()],
        repositories: vec!["owner/name".to_string()],
        ..Config::default()
    };
    (dir, config)
}

/// Initialize an empty fixture repository where `Config::repo_path` expects
/// it, on a `main` branch. Returns its working path.
pub fn init_fixture_repo(dir: &TempDir, identifier: &str) -> PathBuf {
    let path = dir.path().join(identifier.replace('/', "-"));
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(&path, &opts).unwrap();
    path
}

/// Commit a set of files with a fixed author timestamp.
pub fn commit_files(repo_path: &Path, files: &[(&str, &str)], message: &str, timestamp: i64) {
    let repo = Repository::open(repo_path).unwrap();

    let mut index = repo.index().unwrap();
    for (rel, content) in files {
        let fpath = repo_path.join(rel);
        if let Some(parent) = fpath.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&fpath, content).unwrap();
        index.add_path(Path::new(rel)).unwrap();
    }
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::new(TEST_AUTHOR, TEST_EMAIL, &Time::new(timestamp, 0)).unwrap();

    let parent = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

/// Commit a single file with a fixed author timestamp.
pub fn commit_file(repo_path: &Path, rel: &str, content: &str, message: &str, timestamp: i64) {
    commit_files(repo_path, &[(rel, content)], message, timestamp);
}
