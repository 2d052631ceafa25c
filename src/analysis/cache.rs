//! Per-repository classification cache.

use std::collections::HashMap;

/// Memoized skip/language decisions, keyed by repository-relative path.
///
/// Both maps are write-once-per-key (first classification wins) and valid
/// for one repository's processing pass; the cache is owned by the `Repo`
/// value so two repositories processed concurrently never share state.
#[derive(Debug, Default)]
pub struct ClassifyCache {
    skip: HashMap<String, bool>,
    langs: HashMap<String, Vec<String>>,
}

impl ClassifyCache {
    /// Create a new, empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a stored skip decision
    pub fn skip(&self, path: &str) -> Option<bool> {
        self.skip.get(path).copied()
    }

    /// Store a skip decision; the first decision for a path wins
    pub fn store_skip(&mut self, path: &str, skip: bool) {
        self.skip.entry(path.to_string()).or_insert(skip);
    }

    /// Retrieve stored language candidates
    pub fn languages(&self, path: &str) -> Option<&Vec<String>> {
        self.langs.get(path)
    }

    /// Store language candidates; the first classification for a path wins
    pub fn store_languages(&mut self, path: &str, langs: Vec<String>) {
        self.langs.entry(path.to_string()).or_insert(langs);
    }

    /// Drop all decisions
    pub fn clear(&mut self) {
        self.skip.clear();
        self.langs.clear();
    }
}
