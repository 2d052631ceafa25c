//! Commit values and the ordered, duplicate-free selection sequence.

/// An immutable commit reference parsed from `git log` output.
///
/// Commits are ordered solely by timestamp; `root` marks a commit with no
/// parent, which the walker diffs against the empty-tree sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub timestamp: u64,
    pub root: bool,
}

impl Commit {
    pub fn new(hash: impl Into<String>, timestamp: u64, root: bool) -> Self {
        Self {
            hash: hash.into(),
            timestamp,
            root,
        }
    }

    /// Parse one `--pretty=format:%h %ct %p` log line.
    ///
    /// Lines with fewer than two fields (empty or malformed log output) yield
    /// `None` and are skipped by the selector. A missing parent field marks a
    /// root commit; merge commits never appear because the log is queried
    /// with `--no-merges`.
    pub fn parse_log_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let hash = fields.next()?;
        let timestamp: u64 = fields.next()?.parse().ok()?;
        let root = fields.next().is_none();

        Some(Self::new(hash, timestamp, root))
    }
}

/// The commit selection sequence: strictly ordered by timestamp, free of
/// duplicate hashes.
///
/// Uniqueness is keyed by hash rather than timestamp so that two distinct
/// commits sharing a timestamp (squashed imports, scripted commits) are both
/// kept, while the same commit matched by two configured author filters is
/// inserted once. Insertion is position-stable within an equal-timestamp run.
#[derive(Clone, Debug, Default)]
pub struct CommitSequence {
    commits: Vec<Commit>,
}

impl CommitSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a commit at its timestamp-sorted position unless a commit with
    /// the same hash is already present. Returns whether it was inserted.
    pub fn insert(&mut self, commit: Commit) -> bool {
        let start = self.commits.partition_point(|c| c.timestamp < commit.timestamp);
        let end = self.commits.partition_point(|c| c.timestamp <= commit.timestamp);

        if self.commits[start..end].iter().any(|c| c.hash == commit.hash) {
            return false;
        }

        self.commits.insert(end, commit);
        true
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter()
    }
}

impl IntoIterator for CommitSequence {
    type Item = Commit;
    type IntoIter = std::vec::IntoIter<Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.into_iter()
    }
}
