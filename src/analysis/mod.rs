//! Per-repository accounting: git access, commit selection, diff parsing,
//! classification, and the two counting modes.

pub mod cache;
pub mod classify;
pub mod commit;
pub mod diff;
pub mod git;
pub mod repo;
pub mod snapshot;
pub mod walker;

pub use cache::ClassifyCache;
pub use commit::{Commit, CommitSequence};
pub use diff::{parse_patch, FileDiff};
pub use repo::{CheckoutState, Repo};
pub use snapshot::count_snapshot;
pub use walker::count_by_commit;
