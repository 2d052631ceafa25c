//! The concurrent multi-repository pipeline: worker pool, cancellation,
//! and cross-repository aggregation.

pub mod aggregate;
pub mod pool;

pub use aggregate::{Aggregate, AggregateReport, RepoOutcome};
pub use pool::{run, CancelOnce, RunReport};
