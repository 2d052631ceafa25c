//! Error types for gitlangs

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while provisioning or accounting a repository.
#[derive(Error, Debug)]
pub enum Error {
    /// A git subprocess exited non-zero
    #[error("git exited with code {code}: {stderr}")]
    Git { code: i32, stderr: String },

    /// A git subprocess could not be spawned or waited on
    #[error("failed to run git: {0}")]
    GitSpawn(#[source] std::io::Error),

    /// A repository identifier was not of the `owner/name` form
    #[error("improper repository identifier '{0}', expected owner/name")]
    BadIdentifier(String),

    /// Configuration file could not be read or parsed
    #[error("failed to load config '{path}': {message}")]
    Config { path: PathBuf, message: String },

    /// A required configuration field was missing or invalid
    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
