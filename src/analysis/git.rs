//! Synchronous git subprocess primitive.
//!
//! Every repository operation in this crate goes through the `git` CLI; the
//! workers that call into this module run on blocking tasks, so the calls
//! here block deliberately.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Run `git <args>` in `dir`, capturing stdout.
///
/// A non-zero exit is reported as [`Error::Git`] carrying the exit code and
/// the stderr text, which callers match on for the handful of tolerated
/// messages ("does not have any commits yet", "no such ref was fetched").
pub fn run_git<P: AsRef<Path>>(dir: P, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(Error::GitSpawn)?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    if !output.status.success() {
        return Err(Error::Git {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(stdout)
}

/// Like [`run_git`] but without a working directory, for `git clone`.
pub fn run_git_global(args: &[&str]) -> Result<String> {
    let output = Command::new("git").args(args).output().map_err(Error::GitSpawn)?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    if !output.status.success() {
        return Err(Error::Git {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(stdout)
}

/// True when the error is a git failure whose stderr contains `needle`.
pub fn stderr_contains(err: &Error, needle: &str) -> bool {
    matches!(err, Error::Git { stderr, .. } if stderr.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_git_version() {
        let out = run_git(".", &["--version"]).unwrap();
        assert!(out.starts_with("git version"));
    }

    #[test]
    fn test_run_git_nonzero_exit_carries_stderr() {
        let err = run_git(".", &["rev-parse", "--verify", "no-such-ref-gitlangs"]).unwrap_err();
        match err {
            Error::Git { code, ref stderr } => {
                assert_ne!(code, 0);
                assert!(!stderr.is_empty());
            }
            other => panic!("expected Error::Git, got {other:?}"),
        }
    }

    #[test]
    fn test_stderr_contains() {
        let err = Error::Git {
            code: 128,
            stderr: "fatal: your current branch 'main' does not have any commits yet".into(),
        };
        assert!(stderr_contains(&err, "does not have any commits yet"));
        assert!(!stderr_contains(&err, "no such ref was fetched"));
    }
}
