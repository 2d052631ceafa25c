//! Snapshot accounting: count the current checkout once, no history.

use std::collections::HashMap;
use std::fs;

use tracing::warn;

use crate::analysis::repo::Repo;
use crate::config::Config;
use crate::error::Result;
use crate::progress::RepoProgress;
use crate::types::LineByteCount;

/// Count raw current content per language: lines are newline counts, bytes
/// are file lengths. Skip and language decisions go through the same
/// per-repository cache and rules as the commit walker.
pub fn count_snapshot(
    repo: &mut Repo,
    config: &Config,
    progress: &RepoProgress,
) -> Result<HashMap<String, LineByteCount>> {
    let mut totals: HashMap<String, LineByteCount> = HashMap::new();

    let files = repo.files.clone();
    let total = files.len() as f64;

    for (i, file) in files.iter().enumerate() {
        progress.update(format!("Counting file {file}"), i as f64 / total);

        if repo.should_skip(config, file) {
            continue;
        }

        let langs = repo.languages(file);
        if langs.len() > 1 {
            warn!(
                repo = repo.identifier,
                path = file,
                candidates = ?langs,
                "multiple languages detected, using the first"
            );
        }
        let lang = langs
            .into_iter()
            .next()
            .unwrap_or_else(|| "Unknown".to_string());

        let data = match fs::read(repo.path.join(file)) {
            Ok(data) => data,
            Err(e) => {
                warn!(repo = repo.identifier, path = file, error = %e, "unreadable file, skipping");
                continue;
            }
        };

        let lines = data.iter().filter(|&&b| b == b'\n').count() as i64;
        *totals.entry(lang).or_default() += LineByteCount::new(lines, data.len() as i64);
    }

    Ok(totals)
}
