//! Terminal progress rendering, one bar per in-flight repository.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const BAR_MAX: u64 = 100;

/// Factory for per-repository progress bars. Silent mode (or a non-terminal
/// stderr, which indicatif detects itself) renders nothing.
pub struct Progress {
    multi: Option<MultiProgress>,
}

impl Progress {
    pub fn new(silent: bool) -> Self {
        Self {
            multi: (!silent).then(MultiProgress::new),
        }
    }

    /// A factory that never draws, for library use and tests.
    pub fn hidden() -> Self {
        Self { multi: None }
    }

    pub fn repo_bar(&self, repo_id: &str) -> RepoProgress {
        let Some(multi) = &self.multi else {
            return RepoProgress::noop();
        };

        let bar = multi.add(ProgressBar::new(BAR_MAX));
        bar.set_style(
            ProgressStyle::with_template("{prefix:.bold} > {wide_msg} [{bar:30}] {percent:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#-"),
        );
        bar.set_prefix(repo_id.to_string());
        RepoProgress { bar: Some(bar) }
    }
}

/// Per-repository handle the workers update as processing moves through
/// its phases.
pub struct RepoProgress {
    bar: Option<ProgressBar>,
}

impl RepoProgress {
    pub fn noop() -> Self {
        Self { bar: None }
    }

    /// Set the message and completion in [0, 1].
    pub fn update(&self, message: impl Into<String>, completion: f64) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.into());
            bar.set_position((completion.clamp(0.0, 1.0) * BAR_MAX as f64) as u64);
        }
    }

    pub fn finish(&self, message: impl Into<String>) {
        if let Some(bar) = &self.bar {
            bar.set_position(BAR_MAX);
            bar.finish_with_message(message.into());
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.into());
        }
    }
}
