//! Run configuration and SVG theme loading.
//!
//! The config file is JSON, deserialized with serde. Everything but
//! `location`, `authors`, and at least one repository has a default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analysis::classify::IgnoreRules;
use crate::error::{Error, Result};
use crate::types::{AccountingMode, CountMode};

/// Which dimension the rendered card ranks and prints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountStyle {
    #[default]
    Lines,
    Bytes,
}

/// Rendering options.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Path to a theme JSON file; empty means the built-in theme.
    pub theme_path: String,
    pub count: CountStyle,
    /// 1000 for SI prefixes, 1024 for binary prefixes.
    pub bytes_base: u32,
    /// Append a totals row under the per-language entries.
    pub show_total: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            theme_path: String::new(),
            count: CountStyle::Lines,
            bytes_base: 1000,
            show_total: false,
        }
    }
}

/// The run configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory where repository working copies are provisioned.
    pub location: String,
    /// Snapshot of the current checkout vs. commit-history accounting.
    pub mode: AccountingMode,
    /// Net vs. gross accounting for history mode.
    pub count: CountMode,
    /// Count whitespace-only diff lines (lowers the patch-line length guard).
    pub count_spaces: bool,
    /// Worker parallelism; 0 means one worker per CPU.
    pub parallel: usize,
    /// How many languages the card keeps.
    pub langs_count: usize,
    /// Clone-URL prefix; identifiers are appended with a `.git` suffix.
    pub remote_base: String,
    /// Repository identifiers in `owner/name` form.
    pub repositories: Vec<String>,
    /// Author identities commits are attributed to.
    pub authors: Vec<String>,
    /// Commit-hash prefixes to force-skip during the walk.
    pub skip_commits: Vec<String>,
    pub ignore: IgnoreRules,
    pub style: StyleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: String::new(),
            mode: AccountingMode::Snapshot,
            count: CountMode::Net,
            count_spaces: false,
            parallel: 1,
            langs_count: 5,
            remote_base: "https://github.com/".to_string(),
            repositories: Vec::new(),
            authors: Vec::new(),
            skip_commits: Vec::new(),
            ignore: IgnoreRules::default(),
            style: StyleConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: Config = serde_json::from_str(&data).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.location.is_empty() {
            return Err(Error::ConfigInvalid("location must be set".into()));
        }
        if self.authors.is_empty() {
            return Err(Error::ConfigInvalid("authors must not be empty".into()));
        }
        if self.repositories.is_empty() {
            return Err(Error::ConfigInvalid(
                "repositories must not be empty".into(),
            ));
        }
        if self.style.bytes_base != 1000 && self.style.bytes_base != 1024 {
            return Err(Error::ConfigInvalid(
                "style.bytes_base must be either 1000 or 1024".into(),
            ));
        }

        for id in &self.repositories {
            // Splitting must yield exactly owner and name, both non-empty.
            let mut parts = id.split('/');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {}
                _ => return Err(Error::BadIdentifier(id.clone())),
            }
        }

        Ok(())
    }

    /// Resolved worker count: `parallel`, or one per CPU when 0.
    pub fn parallelism(&self) -> usize {
        if self.parallel == 0 {
            num_cpus::get()
        } else {
            self.parallel
        }
    }

    /// Working-copy path for an identifier: `<location>/<owner>-<name>`.
    pub fn repo_path(&self, identifier: &str) -> PathBuf {
        PathBuf::from(&self.location).join(identifier.replace('/', "-"))
    }

    /// Create the provisioning location if it is missing.
    pub fn ensure_location(&self) -> Result<()> {
        fs::create_dir_all(&self.location)?;
        Ok(())
    }

    /// The patch-line minimum-length guard (see `analysis::diff`).
    pub fn min_diff_line_len(&self) -> usize {
        if self.count_spaces {
            1
        } else {
            2
        }
    }
}

/// Colors for the rendered card.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub card_bg: String,
    pub card_stroke: String,
    pub header: String,
    pub sub_header: String,
    pub rect_bg: String,
    pub lang_name: String,
    pub count: String,
    pub percent: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            card_bg: "#0d1117".to_string(),
            card_stroke: "#30363d".to_string(),
            header: "#58a6ff".to_string(),
            sub_header: "#8b949e".to_string(),
            rect_bg: "#21262d".to_string(),
            lang_name: "#c9d1d9".to_string(),
            count: "#8b949e".to_string(),
            percent: "#58a6ff".to_string(),
        }
    }
}

impl Theme {
    /// Load the theme named by the style config, or the built-in default.
    pub fn load(style: &StyleConfig) -> Result<Self> {
        if style.theme_path.is_empty() {
            return Ok(Self::default());
        }

        let path = Path::new(&style.theme_path);
        let data = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&data).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
