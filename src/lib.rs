//! # Git Language Metrics Library
//!
//! `gitlangs` computes per-language size metrics (line and byte counts) for
//! one or more git repositories, either as a snapshot of the current
//! checkout or as a cumulative tally attributed to a set of authors across
//! filtered commit history, and renders the result as a
//! most-used-languages SVG card.
//!
//! ## Features
//!
//! - Concurrent multi-repository processing with per-worker fault isolation
//! - Cooperative single-shot cancellation on the first failure
//! - Author-filtered, timestamp-ordered commit selection
//! - Net (current volume) and gross (total churn) accounting modes
//! - Per-repository classification caching with vendor/dotfile/config/
//!   image/test/binary/generated skip rules
//! - Themed SVG report cards
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gitlangs::config::{Config, Theme};
//! use gitlangs::progress::Progress;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Arc::new(Config::load("config.json")?);
//! config.ensure_location()?;
//!
//! let run = gitlangs::pipeline::run(Arc::clone(&config), Arc::new(Progress::hidden())).await;
//! let theme = Theme::load(&config.style)?;
//! gitlangs::render::write_svg("langs.svg", &run.report, &config, &theme)?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod types;

#[cfg(test)]
pub mod testutil;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use pipeline::{run, RunReport};
pub use types::{AccountingMode, CountMode, LineByteCount};
