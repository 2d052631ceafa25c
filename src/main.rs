//! Git language metrics generator: CLI entry point.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gitlangs::config::{Config, Theme};
use gitlangs::progress::Progress;
use gitlangs::render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-language git metrics generator", long_about = None)]
struct Args {
    /// Path to the config JSON file
    #[arg(short, long)]
    config: PathBuf,

    /// Output path of the rendered SVG
    #[arg(short, long, default_value = "./langs.svg")]
    output: PathBuf,

    /// List the repositories to be cloned and analyzed, then exit
    #[arg(short, long)]
    dry_run: bool,

    /// Suppress progress rendering
    #[arg(short, long)]
    silent: bool,

    /// Write logs to a timestamped file under ./logs instead of stderr
    #[arg(long)]
    log_file: bool,
}

fn init_tracing(log_file: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_file {
        fs::create_dir_all("logs").context("creating logs directory")?;
        let name = format!("logs/{}.log", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let file = fs::File::create(&name).with_context(|| format!("creating {name}"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file)?;

    let config = Config::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let theme = Theme::load(&config.style).context("loading theme")?;

    if args.dry_run {
        println!("The following repositories will be cloned and analyzed:");
        for id in &config.repositories {
            println!("    {id}");
        }
        return Ok(());
    }

    config.ensure_location().context("creating provisioning location")?;

    let start = std::time::Instant::now();
    let config = Arc::new(config);
    let progress = Arc::new(Progress::new(args.silent));

    let run = gitlangs::pipeline::run(Arc::clone(&config), progress).await;

    if run.failed {
        // In-flight repositories were allowed to finish, but the run as a
        // whole failed; report nothing and exit non-zero.
        anyhow::bail!("run failed, no report written");
    }

    render::write_svg(&args.output, &run.report, &config, &theme)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        output = %args.output.display(),
        elapsed = ?start.elapsed(),
        repositories = run.report.repos.len(),
        "report written"
    );

    for (lang, contributions) in &run.report.breakdown {
        let totals = run.report.totals.get(lang).copied().unwrap_or_default();
        info!(
            language = lang,
            lines = totals.lines,
            bytes = totals.bytes,
            "language totals"
        );
        for c in contributions {
            info!(language = lang, repo = c.repo, lines = c.lines, bytes = c.bytes, "contribution");
        }
    }

    for repo in &run.report.repos {
        for hash in &repo.commit_order {
            let count = repo.commit_counts.get(hash).copied().unwrap_or_default();
            info!(
                repo = repo.identifier,
                commit = hash,
                lines = count.lines,
                bytes = count.bytes,
                "commit totals"
            );
        }
    }

    Ok(())
}
