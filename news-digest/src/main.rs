use anyhow::Context;
use clap::Parser;
use news_digest::{AppConfig, DigestKind, DigestPipeline, RunOptions};
use std::path::PathBuf;
use tracing::{error, info, info_span, warn, Instrument};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Fetches the configured feeds and pushes one daily digest.
#[derive(Debug, Parser)]
#[command(name = "news-digest", version, about)]
struct Cli {
    /// TOML feed list; overrides FEEDS_CONFIG.
    #[arg(long)]
    feeds: Option<PathBuf>,

    /// Print the digest instead of delivering it.
    #[arg(long)]
    dry_run: bool,

    /// Skip the summarizer and send the plain list.
    #[arg(long)]
    no_ai: bool,

    /// Do not fetch article pages.
    #[arg(long)]
    no_full_text: bool,

    #[arg(long)]
    batch_size: Option<usize>,

    /// Deliver the no-news notice when nothing was aggregated.
    #[arg(long)]
    notify_when_empty: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (e.g. under a test harness) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; real deployments set the variables directly.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env(cli.feeds.as_deref()).context("loading configuration")?;
    if cli.no_full_text {
        config.full_text = false;
    }
    if let Some(batch_size) = cli.batch_size {
        config.digest.batch_size = batch_size;
    }
    if cli.notify_when_empty {
        config.notify_when_empty = true;
    }

    let options = RunOptions {
        dry_run: cli.dry_run,
        disable_ai: cli.no_ai,
    };

    let run_id = Uuid::new_v4();
    let span = info_span!("digest_run", run_id = %run_id);

    async move {
        info!(
            "Starting news digest: {} feeds (up to {} items), {} destinations",
            config.feeds.len(),
            config.max_items_total(),
            if options.dry_run { 0 } else { config.destinations.len() }
        );
        if config.openai.is_none() && !options.disable_ai {
            warn!("No summarizer API key set, the digest will be a plain list");
        }

        let pipeline = DigestPipeline::from_config(&config, &options).context("building pipeline")?;
        let today = chrono::Local::now().date_naive();
        let summary = pipeline.run(today).await;

        match summary.digest {
            DigestKind::NoItems => info!("Run finished with no items"),
            kind => info!(
                "Run finished: {} items, {:?} digest, {} failed sources",
                summary.items, kind, summary.failed_sources
            ),
        }

        if let Some(report) = &summary.delivery {
            if !report.printed && report.delivered() == 0 {
                error!("Digest was not delivered to any destination");
            }
        }

        Ok::<_, anyhow::Error>(())
    }
    .instrument(span)
    .await
}
