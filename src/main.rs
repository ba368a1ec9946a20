//! # Trend Blogger
//!
//! A scheduled content pipeline that turns trending sports topics into blog
//! posts.
//!
//! ## Features
//!
//! - Reads the trending-searches RSS feed and keeps topics matching a keyword
//! - Scrapes each topic's article text and lead image
//! - Rewrites the text through an OpenAI-compatible chat-completion API
//! - Sharpens the image, re-encodes it as JPEG and hosts it on imgbb
//! - Publishes the result to a Blogger blog
//!
//! ## Usage
//!
//! ```sh
//! export OPENAI_API_KEY=… IMGBB_API_KEY=… BLOGGER_BLOG_ID=… BLOGGER_ACCESS_TOKEN=…
//! trend_blogger                       # loop forever, 30 minutes between cycles
//! trend_blogger -c settings.yaml --once
//! ```
//!
//! ## Architecture
//!
//! Strictly sequential, one topic at a time:
//! 1. **Trends**: fetch the feed, filter, keep the first five
//! 2. **Scrape**: paragraph text (max 2000 chars) and lead image
//! 3. **Rewrite**: one chat completion per article
//! 4. **Image**: download, sharpen 2.0x, upload
//! 5. **Post**: image plus rewritten text, labelled `Trending`, `Sports`
//!
//! Per-topic failures are logged and skipped. Status lines go to stdout,
//! logs to stderr.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod error;
mod imaging;
mod models;
mod outputs;
mod pipeline;
mod scheduler;
mod scrapers;
mod utils;

use cli::Cli;
use config::Settings;
use pipeline::Pipeline;
use scheduler::{Scheduler, TokioSleeper};

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "trend_blogger starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, once = args.once, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref()).await?;
    let pipeline = Pipeline::new(settings, args.credentials())?;

    if args.once {
        let report = pipeline.run_cycle().await.inspect_err(|e| {
            error!(error = %e, "Cycle aborted");
        })?;
        info!(%report, elapsed = ?start_time.elapsed(), "Single cycle complete");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            if on_signal.is_cancelled() {
                warn!("Second Ctrl-C; exiting immediately");
                std::process::exit(130);
            }
            info!("Ctrl-C received; shutting down");
            on_signal.cancel();
        }
    });

    let interval = Duration::from_secs(pipeline.settings().cycle_interval_secs);
    let scheduler = Scheduler::new(interval, TokioSleeper, shutdown);
    match scheduler.run(&pipeline).await {
        Ok(cycles) => {
            info!(cycles, elapsed = ?start_time.elapsed(), "Execution complete");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Trend feed failed; exiting");
            Err(e.into())
        }
    }
}
