//! # feed_harvest
//!
//! Collects recent news items from a list of web sites and exports them as
//! CSV, plain text, HTML and JSON.
//!
//! ## Features
//!
//! - Finds RSS/Atom feeds at conventional paths and through homepage
//!   `<link rel="alternate">` tags, or uses curated presets for known sites
//! - Falls back to `sitemap.xml` (including sitemap indexes) when feeds
//!   yield nothing in the requested window
//! - Backfills missing descriptions from article meta tags
//! - Filters by date window and optional keywords, deduplicates by link
//!
//! ## Usage
//!
//! ```sh
//! feed_harvest --sites finextra.com,techcrunch.com --days 7 -o ./output
//! ```
//!
//! ## Architecture
//!
//! Sites are processed one after another:
//! 1. **Discovery**: presets plus checked feed candidates
//! 2. **Collection**: feeds, or sitemaps as a fallback, filtered to the window
//! 3. **Finalizing**: newest-first, deduplicated, capped per site
//! 4. **Output**: keyword filter, global sort, then every export format

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod collect;
mod config;
mod dates;
mod errors;
mod http;
mod models;
mod outputs;
mod presets;
mod sources;
mod utils;

use cli::Cli;
use collect::{collect, filter_by_keywords, sort_newest_first};
use config::RunConfig;
use http::{Fetcher, HttpClient};
use models::{Article, Digest, SiteSummary};
use outputs::{file_stamp, write_outputs};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_harvest starting up");
    debug!(?args, "Parsed CLI arguments");

    let config = match RunConfig::from_cli(&args, Utc::now()) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Early check: fail before any request if we cannot write results
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = HttpClient::new(&config.tls)?;

    info!(
        sites = config.sites.len(),
        window = %config.window.label(),
        presets = config.options.use_presets,
        accept_undated = config.options.accept_undated,
        "Collecting"
    );

    // ---- Collect, keeping whatever finished if the deadline hits ----
    let mut summaries: Vec<SiteSummary> = Vec::new();
    let mut articles: Vec<Article> = Vec::new();
    let run = collect_sites(&client, &config, &mut summaries, &mut articles);
    let timed_out = match config.deadline {
        Some(limit) => tokio::time::timeout(limit, run).await.is_err(),
        None => {
            run.await;
            false
        }
    };
    if timed_out {
        warn!(
            completed_sites = summaries.len(),
            total_sites = config.sites.len(),
            "Collection deadline exceeded; writing partial results"
        );
    }

    // ---- Filter, sort and write ----
    let mut articles = filter_by_keywords(articles, &config.keywords);
    sort_newest_first(&mut articles);

    let digest = Digest {
        generated_at: Utc::now(),
        window: config.window,
        keywords: config.keywords.clone(),
        sites: summaries,
        articles,
    };

    let stamp = file_stamp(Local::now());
    let paths = match write_outputs(&digest, Path::new(&config.output_dir), &stamp).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to write outputs");
            return Err(e);
        }
    };
    info!(csv = %paths.csv.display(), txt = %paths.txt.display(), "Combined outputs");
    info!(html = %paths.html.display(), json = %paths.json.display(), site_files = paths.sites.len(), "Digest outputs");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        articles = digest.articles.len(),
        "Execution complete"
    );

    if timed_out {
        return Err(format!(
            "collection deadline exceeded after {} of {} sites",
            digest.sites.len(),
            config.sites.len()
        )
        .into());
    }
    Ok(())
}

/// Collect every site in order, appending to the caller's buffers so that
/// completed sites survive cancellation.
async fn collect_sites<F: Fetcher>(
    fetcher: &F,
    config: &RunConfig,
    summaries: &mut Vec<SiteSummary>,
    articles: &mut Vec<Article>,
) {
    for site in &config.sites {
        let collection = collect(fetcher, site, &config.window, &config.options).await;
        info!(%site, collected = collection.articles.len(), "Site collected");
        for note in &collection.notes {
            warn!(%site, %note, "Site note");
        }
        summaries.push(SiteSummary::from_collection(site, &collection));
        articles.extend(collection.articles);
    }
}
