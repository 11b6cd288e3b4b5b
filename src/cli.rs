//! Command-line interface definitions.
//!
//! Every option can also come from an environment variable, which is handy
//! when the collector runs from cron or a container.

use clap::Parser;
use std::path::PathBuf;

/// Collect recent news from web sites via RSS/Atom feeds or sitemaps.
///
/// # Examples
///
/// ```sh
/// # Last 30 days from two sites
/// feed_harvest --sites finextra.com,https://techcrunch.com
///
/// # Explicit range, curated feeds and a keyword filter
/// feed_harvest --sites-file sites.txt --start 2025-07-01 --end 2025-08-27 \
///     --presets --keywords "payments, open banking"
///
/// # Chat-style period text
/// feed_harvest --sites pymnts.com --period "2025-08-01"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Comma-separated list of site URLs or bare domains
    #[arg(long, env = "FEED_HARVEST_SITES")]
    pub sites: Option<String>,

    /// File with one site per line; `#` starts a comment line
    #[arg(long, env = "FEED_HARVEST_SITES_FILE")]
    pub sites_file: Option<PathBuf>,

    /// Window of the last N days ending now
    #[arg(long, env = "FEED_HARVEST_DAYS")]
    pub days: Option<u32>,

    /// Window start (YYYY-MM-DD, UTC); overrides --days
    #[arg(long)]
    pub start: Option<String>,

    /// Window end (YYYY-MM-DD, UTC), inclusive through the end of that day; default now
    #[arg(long)]
    pub end: Option<String>,

    /// Free-form period: "30", "2025-07-01 2025-08-27" or "2025-08-01"
    #[arg(long, conflicts_with_all = ["days", "start", "end"])]
    pub period: Option<String>,

    /// Keep undated items, stamped with the window end
    #[arg(long)]
    pub accept_undated: bool,

    /// Maximum items kept per site after filtering and dedup
    #[arg(long, env = "FEED_HARVEST_MAX_ITEMS", default_value_t = 1000)]
    pub max_items: usize,

    /// Seconds to sleep after each request
    #[arg(long, env = "FEED_HARVEST_THROTTLE", default_value_t = 0.6)]
    pub throttle: f64,

    /// Try curated feeds for known sites before discovery
    #[arg(long)]
    pub presets: bool,

    /// YAML file of extra presets (`domain: [feed urls]`); implies --presets
    #[arg(long, env = "FEED_HARVEST_PRESETS_FILE")]
    pub presets_file: Option<PathBuf>,

    /// Keep only items whose title or description mentions one of these (comma-separated)
    #[arg(short, long, env = "FEED_HARVEST_KEYWORDS")]
    pub keywords: Option<String>,

    /// Output directory for CSV, TXT, HTML and JSON files
    #[arg(short, long, env = "FEED_HARVEST_OUTPUT_DIR", default_value = "output")]
    pub output_dir: String,

    /// Overall deadline for collection, in seconds
    #[arg(long, env = "FEED_HARVEST_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Debug-level logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    pub verbose: bool,

    /// Extra trusted root certificates (PEM bundle)
    #[arg(long, env = "FEED_HARVEST_CAFILE", conflicts_with = "insecure")]
    pub cafile: Option<PathBuf>,

    /// Disable TLS certificate verification (not recommended)
    #[arg(long)]
    pub insecure: bool,
}
