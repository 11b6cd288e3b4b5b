//! Per-site collection pipeline.
//!
//! For one site:
//!
//! 1. Candidate feeds: presets for the domain (if enabled), then discovery.
//! 2. Each feed is fetched and parsed; items are filtered by the date
//!    window and missing descriptions are backfilled from the article page.
//! 3. If no feed produced an in-window item, sitemaps are used instead.
//! 4. Items are sorted newest-first, deduplicated by link and capped.
//!
//! Failures never abort a site. They end up as notes in the returned
//! [`SiteCollection`].

use crate::errors::SourceError;
use crate::http::Fetcher;
use crate::models::{Article, DateWindow, SiteCollection};
use crate::presets::Presets;
use crate::sources::discovery::discover_feeds;
use crate::sources::enrich::fetch_description;
use crate::sources::feed::parse_feed;
use crate::sources::sitemap::{DEFAULT_MAX_URLS, discover_sitemaps, parse_sitemap};
use crate::utils::{domain_from_url, matches_keywords, title_from_url};
use itertools::Itertools;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

const FEED_TIMEOUT: Duration = Duration::from_secs(20);

/// Knobs for [`collect`].
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Keep undated items, stamped with the window end.
    pub accept_undated: bool,
    /// Try curated feeds before discovery.
    pub use_presets: bool,
    pub presets: Presets,
    /// Per-site cap after dedup.
    pub max_items: usize,
    /// Pause after each candidate check, feed and sitemap request.
    pub throttle: Duration,
    /// Per-`urlset` cap for the sitemap fallback.
    pub sitemap_max_urls: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            accept_undated: false,
            use_presets: false,
            presets: Presets::builtin(),
            max_items: 1000,
            throttle: Duration::from_millis(600),
            sitemap_max_urls: DEFAULT_MAX_URLS,
        }
    }
}

/// Collect in-window articles from one site.
///
/// # Arguments
///
/// * `fetcher` - Where every request goes (the real client or a test fake)
/// * `site_url` - Normalized site root, e.g. `https://news.test`
/// * `window` - Inclusive date window items must fall in
/// * `options` - Presets, undated policy, cap and throttle
///
/// # Returns
///
/// The site's articles, newest first and deduplicated by link, along with
/// notes describing anything that went wrong. A site that cannot be reached
/// at all still returns a collection, just an empty one.
#[instrument(level = "info", skip(fetcher, window, options))]
pub async fn collect<F: Fetcher>(
    fetcher: &F,
    site_url: &str,
    window: &DateWindow,
    options: &CollectOptions,
) -> SiteCollection {
    let domain = domain_from_url(site_url);
    let mut notes: Vec<String> = Vec::new();

    let mut feeds: Vec<String> = Vec::new();
    if options.use_presets {
        let presets = options.presets.feeds_for(&domain);
        if !presets.is_empty() {
            info!(count = presets.len(), "Using preset feeds");
        }
        feeds.extend(presets.iter().cloned());
    }
    for found in discover_feeds(fetcher, site_url, options.throttle).await {
        if !feeds.contains(&found) {
            feeds.push(found);
        }
    }
    info!(feeds = feeds.len(), "Feed candidates");

    let mut collected: Vec<Article> = Vec::new();
    for feed_url in &feeds {
        match fetch_feed(fetcher, feed_url, &domain).await {
            Ok(items) => {
                let total = items.len();
                let mut kept = 0usize;
                for item in items {
                    let Some(mut article) = admit(item, window, options.accept_undated) else {
                        continue;
                    };
                    if article.description.is_empty() && !article.link.is_empty() {
                        article.description = fetch_description(fetcher, &article.link).await;
                    }
                    collected.push(article);
                    kept += 1;
                }
                debug!(feed = %feed_url, total, kept, "Feed processed");
            }
            Err(e) => {
                warn!(feed = %feed_url, error = %e, "Feed failed");
                notes.push(format!("feed error {feed_url}: {e}"));
            }
        }
        sleep(options.throttle).await;
    }

    let used_sitemap = collected.is_empty();
    if used_sitemap {
        info!("No in-window feed items; falling back to sitemaps");
        collected = collect_from_sitemaps(fetcher, site_url, &domain, window, options, &mut notes).await;
    }

    let articles = finalize(collected, options.max_items);

    if feeds.is_empty() {
        notes.push("no feeds discovered".to_string());
    }
    if articles.is_empty() {
        notes.push("no items matched the date filter".to_string());
    }

    info!(collected = articles.len(), notes = notes.len(), used_sitemap, "Site done");
    SiteCollection {
        domain,
        articles,
        notes,
        feeds_found: feeds.len(),
        used_sitemap,
    }
}

async fn fetch_feed<F: Fetcher>(fetcher: &F, feed_url: &str, domain: &str) -> Result<Vec<Article>, SourceError> {
    let body = fetcher.get(feed_url, FEED_TIMEOUT).await?;
    let mut items = parse_feed(&body, domain)?;
    if let Ok(base) = Url::parse(feed_url) {
        for item in &mut items {
            item.link = resolve_link(&base, &item.link);
        }
    }
    Ok(items)
}

/// Make a feed link absolute. Absolute links are returned unchanged.
fn resolve_link(base: &Url, link: &str) -> String {
    if link.is_empty() || Url::parse(link).is_ok() {
        return link.to_string();
    }
    base.join(link)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| link.to_string())
}

/// Apply the date window and accept-undated policy to one item.
///
/// Kept items carry their effective timestamp.
fn admit(mut article: Article, window: &DateWindow, accept_undated: bool) -> Option<Article> {
    let t = window.effective_timestamp(article.timestamp, accept_undated)?;
    if !window.contains(t) {
        return None;
    }
    article.timestamp = Some(t);
    Some(article)
}

async fn collect_from_sitemaps<F: Fetcher>(
    fetcher: &F,
    site_url: &str,
    domain: &str,
    window: &DateWindow,
    options: &CollectOptions,
    notes: &mut Vec<String>,
) -> Vec<Article> {
    let mut collected = Vec::new();
    for sitemap_url in discover_sitemaps(fetcher, site_url).await {
        let scan = parse_sitemap(fetcher, &sitemap_url, options.sitemap_max_urls).await;
        notes.extend(scan.notes);

        for entry in scan.entries {
            let Some(t) = window.effective_timestamp(entry.lastmod, options.accept_undated) else {
                continue;
            };
            if !window.contains(t) {
                continue;
            }
            let description = fetch_description(fetcher, &entry.loc).await;
            collected.push(Article {
                source: domain.to_string(),
                title: title_from_url(&entry.loc),
                link: entry.loc,
                timestamp: Some(t),
                description,
            });
        }
        sleep(options.throttle).await;
    }
    collected
}

/// Stable newest-first sort; undated items go last.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
}

/// Sort newest-first, deduplicate by link and cap.
///
/// Sorting happens before deduplication, so among items sharing a link the
/// newest one survives. Items without a link are dropped.
pub fn finalize(mut articles: Vec<Article>, max_items: usize) -> Vec<Article> {
    articles.retain(|a| !a.link.is_empty());
    sort_newest_first(&mut articles);
    articles
        .into_iter()
        .unique_by(|a| a.link.clone())
        .take(max_items)
        .collect()
}

/// Keep articles whose title or description mentions any keyword.
///
/// An empty keyword list keeps everything.
pub fn filter_by_keywords(articles: Vec<Article>, keywords: &[String]) -> Vec<Article> {
    if keywords.is_empty() {
        return articles;
    }
    let before = articles.len();
    let kept: Vec<Article> = articles
        .into_iter()
        .filter(|a| matches_keywords(&format!("{} {}", a.title, a.description), keywords))
        .collect();
    info!(before, after = kept.len(), "Keyword filter applied");
    kept
}
