//! Sitemap discovery and parsing, used when a site has no usable feed.
//!
//! Sitemap locations come from `Sitemap:` lines in `robots.txt` plus the
//! default `/sitemap.xml`. A `sitemapindex` is expanded recursively; a
//! `urlset` yields `(loc, lastmod)` pairs. The URL cap applies to each
//! `urlset` on its own, not to the whole expanded tree.

use crate::dates::parse_datetime;
use crate::errors::{ParseError, SourceError};
use crate::http::Fetcher;
use crate::models::SitemapEntry;
use crate::sources::xml::parse_document;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Default per-`urlset` cap.
pub const DEFAULT_MAX_URLS: usize = 5000;

const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);
const SITEMAP_TIMEOUT: Duration = Duration::from_secs(15);
/// Guards against indexes that list themselves.
const MAX_DEPTH: usize = 8;

/// A parsed sitemap document.
#[derive(Debug, PartialEq)]
pub enum SitemapDocument {
    /// `sitemapindex`: locations of child sitemaps.
    Index(Vec<String>),
    /// `urlset`: page entries, already capped.
    UrlSet(Vec<SitemapEntry>),
    Unrecognized(String),
}

/// Entries gathered from one sitemap tree plus what went wrong on the way.
#[derive(Debug, Default)]
pub struct SitemapScan {
    pub entries: Vec<SitemapEntry>,
    pub notes: Vec<String>,
}

/// Extract `Sitemap:` directives from a robots.txt body.
pub fn sitemap_directives(robots: &str) -> Vec<String> {
    robots
        .lines()
        .map(str::trim)
        .filter(|line| line.to_lowercase().starts_with("sitemap:"))
        .filter_map(|line| line.split_once(':').map(|(_, rest)| rest.trim().to_string()))
        .filter(|url| !url.is_empty())
        .collect()
}

fn host_path(site_url: &str, path: &str) -> Option<String> {
    let base = Url::parse(&format!("{}/", site_url.trim_end_matches('/'))).ok()?;
    base.join(path).ok().map(|u| u.to_string())
}

/// Sitemap URLs for a site: robots.txt directives, then `/sitemap.xml`.
///
/// A missing or unreachable robots.txt simply contributes nothing.
#[instrument(level = "info", skip(fetcher))]
pub async fn discover_sitemaps<F: Fetcher>(fetcher: &F, site_url: &str) -> Vec<String> {
    let mut sitemaps: Vec<String> = Vec::new();

    if let Some(robots_url) = host_path(site_url, "/robots.txt") {
        match fetcher.get(&robots_url, ROBOTS_TIMEOUT).await {
            Ok(body) => sitemaps.extend(sitemap_directives(&String::from_utf8_lossy(&body))),
            Err(e) => debug!(error = %e, "robots.txt unavailable"),
        }
    }
    if let Some(default) = host_path(site_url, "/sitemap.xml") {
        sitemaps.push(default);
    }

    let mut unique: Vec<String> = Vec::with_capacity(sitemaps.len());
    for s in sitemaps {
        if !unique.contains(&s) {
            unique.push(s);
        }
    }
    debug!(count = unique.len(), "Sitemap candidates");
    unique
}

/// Parse one sitemap document, dispatching on its root element.
pub fn parse_sitemap_document(bytes: &[u8], max_urls: usize) -> Result<SitemapDocument, ParseError> {
    let root = parse_document(bytes)?;
    let doc = match root.local_name() {
        "sitemapindex" => SitemapDocument::Index(
            root.children_local("sitemap")
                .map(|s| s.child_text_local("loc").to_string())
                .filter(|loc| !loc.is_empty())
                .collect(),
        ),
        "urlset" => SitemapDocument::UrlSet(
            root.children_local("url")
                .filter_map(|u| {
                    let loc = u.child_text_local("loc");
                    (!loc.is_empty()).then(|| SitemapEntry {
                        loc: loc.to_string(),
                        lastmod: parse_datetime(u.child_text_local("lastmod")),
                    })
                })
                .take(max_urls)
                .collect(),
        ),
        other => SitemapDocument::Unrecognized(other.to_string()),
    };
    Ok(doc)
}

async fn fetch_document<F: Fetcher>(
    fetcher: &F,
    url: &str,
    max_urls: usize,
) -> Result<SitemapDocument, SourceError> {
    let body = fetcher.get(url, SITEMAP_TIMEOUT).await?;
    Ok(parse_sitemap_document(&body, max_urls)?)
}

/// Fetch a sitemap and expand it into entries.
///
/// Never fails: unreachable or malformed documents add a note and
/// contribute no entries.
///
/// # Arguments
///
/// * `url` - Sitemap or sitemap index location
/// * `max_urls` - Cap applied to each `urlset` separately
///
/// # Returns
///
/// Entries from every `urlset` reached through the index, in document
/// order, plus notes for children that failed or nested too deep.
#[instrument(level = "info", skip(fetcher))]
pub async fn parse_sitemap<F: Fetcher>(fetcher: &F, url: &str, max_urls: usize) -> SitemapScan {
    let mut scan = SitemapScan::default();
    walk(fetcher, url, max_urls, 0, &mut scan).await;
    info!(entries = scan.entries.len(), notes = scan.notes.len(), "Sitemap parsed");
    scan
}

async fn walk<F: Fetcher>(fetcher: &F, url: &str, max_urls: usize, depth: usize, scan: &mut SitemapScan) {
    if depth > MAX_DEPTH {
        warn!(%url, "Sitemap nesting too deep; skipping");
        scan.notes.push(format!("sitemap {url}: nesting deeper than {MAX_DEPTH} levels"));
        return;
    }

    match fetch_document(fetcher, url, max_urls).await {
        Ok(SitemapDocument::Index(children)) => {
            debug!(%url, children = children.len(), "Sitemap index");
            for child in children {
                Box::pin(walk(fetcher, &child, max_urls, depth + 1, scan)).await;
            }
        }
        Ok(SitemapDocument::UrlSet(entries)) => {
            debug!(%url, count = entries.len(), "Sitemap urlset");
            scan.entries.extend(entries);
        }
        Ok(SitemapDocument::Unrecognized(root)) => {
            scan.notes.push(format!("sitemap {url}: unrecognized root <{root}>"));
        }
        Err(e) => {
            debug!(%url, error = %e, "Sitemap unavailable");
            scan.notes.push(format!("sitemap error {url}: {e}"));
        }
    }
}
