//! Feed discovery for a site root.
//!
//! Two passes, in this order:
//!
//! 1. **Conventional paths**: `/feed`, `/rss`, `/rss.xml`, `/feed.xml`,
//!    `/atom.xml` and the Blogger query path, resolved relative to the site
//!    URL.
//! 2. **Homepage links**: `<link rel="alternate">` tags whose `type`
//!    mentions RSS, Atom or XML.
//!
//! A candidate counts as a feed when its body contains `<rss` or `<feed`.
//! This is a sniff, not validation; the parser decides later. Failed checks
//! are logged and skipped.

use crate::errors::FetchError;
use crate::http::Fetcher;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument};
use url::Url;

/// Conventional feed locations, checked in this order.
pub const COMMON_FEED_PATHS: &[&str] = &[
    "/feed",
    "/rss",
    "/rss.xml",
    "/feed.xml",
    "/atom.xml",
    "/feeds/posts/default?alt=rss",
];

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("link[href]").unwrap());

/// Outcome of checking one candidate URL.
#[derive(Debug)]
pub enum CandidateCheck {
    Confirmed,
    NotAFeed,
    FetchFailed(FetchError),
}

/// `true` when the bytes look like an RSS or Atom document.
pub fn looks_like_feed(body: &[u8]) -> bool {
    contains(body, b"<rss") || contains(body, b"<feed")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Resolve a conventional path relative to the site URL.
///
/// The site URL is treated as a directory, so `https://x.test/blog` with
/// `/feed` becomes `https://x.test/blog/feed`.
pub fn resolve_relative(site_url: &str, path: &str) -> Option<String> {
    let base = Url::parse(&format!("{}/", site_url.trim_end_matches('/'))).ok()?;
    base.join(path.trim_start_matches('/')).ok().map(|u| u.to_string())
}

/// Scan homepage HTML for alternate feed links, resolved against `base`.
///
/// Order follows the document; duplicates are removed.
pub fn alternate_feed_links(html: &str, base: &str) -> Vec<String> {
    let Ok(base_url) = Url::parse(base) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut links: Vec<String> = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        let attrs = element.value();
        let rel = attrs.attr("rel").unwrap_or("").to_lowercase();
        let kind = attrs.attr("type").unwrap_or("").to_lowercase();
        if !rel.contains("alternate") {
            continue;
        }
        if !(kind.contains("rss") || kind.contains("atom") || kind.contains("xml")) {
            continue;
        }
        let Some(href) = attrs.attr("href") else {
            continue;
        };
        if let Ok(resolved) = base_url.join(href.trim()) {
            let resolved = resolved.to_string();
            if !links.contains(&resolved) {
                links.push(resolved);
            }
        }
    }
    links
}

/// Fetch a candidate and sniff it.
pub async fn check_candidate<F: Fetcher>(fetcher: &F, url: &str) -> CandidateCheck {
    match fetcher.get(url, CHECK_TIMEOUT).await {
        Ok(body) if looks_like_feed(&body) => CandidateCheck::Confirmed,
        Ok(_) => CandidateCheck::NotAFeed,
        Err(e) => CandidateCheck::FetchFailed(e),
    }
}

/// Find the feeds of a site.
///
/// Conventional-path matches come first in listed order, then homepage
/// links in document order. `throttle` is slept after every candidate check.
#[instrument(level = "info", skip(fetcher, throttle))]
pub async fn discover_feeds<F: Fetcher>(fetcher: &F, site_url: &str, throttle: Duration) -> Vec<String> {
    let mut feeds: Vec<String> = Vec::new();

    for path in COMMON_FEED_PATHS {
        let Some(candidate) = resolve_relative(site_url, path) else {
            continue;
        };
        record(&mut feeds, &candidate, check_candidate(fetcher, &candidate).await);
        sleep(throttle).await;
    }

    match fetcher.get(site_url, CHECK_TIMEOUT).await {
        Ok(body) => {
            let html = String::from_utf8_lossy(&body);
            let links = alternate_feed_links(&html, site_url);
            debug!(count = links.len(), "Homepage alternate links");
            for link in links {
                if feeds.contains(&link) {
                    continue;
                }
                record(&mut feeds, &link, check_candidate(fetcher, &link).await);
                sleep(throttle).await;
            }
        }
        Err(e) => debug!(error = %e, "Homepage fetch failed"),
    }

    info!(count = feeds.len(), "Feed discovery finished");
    feeds
}

fn record(feeds: &mut Vec<String>, candidate: &str, outcome: CandidateCheck) {
    match outcome {
        CandidateCheck::Confirmed => {
            debug!(url = %candidate, "Feed found");
            if !feeds.iter().any(|f| f == candidate) {
                feeds.push(candidate.to_string());
            }
        }
        CandidateCheck::NotAFeed => debug!(url = %candidate, "Not a feed"),
        CandidateCheck::FetchFailed(e) => debug!(url = %candidate, error = %e, "Candidate check failed"),
    }
}
