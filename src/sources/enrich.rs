//! Description backfill from an article page's meta tags.
//!
//! Looks at `<meta>` tags whose `name` (or, failing that, `property`) is
//! `description`, `og:description` or `twitter:description`. The first
//! matching tag with content wins.

use crate::http::Fetcher;
use crate::utils::clean_description;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};

const PAGE_TIMEOUT: Duration = Duration::from_secs(15);
const DESCRIPTION_KEYS: &[&str] = &["description", "og:description", "twitter:description"];

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());

/// First meta description in an HTML document, cleaned and capped.
pub fn meta_description(html: &str) -> String {
    let document = Html::parse_document(html);
    for element in document.select(&META_SELECTOR) {
        let attrs = element.value();
        let key = attrs
            .attr("name")
            .filter(|n| !n.is_empty())
            .or_else(|| attrs.attr("property"))
            .unwrap_or("")
            .to_lowercase();
        if !DESCRIPTION_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(content) = attrs.attr("content").filter(|c| !c.trim().is_empty()) {
            return clean_description(content);
        }
    }
    String::new()
}

/// Fetch an article page and return its meta description.
///
/// Any failure yields an empty string.
#[instrument(level = "debug", skip(fetcher))]
pub async fn fetch_description<F: Fetcher>(fetcher: &F, url: &str) -> String {
    match fetcher.get(url, PAGE_TIMEOUT).await {
        Ok(body) => meta_description(&String::from_utf8_lossy(&body)),
        Err(e) => {
            debug!(error = %e, "Description fetch failed");
            String::new()
        }
    }
}
