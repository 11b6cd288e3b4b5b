//! Data models shared by the collector and the output writers.
//!
//! - [`Article`]: one collected item, from a feed entry or a sitemap URL
//! - [`DateWindow`]: the inclusive `[start, end]` filter applied to items
//! - [`SiteCollection`]: everything one site produced, with diagnostic notes
//! - [`Digest`]: the run summary serialized to JSON

use crate::errors::ConfigError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A collected news item.
///
/// Identity for deduplication is `link`. The description is plain text of
/// at most 400 characters and may be empty.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// Domain of the site the item was collected for.
    pub source: String,
    pub title: String,
    /// Absolute URL of the item.
    pub link: String,
    /// Publication time in UTC, when known.
    pub timestamp: Option<DateTime<Utc>>,
    pub description: String,
}

impl Article {
    /// Timestamp formatted for tabular output, or `""` when undated.
    pub fn date_iso(&self) -> String {
        self.timestamp
            .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, false))
            .unwrap_or_default()
    }

    /// Sort key that orders undated items as the earliest possible instant.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Inclusive date window `[start, end]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending at `now`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::WindowOutOfRange`] when the start would fall outside
    /// the range `DateTime<Utc>` can represent.
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or(ConfigError::WindowOutOfRange { days })?;
        Ok(Self { start, end: now })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    /// Timestamp an item is filtered and sorted by.
    ///
    /// Undated items get the window end under the accept-undated policy and
    /// are dropped (`None`) otherwise.
    pub fn effective_timestamp(
        &self,
        timestamp: Option<DateTime<Utc>>,
        accept_undated: bool,
    ) -> Option<DateTime<Utc>> {
        match timestamp {
            Some(t) => Some(t),
            None if accept_undated => Some(self.end),
            None => None,
        }
    }

    /// Human-readable range, e.g. `2025-07-01 — 2025-08-27`.
    pub fn label(&self) -> String {
        format!("{} — {}", self.start.date_naive(), self.end.date_naive())
    }
}

/// One `<url>` of a sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
}

/// Result of collecting one site.
#[derive(Debug, Clone, Default)]
pub struct SiteCollection {
    pub domain: String,
    /// Deduplicated, newest-first, capped.
    pub articles: Vec<Article>,
    /// Diagnostics explaining failures or empty results.
    pub notes: Vec<String>,
    /// Number of feed candidates (presets plus discovered).
    pub feeds_found: usize,
    /// Whether the sitemap fallback ran.
    pub used_sitemap: bool,
}

/// Per-site line of the run digest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteSummary {
    pub site: String,
    pub domain: String,
    pub collected: usize,
    pub feeds_found: usize,
    pub used_sitemap: bool,
    pub notes: Vec<String>,
}

impl SiteSummary {
    pub fn from_collection(site: &str, collection: &SiteCollection) -> Self {
        Self {
            site: site.to_string(),
            domain: collection.domain.clone(),
            collected: collection.articles.len(),
            feeds_found: collection.feeds_found,
            used_sitemap: collection.used_sitemap,
            notes: collection.notes.clone(),
        }
    }
}

/// Everything one run produced, as written to the JSON export.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Digest {
    pub generated_at: DateTime<Utc>,
    pub window: DateWindow,
    pub keywords: Vec<String>,
    pub sites: Vec<SiteSummary>,
    pub articles: Vec<Article>,
}
