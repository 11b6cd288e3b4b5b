//! JSON export of the run digest.
//!
//! The file carries the window, the keyword filter, a summary per site
//! (including its notes) and every article, so a later run or another tool
//! can pick up where this one stopped without re-parsing CSV.

use crate::models::Digest;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write a [`Digest`] as pretty-printed JSON.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_digest(digest: &Digest, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(digest)?;
    fs::write(path, json).await?;
    info!(articles = digest.articles.len(), sites = digest.sites.len(), "Wrote JSON digest");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, DateWindow, SiteSummary};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_digest_file_contents() {
        let end = Utc.with_ymd_and_hms(2025, 8, 27, 12, 0, 0).unwrap();
        let digest = Digest {
            generated_at: end,
            window: DateWindow::last_days(7, end).unwrap(),
            keywords: vec!["banks".to_string()],
            sites: vec![SiteSummary {
                site: "https://a.test".to_string(),
                domain: "a.test".to_string(),
                collected: 1,
                feeds_found: 0,
                used_sitemap: true,
                notes: vec!["no feeds discovered".to_string()],
            }],
            articles: vec![Article {
                source: "a.test".to_string(),
                title: "Banks merge".to_string(),
                link: "https://a.test/banks-merge".to_string(),
                timestamp: None,
                description: String::new(),
            }],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.json");
        write_digest(&digest, &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["keywords"][0], "banks");
        assert_eq!(value["sites"][0]["notes"][0], "no feeds discovered");
        assert_eq!(value["articles"][0]["timestamp"], serde_json::Value::Null);
        assert_eq!(value["window"]["start"], "2025-08-20T12:00:00Z");

        let back: Digest = serde_json::from_str(&text).unwrap();
        assert_eq!(back.articles, digest.articles);
        assert_eq!(back.window, digest.window);
    }
}
