//! Plain-text digest, one block per article.

use crate::models::Article;
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Render articles as text blocks:
///
/// ```text
/// # Title
/// Source: example.com
/// Date:   2025-08-20 09:30:00Z
/// Link:   https://example.com/a
/// Desc:   Optional description
/// ```
///
/// followed by a blank line. `Desc:` is omitted when empty.
pub fn articles_to_text(articles: &[Article]) -> String {
    let mut out = String::new();
    for a in articles {
        let date = a
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%SZ").to_string())
            .unwrap_or_default();
        writeln!(out, "# {}", a.title).unwrap();
        writeln!(out, "Source: {}", a.source).unwrap();
        writeln!(out, "Date:   {date}").unwrap();
        writeln!(out, "Link:   {}", a.link).unwrap();
        if !a.description.is_empty() {
            writeln!(out, "Desc:   {}", a.description).unwrap();
        }
        out.push('\n');
    }
    out
}

#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn write_text(articles: &[Article], path: &Path) -> Result<(), Box<dyn Error>> {
    fs::write(path, articles_to_text(articles)).await?;
    info!("Wrote text digest");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_text_block_format() {
        let articles = vec![
            Article {
                source: "a.test".to_string(),
                title: "Rates hold".to_string(),
                link: "https://a.test/rates".to_string(),
                timestamp: Some(Utc.with_ymd_and_hms(2025, 8, 20, 9, 30, 5).unwrap()),
                description: "Central bank keeps rates.".to_string(),
            },
            Article {
                source: "b.test".to_string(),
                title: "Undated".to_string(),
                link: "https://b.test/u".to_string(),
                timestamp: None,
                description: String::new(),
            },
        ];
        let expected = "# Rates hold\nSource: a.test\nDate:   2025-08-20 09:30:05Z\nLink:   https://a.test/rates\nDesc:   Central bank keeps rates.\n\n\
                        # Undated\nSource: b.test\nDate:   \nLink:   https://b.test/u\n\n";
        assert_eq!(articles_to_text(&articles), expected);
    }

    #[test]
    fn test_empty_is_empty() {
        assert_eq!(articles_to_text(&[]), "");
    }
}
