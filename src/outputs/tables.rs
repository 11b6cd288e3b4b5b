//! CSV exports: one combined file and one file per source domain.

use crate::models::Article;
use crate::utils::safe_filename;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

const COMBINED_HEADER: [&str; 5] = ["source", "date_utc", "title", "link", "description"];
const SITE_HEADER: [&str; 4] = ["date_utc", "title", "link", "description"];

/// Render the combined CSV.
pub fn combined_csv(articles: &[Article]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COMBINED_HEADER)?;
    for a in articles {
        writer.write_record([
            a.source.as_str(),
            a.date_iso().as_str(),
            a.title.as_str(),
            a.link.as_str(),
            a.description.as_str(),
        ])?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Render one site's CSV (no source column).
pub fn site_csv(articles: &[&Article]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SITE_HEADER)?;
    for a in articles {
        writer.write_record([
            a.date_iso().as_str(),
            a.title.as_str(),
            a.link.as_str(),
            a.description.as_str(),
        ])?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Write the combined CSV to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn write_combined(articles: &[Article], path: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = combined_csv(articles)?;
    fs::write(path, bytes).await?;
    info!("Wrote combined CSV");
    Ok(())
}

/// Write `sites/<domain>.csv` for every source, keeping input order.
///
/// Returns the written paths sorted by domain.
#[instrument(level = "info", skip_all, fields(dir = %sites_dir.display()))]
pub async fn write_per_site(articles: &[Article], sites_dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    fs::create_dir_all(sites_dir).await?;

    let mut by_site: BTreeMap<&str, Vec<&Article>> = BTreeMap::new();
    for a in articles {
        by_site.entry(a.source.as_str()).or_default().push(a);
    }

    let writes = by_site.into_iter().map(|(domain, items)| async move {
        let path = sites_dir.join(format!("{}.csv", safe_filename(domain)));
        let bytes = site_csv(&items)?;
        fs::write(&path, bytes).await?;
        debug!(path = %path.display(), count = items.len(), "Wrote site CSV");
        Ok::<PathBuf, Box<dyn Error>>(path)
    });
    let paths = try_join_all(writes).await?;
    info!(files = paths.len(), "Wrote per-site CSVs");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(source: &str, title: &str, day: Option<u32>, desc: &str) -> Article {
        Article {
            source: source.to_string(),
            title: title.to_string(),
            link: format!("https://{source}/{}", title.to_lowercase().replace(' ', "-")),
            timestamp: day.map(|d| Utc.with_ymd_and_hms(2025, 8, d, 9, 30, 0).unwrap()),
            description: desc.to_string(),
        }
    }

    #[test]
    fn test_combined_csv_format() {
        let articles = vec![
            article("a.test", "First", Some(20), "Quoted, \"text\""),
            article("b.test:8080", "Second", None, ""),
        ];
        let out = String::from_utf8(combined_csv(&articles).unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "source,date_utc,title,link,description");
        assert_eq!(
            lines[1],
            r#"a.test,2025-08-20T09:30:00+00:00,First,https://a.test/first,"Quoted, ""text""""#
        );
        assert_eq!(lines[2], "b.test:8080,,Second,https://b.test:8080/second,");
    }

    #[test]
    fn test_empty_combined_csv_has_header() {
        let out = String::from_utf8(combined_csv(&[]).unwrap()).unwrap();
        assert_eq!(out, "source,date_utc,title,link,description\n");
    }

    #[tokio::test]
    async fn test_write_per_site_groups_by_domain() {
        let dir = tempfile::tempdir().unwrap();
        let sites_dir = dir.path().join("sites");
        let articles = vec![
            article("b.test:8080", "Newest", Some(25), "x"),
            article("a.test", "Middle", Some(20), ""),
            article("b.test:8080", "Oldest", Some(1), ""),
        ];

        let paths = write_per_site(&articles, &sites_dir).await.unwrap();
        assert_eq!(paths, vec![sites_dir.join("a.test.csv"), sites_dir.join("b.test_8080.csv")]);

        let b = std::fs::read_to_string(sites_dir.join("b.test_8080.csv")).unwrap();
        let lines: Vec<&str> = b.lines().collect();
        assert_eq!(lines[0], "date_utc,title,link,description");
        assert!(lines[1].contains("Newest"));
        assert!(lines[2].contains("Oldest"));
    }
}
