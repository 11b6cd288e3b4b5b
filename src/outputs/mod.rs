//! Output generation for a finished run.
//!
//! # Submodules
//!
//! - [`tables`]: combined CSV and per-site CSVs
//! - [`text`]: plain-text digest
//! - [`html`]: styled HTML digest
//! - [`json`]: machine-readable [`Digest`]
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news_20250827_1530.csv
//! ├── news_20250827_1530.txt
//! ├── news_20250827_1530.html
//! ├── news_20250827_1530.json
//! └── sites/
//!     ├── finextra.com.csv
//!     └── localhost_8080.csv
//! ```

pub mod html;
pub mod json;
pub mod tables;
pub mod text;

use crate::models::Digest;
use chrono::{DateTime, Local};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub txt: PathBuf,
    pub html: PathBuf,
    pub json: PathBuf,
    pub sites: Vec<PathBuf>,
}

/// `YYYYMMDD_HHMM` in local time, used in output file names.
pub fn file_stamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M").to_string()
}

/// Write every output format for a digest.
///
/// Articles are written in digest order; callers sort them first.
///
/// # Arguments
///
/// * `digest` - The run document: window, site summaries and articles
/// * `output_dir` - Directory for the combined files; per-site CSVs go in `sites/`
/// * `stamp` - File name stamp from [`file_stamp`]
///
/// # Errors
///
/// Any failed directory creation or file write. Files already written are
/// left in place.
#[instrument(level = "info", skip_all, fields(dir = %output_dir.display(), %stamp))]
pub async fn write_outputs(digest: &Digest, output_dir: &Path, stamp: &str) -> Result<OutputPaths, Box<dyn Error>> {
    fs::create_dir_all(output_dir).await?;

    let csv = output_dir.join(format!("news_{stamp}.csv"));
    let txt = output_dir.join(format!("news_{stamp}.txt"));
    let html = output_dir.join(format!("news_{stamp}.html"));
    let json = output_dir.join(format!("news_{stamp}.json"));

    tables::write_combined(&digest.articles, &csv).await?;
    text::write_text(&digest.articles, &txt).await?;
    html::write_html(digest, &html).await?;
    json::write_digest(digest, &json).await?;
    let sites = tables::write_per_site(&digest.articles, &output_dir.join("sites")).await?;

    info!(articles = digest.articles.len(), site_files = sites.len(), "All outputs written");
    Ok(OutputPaths {
        csv,
        txt,
        html,
        json,
        sites,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, DateWindow};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_file_stamp() {
        let t = Local.with_ymd_and_hms(2025, 8, 27, 9, 5, 59).unwrap();
        assert_eq!(file_stamp(t), "20250827_0905");
    }

    #[tokio::test]
    async fn test_write_outputs_creates_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/output");
        let end = Utc.with_ymd_and_hms(2025, 8, 27, 12, 0, 0).unwrap();
        let digest = Digest {
            generated_at: end,
            window: DateWindow::last_days(30, end).unwrap(),
            keywords: Vec::new(),
            sites: Vec::new(),
            articles: vec![Article {
                source: "localhost:8080".to_string(),
                title: "Local news".to_string(),
                link: "http://localhost:8080/news".to_string(),
                timestamp: Some(end),
                description: String::new(),
            }],
        };

        let paths = write_outputs(&digest, &out, "20250827_1200").await.unwrap();

        assert_eq!(paths.csv, out.join("news_20250827_1200.csv"));
        for p in [&paths.csv, &paths.txt, &paths.html, &paths.json] {
            assert!(p.exists(), "{} missing", p.display());
        }
        assert_eq!(paths.sites, vec![out.join("sites").join("localhost_8080.csv")]);
        assert!(paths.sites[0].exists());
    }

    #[tokio::test]
    async fn test_empty_run_still_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let end = Utc.with_ymd_and_hms(2025, 8, 27, 12, 0, 0).unwrap();
        let digest = Digest {
            generated_at: end,
            window: DateWindow::last_days(30, end).unwrap(),
            keywords: Vec::new(),
            sites: Vec::new(),
            articles: Vec::new(),
        };

        let paths = write_outputs(&digest, dir.path(), "x").await.unwrap();
        let csv = std::fs::read_to_string(&paths.csv).unwrap();
        assert_eq!(csv, "source,date_utc,title,link,description\n");
        assert!(paths.sites.is_empty());
    }
}
