//! Turning command-line arguments into a validated run configuration.
//!
//! Everything here happens before the first request: a bad date, an empty
//! site list or an unreadable presets file is reported as a
//! [`ConfigError`] and nothing is fetched.

use crate::cli::Cli;
use crate::collect::CollectOptions;
use crate::dates::parse_ymd;
use crate::errors::ConfigError;
use crate::http::TlsMode;
use crate::models::DateWindow;
use crate::presets::Presets;
use crate::utils::normalize_keywords;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Window length when nothing else is given.
pub const DEFAULT_DAYS: u32 = 30;

static DAYS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,4}$").unwrap());
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap());

/// Everything a run needs, resolved from the CLI.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub sites: Vec<String>,
    pub window: DateWindow,
    pub options: CollectOptions,
    pub keywords: Vec<String>,
    pub output_dir: String,
    pub tls: TlsMode,
    pub deadline: Option<Duration>,
}

impl RunConfig {
    /// Validate the parsed arguments and resolve everything a run needs.
    ///
    /// # Arguments
    ///
    /// * `cli` - Parsed command line (environment fallbacks already applied)
    /// * `now` - Reference time for relative windows
    ///
    /// # Errors
    ///
    /// A [`ConfigError`] for an empty or unreadable site list, a bad or
    /// inverted date window, an unusable throttle, or a broken presets file.
    pub fn from_cli(cli: &Cli, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let sites = load_sites(cli.sites.as_deref(), cli.sites_file.as_deref())?;

        let window = match cli.period.as_deref() {
            Some(period) => parse_period(period, now)?,
            None => resolve_window(cli.days, cli.start.as_deref(), cli.end.as_deref(), now)?,
        };

        // Rejects negative, NaN and values too large for a Duration
        let throttle = Duration::try_from_secs_f64(cli.throttle).map_err(|_| ConfigError::InvalidThrottle(cli.throttle))?;

        let presets = match cli.presets_file.as_deref() {
            Some(path) => Presets::load_with_builtin(path)?,
            None => Presets::builtin(),
        };

        let tls = if cli.insecure {
            TlsMode::Insecure
        } else if let Some(path) = &cli.cafile {
            TlsMode::CustomCa(path.clone())
        } else {
            TlsMode::Verify
        };

        let options = CollectOptions {
            accept_undated: cli.accept_undated,
            use_presets: cli.presets || cli.presets_file.is_some(),
            presets,
            max_items: cli.max_items,
            throttle,
            ..CollectOptions::default()
        };

        Ok(Self {
            sites,
            window,
            options,
            keywords: cli.keywords.as_deref().map(normalize_keywords).unwrap_or_default(),
            output_dir: cli.output_dir.clone(),
            tls,
            deadline: cli.timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Prefix bare domains with `https://` and drop trailing slashes.
pub fn normalize_site(raw: &str) -> String {
    let s = raw.trim().trim_end_matches('/');
    if s.contains("://") {
        s.to_string()
    } else {
        format!("https://{s}")
    }
}

/// Sites from the comma-separated list followed by the sites file.
///
/// Blank lines and `#` comment lines in the file are skipped; duplicates
/// are dropped keeping the first occurrence.
pub fn load_sites(list: Option<&str>, file: Option<&Path>) -> Result<Vec<String>, ConfigError> {
    let mut raw: Vec<String> = Vec::new();
    if let Some(list) = list {
        raw.extend(list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from));
    }
    if let Some(path) = file {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::SitesFile {
            path: path.display().to_string(),
            source,
        })?;
        raw.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from),
        );
    }

    let mut sites: Vec<String> = Vec::new();
    for site in raw.iter().map(|s| normalize_site(s)) {
        if !sites.contains(&site) {
            sites.push(site);
        }
    }
    if sites.is_empty() {
        return Err(ConfigError::NoSites);
    }
    debug!(count = sites.len(), "Sites loaded");
    Ok(sites)
}

fn ymd(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    parse_ymd(value).map_err(|source| ConfigError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

/// Last second of the day starting at `midnight`.
fn end_of_day(midnight: DateTime<Utc>) -> DateTime<Utc> {
    midnight + ChronoDuration::days(1) - ChronoDuration::seconds(1)
}

/// Window from `--days`, `--start` and `--end`.
///
/// `start` wins over `days`; with neither the window is the last
/// [`DEFAULT_DAYS`] days. `end` defaults to `now` and otherwise covers the
/// whole named day.
pub fn resolve_window(
    days: Option<u32>,
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateWindow, ConfigError> {
    let start = match (start, days) {
        (Some(s), _) => ymd(s)?,
        (None, days) => DateWindow::last_days(days.unwrap_or(DEFAULT_DAYS), now)?.start(),
    };
    let end = match end {
        Some(e) => end_of_day(ymd(e)?),
        None => now,
    };
    DateWindow::new(start, end)
}

/// Window from free-form period text.
///
/// - `"30"`: the last 30 days
/// - two ISO dates anywhere in the text: from the earlier to the end of the
///   later one
/// - one ISO date: from it until now
/// - anything else: the last [`DEFAULT_DAYS`] days
pub fn parse_period(text: &str, now: DateTime<Utc>) -> Result<DateWindow, ConfigError> {
    let s = text.trim().to_lowercase();

    if DAYS_ONLY.is_match(&s) {
        let days: u32 = s.parse().unwrap_or(DEFAULT_DAYS);
        return DateWindow::last_days(days, now);
    }

    let dates: Vec<&str> = ISO_DATE.captures_iter(&s).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect();
    match dates.as_slice() {
        [first, second, ..] => {
            let (a, b) = (ymd(first)?, ymd(second)?);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            DateWindow::new(start, end_of_day(end))
        }
        [only] => DateWindow::new(ymd(only)?, now),
        [] => DateWindow::last_days(DEFAULT_DAYS, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::Parser;
    use std::path::PathBuf;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 27, 15, 30, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_site() {
        assert_eq!(normalize_site("finextra.com"), "https://finextra.com");
        assert_eq!(normalize_site(" http://a.test/ "), "http://a.test");
        assert_eq!(normalize_site("https://a.test/blog/"), "https://a.test/blog");
    }

    #[test]
    fn test_load_sites_merges_list_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.txt");
        std::fs::write(&path, "# fintech\nb.test\n\n  https://c.test/  \na.test\n").unwrap();

        let sites = load_sites(Some("a.test, ,https://z.test"), Some(&path)).unwrap();
        assert_eq!(sites, vec!["https://a.test", "https://z.test", "https://b.test", "https://c.test"]);
    }

    #[test]
    fn test_load_sites_errors() {
        assert!(matches!(load_sites(None, None), Err(ConfigError::NoSites)));
        assert!(matches!(load_sites(Some(" , "), None), Err(ConfigError::NoSites)));
        assert!(matches!(
            load_sites(None, Some(Path::new("/nonexistent/sites.txt"))),
            Err(ConfigError::SitesFile { .. })
        ));
    }

    #[test]
    fn test_resolve_window_defaults_to_thirty_days() {
        let w = resolve_window(None, None, None, now()).unwrap();
        assert_eq!(w.end(), now());
        assert_eq!(w.start(), now() - ChronoDuration::days(30));
    }

    #[test]
    fn test_resolve_window_start_overrides_days() {
        let w = resolve_window(Some(3), Some("2025-07-01"), None, now()).unwrap();
        assert_eq!(w.start(), day(2025, 7, 1));
    }

    #[test]
    fn test_resolve_window_end_is_inclusive() {
        let w = resolve_window(None, Some("2025-07-01"), Some("2025-07-31"), now()).unwrap();
        assert_eq!(w.end(), Utc.with_ymd_and_hms(2025, 7, 31, 23, 59, 59).unwrap());
        assert!(w.contains(Utc.with_ymd_and_hms(2025, 7, 31, 18, 0, 0).unwrap()));
        assert!(!w.contains(day(2025, 8, 1)));
    }

    #[test]
    fn test_resolve_window_rejects_bad_input() {
        assert!(matches!(
            resolve_window(None, Some("07/01/2025"), None, now()),
            Err(ConfigError::InvalidDate { .. })
        ));
        assert!(matches!(
            resolve_window(None, Some("2025-08-10"), Some("2025-08-01"), now()),
            Err(ConfigError::InvertedWindow { .. })
        ));
    }

    #[test]
    fn test_parse_period_days() {
        let w = parse_period(" 7 ", now()).unwrap();
        assert_eq!(w.start(), now() - ChronoDuration::days(7));
        assert_eq!(w.end(), now());
    }

    #[test]
    fn test_parse_period_two_dates_any_order() {
        let w = parse_period("from 2025-08-27 to 2025-07-01", now()).unwrap();
        assert_eq!(w.start(), day(2025, 7, 1));
        assert_eq!(w.end(), Utc.with_ymd_and_hms(2025, 8, 27, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_parse_period_single_date_until_now() {
        let w = parse_period("2025-08-01", now()).unwrap();
        assert_eq!(w.start(), day(2025, 8, 1));
        assert_eq!(w.end(), now());
    }

    #[test]
    fn test_parse_period_fallback_and_errors() {
        let w = parse_period("last month please", now()).unwrap();
        assert_eq!(w.start(), now() - ChronoDuration::days(DEFAULT_DAYS as i64));
        assert!(matches!(parse_period("2025-13-45", now()), Err(ConfigError::InvalidDate { .. })));
    }

    #[test]
    fn test_run_config_from_cli() {
        let cli = Cli::parse_from([
            "feed_harvest",
            "--sites",
            "a.test",
            "--period",
            "14",
            "--throttle",
            "0.25",
            "--keywords",
            "Banks; payments",
            "--insecure",
            "--timeout-secs",
            "60",
        ]);
        let config = RunConfig::from_cli(&cli, now()).unwrap();

        assert_eq!(config.sites, vec!["https://a.test"]);
        assert_eq!(config.window.start(), now() - ChronoDuration::days(14));
        assert_eq!(config.options.throttle, Duration::from_millis(250));
        assert!(!config.options.use_presets);
        assert_eq!(config.keywords, vec!["banks", "payments"]);
        assert_eq!(config.tls, TlsMode::Insecure);
        assert_eq!(config.deadline, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_run_config_tls_and_presets() {
        let dir = tempfile::tempdir().unwrap();
        let presets = dir.path().join("presets.yaml");
        std::fs::write(&presets, "a.test:\n  - https://a.test/news.rss\n").unwrap();

        let cli = Cli::parse_from([
            "feed_harvest",
            "--sites",
            "a.test",
            "--cafile",
            "/etc/ssl/corp.pem",
            "--presets-file",
            presets.to_str().unwrap(),
        ]);
        let config = RunConfig::from_cli(&cli, now()).unwrap();
        assert_eq!(config.tls, TlsMode::CustomCa(PathBuf::from("/etc/ssl/corp.pem")));
        assert!(config.options.use_presets);
        assert_eq!(config.options.presets.feeds_for("a.test"), ["https://a.test/news.rss"]);
    }

    #[test]
    fn test_run_config_rejects_negative_throttle() {
        let cli = Cli::parse_from(["feed_harvest", "--sites", "a.test", "--throttle=-1"]);
        assert!(matches!(
            RunConfig::from_cli(&cli, now()),
            Err(ConfigError::InvalidThrottle(_))
        ));
    }

    #[test]
    fn test_run_config_rejects_unrepresentable_throttle() {
        for value in ["1e30", "NaN", "inf"] {
            let cli = Cli::parse_from(["feed_harvest", "--sites", "a.test", "--throttle", value]);
            assert!(
                matches!(RunConfig::from_cli(&cli, now()), Err(ConfigError::InvalidThrottle(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_huge_day_count_is_config_error() {
        assert!(matches!(
            resolve_window(Some(u32::MAX), None, None, now()),
            Err(ConfigError::WindowOutOfRange { days: u32::MAX })
        ));
        let cli = Cli::parse_from(["feed_harvest", "--sites", "a.test", "--days", "4294967295"]);
        assert!(matches!(
            RunConfig::from_cli(&cli, now()),
            Err(ConfigError::WindowOutOfRange { .. })
        ));
    }
}
