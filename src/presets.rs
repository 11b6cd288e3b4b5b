//! Curated feed URLs for well-known sites.
//!
//! When presets are enabled, these feeds are tried before discovery for a
//! matching domain. The built-in table covers a few fintech outlets; a YAML
//! file can add domains or replace their lists:
//!
//! ```yaml
//! www.example.com:
//!   - https://www.example.com/rss/all
//!   - https://www.example.com/rss/markets
//! ```

use crate::errors::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Domain → feed URLs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Presets {
    feeds: BTreeMap<String, Vec<String>>,
}

const FINEXTRA: &[&str] = &[
    "https://www.finextra.com/rss/allnews.aspx",
    "https://www.finextra.com/rss/payments",
    "https://www.finextra.com/rss/retail",
];

const BUILTIN: &[(&str, &[&str])] = &[
    ("www.finextra.com", FINEXTRA),
    ("finextra.com", FINEXTRA),
    (
        "techcrunch.com",
        &[
            "https://techcrunch.com/category/fintech/feed/",
            "https://techcrunch.com/tag/payments/feed/",
            "https://techcrunch.com/tag/banking/feed/",
        ],
    ),
    ("www.pymnts.com", &["https://www.pymnts.com/feed/"]),
    ("www.thepaypers.com", &["https://www.thepaypers.com/rss"]),
];

impl Presets {
    /// The built-in table.
    pub fn builtin() -> Self {
        let feeds = BUILTIN
            .iter()
            .map(|(domain, urls)| (domain.to_string(), urls.iter().map(|u| u.to_string()).collect()))
            .collect();
        Self { feeds }
    }

    /// Parse a YAML mapping of domain to feed list.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let feeds: BTreeMap<String, Vec<String>> = serde_yaml::from_str(yaml)?;
        let feeds = feeds
            .into_iter()
            .map(|(domain, urls)| (domain.trim().to_lowercase(), urls))
            .collect();
        Ok(Self { feeds })
    }

    /// Built-ins overlaid with the entries of a YAML file.
    pub fn load_with_builtin(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let yaml = std::fs::read_to_string(path).map_err(|e| ConfigError::Presets {
            path: shown.clone(),
            reason: e.to_string(),
        })?;
        let extra = Self::from_yaml(&yaml).map_err(|e| ConfigError::Presets {
            path: shown.clone(),
            reason: e.to_string(),
        })?;
        let mut presets = Self::builtin();
        presets.merge(extra);
        info!(path = %shown, domains = presets.domain_count(), "Loaded presets");
        Ok(presets)
    }

    /// Add or replace domains from `other`.
    pub fn merge(&mut self, other: Presets) {
        self.feeds.extend(other.feeds);
    }

    /// Feeds for a domain, or an empty slice.
    pub fn feeds_for(&self, domain: &str) -> &[String] {
        self.feeds
            .get(&domain.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of domains with presets.
    pub fn domain_count(&self) -> usize {
        self.feeds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let presets = Presets::builtin();
        assert_eq!(presets.feeds_for("www.finextra.com").len(), 3);
        assert_eq!(presets.feeds_for("finextra.com"), presets.feeds_for("www.finextra.com"));
        assert_eq!(presets.feeds_for("WWW.PYMNTS.COM"), ["https://www.pymnts.com/feed/"]);
        assert!(presets.feeds_for("unknown.test").is_empty());
    }

    #[test]
    fn test_yaml_overrides_builtin() {
        let extra = Presets::from_yaml(
            "www.pymnts.com:\n  - https://www.pymnts.com/category/news/feed/\nNew.Test:\n  - https://new.test/rss\n",
        )
        .unwrap();
        let mut presets = Presets::builtin();
        let before = presets.domain_count();
        presets.merge(extra);

        assert_eq!(presets.domain_count(), before + 1);
        assert_eq!(presets.feeds_for("www.pymnts.com"), ["https://www.pymnts.com/category/news/feed/"]);
        assert_eq!(presets.feeds_for("new.test"), ["https://new.test/rss"]);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Presets::from_yaml("- just\n- a list\n").is_err());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Presets::load_with_builtin(Path::new("/nonexistent/presets.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Presets { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.yaml");
        std::fs::write(&path, "blog.test:\n  - https://blog.test/atom.xml\n").unwrap();
        let presets = Presets::load_with_builtin(&path).unwrap();
        assert_eq!(presets.feeds_for("blog.test"), ["https://blog.test/atom.xml"]);
        assert!(!presets.feeds_for("techcrunch.com").is_empty());
    }
}
