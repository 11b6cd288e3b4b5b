//! Error types for fetching, parsing and configuration.
//!
//! Fetch and parse failures are per-unit: one candidate check, one feed, one sitemap
//! or one article page. The collector converts them into diagnostic notes
//! and moves on. [`ConfigError`] is the only kind that stops a run, and it
//! is raised before any network activity starts.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A single outbound request failed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("http error {status}")]
    Http { status: reqwest::StatusCode },

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl FetchError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Http { status }
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// An XML document could not be turned into an element tree.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document has no root element")]
    Empty,

    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

/// Failure of one content unit (a feed or a sitemap document).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Invalid run configuration. Fatal for the whole run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no sites provided; use --sites or --sites-file")]
    NoSites,

    #[error("could not read sites file {path}: {source}")]
    SitesFile {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },

    #[error("window start {start} is after end {end}")]
    InvertedWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("a window of {days} days reaches before the earliest representable date")]
    WindowOutOfRange { days: u32 },

    #[error("throttle must be a non-negative number of seconds, got {0}")]
    InvalidThrottle(f64),

    #[error("could not read CA bundle {path}: {source}")]
    CaBundle {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid certificate in {path}: {reason}")]
    Certificate { path: String, reason: String },

    #[error("could not load presets from {path}: {reason}")]
    Presets { path: String, reason: String },

    #[error("could not build http client: {0}")]
    Client(String),
}
