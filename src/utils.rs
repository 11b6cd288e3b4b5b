//! Text helpers, keyword matching and file system checks.
//!
//! - HTML stripping and truncation for descriptions
//! - Title guessing from URL slugs
//! - Keyword normalization and matching
//! - Domain and file name helpers
//! - Output directory validation

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Maximum length of a stored description, in characters.
pub const DESCRIPTION_LIMIT: usize = 400;

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script.*?>.*?</script>").unwrap());
static STYLE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style.*?>.*?</style>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static KEYWORD_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;\n]").unwrap());

/// Reduce an HTML fragment to plain text.
///
/// Script and style blocks are dropped, remaining tags become spaces,
/// entities are decoded and runs of whitespace collapse to one space.
pub fn strip_html(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let s = SCRIPT_BLOCK.replace_all(s, " ");
    let s = STYLE_BLOCK.replace_all(&s, " ");
    let s = ANY_TAG.replace_all(&s, " ");
    let decoded = html_escape::decode_html_entities(&s);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Keep at most `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Strip HTML and cut to [`DESCRIPTION_LIMIT`].
pub fn clean_description(s: &str) -> String {
    truncate_chars(&strip_html(s), DESCRIPTION_LIMIT)
}

/// Plain text of an HTML fragment as the browser would show it.
///
/// Used for titles, which rarely carry markup but often carry entities.
pub fn fragment_text(s: &str) -> String {
    if !s.contains('<') && !s.contains('&') {
        return s.trim().to_string();
    }
    let fragment = Html::parse_fragment(s);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Capitalize the first letter of each alphabetic run and lowercase the rest.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(title_case("hello world"), "Hello World");
/// assert_eq!(title_case("FOO-bar"), "Foo-Bar");
/// ```
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Guess a human title from the last path segment of a URL.
///
/// `https://site.test/news/big-bank-merger/` → `Big Bank Merger`.
pub fn title_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    title_case(&last.replace('-', " "))
}

/// Split a raw keyword string on `,`, `;` and newlines.
///
/// Keywords are trimmed and lowercased; empties and duplicates are dropped
/// and the first-seen order is kept.
pub fn normalize_keywords(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in KEYWORD_SEPARATORS.split(raw) {
        let k = part.trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

/// `true` when no keywords are given or any keyword occurs in `text`.
pub fn matches_keywords(text: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = text.to_lowercase();
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

/// Host plus optional port, the way sites are labelled in output.
pub fn domain_from_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// Make a domain safe to use as a file name.
pub fn safe_filename(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a scratch file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
