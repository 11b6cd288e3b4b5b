//! RSS and Atom parsing into [`Article`]s.
//!
//! A document is classified once by [`classify`] into [`FeedKind`] and then
//! handed to the matching reader. Documents that are neither RSS nor Atom
//! produce no items rather than an error; only malformed XML is an error.

use crate::dates::parse_datetime;
use crate::errors::ParseError;
use crate::models::Article;
use crate::sources::xml::{Element, parse_document};
use crate::utils::{DESCRIPTION_LIMIT, clean_description, fragment_text, strip_html, truncate_chars};
use tracing::debug;

const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// Shape of a parsed feed document.
#[derive(Debug)]
pub enum FeedKind<'a> {
    /// RSS 2.0 (or RDF/RSS 1.0) with its `item` elements.
    Rss(Vec<&'a Element>),
    /// Atom with its `entry` elements.
    Atom(Vec<&'a Element>),
    Unrecognized,
}

/// Decide which format a document root belongs to.
pub fn classify(root: &Element) -> FeedKind<'_> {
    let channel = root.child("channel");
    let local = root.local_name();

    if local.eq_ignore_ascii_case("rss") || local == "RDF" || channel.is_some() {
        let mut items: Vec<&Element> = channel
            .map(|c| c.children_named("item").collect())
            .unwrap_or_default();
        // RSS 1.0 keeps items next to the channel, not inside it.
        if items.is_empty() && local == "RDF" {
            items = root.children_local("item").collect();
        }
        return FeedKind::Rss(items);
    }

    if local == "feed" || root.child_local("entry").is_some() {
        return FeedKind::Atom(root.children_local("entry").collect());
    }

    FeedKind::Unrecognized
}

/// Parse feed bytes into articles labelled with `source_domain`.
///
/// Links are returned as written; the collector resolves relative ones
/// against the feed URL.
pub fn parse_feed(bytes: &[u8], source_domain: &str) -> Result<Vec<Article>, ParseError> {
    let root = parse_document(bytes)?;
    let articles = match classify(&root) {
        FeedKind::Rss(items) => items.into_iter().map(|i| rss_item(i, source_domain)).collect(),
        FeedKind::Atom(entries) => entries.into_iter().map(|e| atom_entry(e, source_domain)).collect(),
        FeedKind::Unrecognized => {
            debug!(root = %root.name, "Document is neither RSS nor Atom");
            Vec::new()
        }
    };
    Ok(articles)
}

fn rss_item(item: &Element, source: &str) -> Article {
    let title = fragment_text(item.child_text("title"));

    let mut link = item.child_text("link").to_string();
    if link.is_empty() {
        if let Some(guid) = item.child("guid") {
            let permalink = guid.attr("isPermaLink").is_none_or(|v| !v.eq_ignore_ascii_case("false"));
            let text = guid.text.trim();
            if permalink && text.starts_with("http") {
                link = text.to_string();
            }
        }
    }

    let mut description = clean_description(item.child_text("description"));
    if description.is_empty() {
        description = clean_description(module_text(item, CONTENT_NS, "content:encoded"));
    }

    let timestamp = parse_datetime(item.child_text("pubDate"))
        .or_else(|| parse_datetime(module_text(item, DC_NS, "dc:date")));

    Article {
        source: source.to_string(),
        title,
        link,
        timestamp,
        description,
    }
}

/// Text of an RSS module element such as `content:encoded`.
///
/// Matched by namespace URI so any prefix works. Feeds that use the
/// conventional prefix without declaring it still match by that name.
fn module_text<'a>(item: &'a Element, namespace: &str, conventional: &str) -> &'a str {
    let local = conventional.rsplit_once(':').map_or(conventional, |(_, local)| local);
    item.child_ns(namespace, local)
        .or_else(|| item.children.iter().find(|c| c.name == conventional && c.namespace.is_none()))
        .map(|c| c.text.trim())
        .unwrap_or("")
}

fn atom_entry(entry: &Element, source: &str) -> Article {
    let title = fragment_text(entry.child_text_local("title"));

    let mut link = String::new();
    for el in entry.children_local("link") {
        let rel = el.attr("rel").unwrap_or("").trim().to_ascii_lowercase();
        if rel.is_empty() || rel == "alternate" {
            if let Some(href) = el.attr("href").map(str::trim).filter(|h| !h.is_empty()) {
                link = href.to_string();
            }
        }
    }

    let summary = strip_html(entry.child_text_local("summary"));
    let content = strip_html(entry.child_text_local("content"));
    let text = if content.chars().count() > summary.chars().count() {
        content
    } else {
        summary
    };

    let timestamp = parse_datetime(entry.child_text_local("updated"))
        .or_else(|| parse_datetime(entry.child_text_local("published")));

    Article {
        source: source.to_string(),
        title,
        link,
        timestamp,
        description: truncate_chars(&text, DESCRIPTION_LIMIT),
    }
}
