//! Readers for the content a site exposes.
//!
//! # Submodules
//!
//! - [`discovery`]: finds feed URLs for a site root
//! - [`feed`]: parses RSS 2.0, RSS 1.0 and Atom into articles
//! - [`sitemap`]: robots.txt directives and sitemap/sitemap-index parsing
//! - [`enrich`]: description backfill from an article page's meta tags
//! - [`xml`]: the small element tree the feed and sitemap parsers share
//!
//! Each reader takes a [`Fetcher`](crate::http::Fetcher), so everything here
//! runs against an in-memory fake in tests.

pub mod discovery;
pub mod enrich;
pub mod feed;
pub mod sitemap;
pub mod xml;
