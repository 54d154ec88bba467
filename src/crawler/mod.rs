//! Crawler module for page discovery
//!
//! This module contains the crawl phase of a run:
//! - Page fetching over HTTP behind the [`PageFetcher`] trait
//! - HTML parsing for links, title and readable text
//! - The breadth-first frontier that visits pages one at a time

mod fetcher;
mod frontier;
mod parser;

pub use fetcher::{
    build_http_client, FetchError, FetchErrorKind, FetchedPage, HttpFetcher, PageFetcher,
};
pub use frontier::{crawl, CrawlResult, CrawledPage, Frontier};
pub use parser::{parse_html, ParsedPage};
