//! Breadth-first crawl frontier
//!
//! The crawl visits one page at a time in discovery order. Each visited URL is
//! recorded exactly once in the [`CrawlResult`], with its content or, if the
//! page could not be loaded, a failure marker. A failed page never stops the
//! crawl.

use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::url::{normalize, Scope};
use std::collections::{HashSet, VecDeque};
use tokio_util::sync::CancellationToken;
use url::Url;

/// One visited page
#[derive(Debug, Clone)]
pub struct CrawledPage {
    /// Normalized URL the page was requested under
    pub url: Url,

    /// Readable content, or `None` if the page failed to load
    pub content: Option<String>,

    /// Why the page failed to load
    pub failure: Option<FetchError>,
}

/// Pages visited by a crawl, in visit order; each URL appears at most once
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    pages: Vec<CrawledPage>,
    interrupted: bool,
}

impl CrawlResult {
    pub fn into_pages(self) -> Vec<CrawledPage> {
        self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of pages recorded with a failure marker
    pub fn failed_count(&self) -> usize {
        self.pages.iter().filter(|p| p.content.is_none()).count()
    }

    /// True if the crawl stopped early because of a cancellation
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }
}

/// BFS queue plus visited set
#[derive(Debug)]
pub struct Frontier {
    scope: Scope,
    queue: VecDeque<Url>,
    queued: HashSet<Url>,
    visited: HashSet<Url>,
    max_pages: Option<usize>,
}

impl Frontier {
    /// Creates a frontier seeded with the start URL, unless the scope rejects it
    pub fn new(start: Url, scope: Scope, max_pages: Option<usize>) -> Self {
        let mut frontier = Self {
            scope,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            max_pages,
        };

        if frontier.scope.in_scope(&start) {
            frontier.queued.insert(start.clone());
            frontier.queue.push_back(start);
        } else {
            tracing::warn!("Start URL {} is outside its own scope, nothing to crawl", start);
        }

        frontier
    }

    /// Pops the next unvisited URL and marks it visited
    pub fn next_url(&mut self) -> Option<Url> {
        while let Some(url) = self.queue.pop_front() {
            self.queued.remove(&url);
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    /// Normalizes a discovered link against `base` and enqueues it if eligible
    ///
    /// Returns true if the link was added to the queue.
    pub fn discover(&mut self, link: &str, base: &Url) -> bool {
        let url = match normalize(link, Some(base)) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Ignoring link {}: {}", link, e);
                return false;
            }
        };

        if !self.scope.in_scope(&url) || self.visited.contains(&url) || self.queued.contains(&url)
        {
            return false;
        }

        // Soft cap: pages already queued are still visited
        if let Some(limit) = self.max_pages {
            if self.visited.len() + self.queue.len() >= limit {
                return false;
            }
        }

        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Marks a URL as visited without fetching it (used for redirect targets)
    pub fn mark_visited(&mut self, url: Url) {
        self.visited.insert(url);
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }
}

/// Runs the crawl to completion, or until `cancel` fires
///
/// Pages are fetched strictly one at a time.
pub async fn crawl(
    fetcher: &dyn PageFetcher,
    mut frontier: Frontier,
    cancel: &CancellationToken,
) -> CrawlResult {
    let mut result = CrawlResult::default();

    while let Some(url) = frontier.next_url() {
        if cancel.is_cancelled() {
            result.interrupted = true;
            break;
        }

        tracing::debug!("Visiting {}", url);

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Crawl interrupted while loading {}", url);
                result.interrupted = true;
                break;
            }
            fetched = fetcher.fetch(&url) => fetched,
        };

        match fetched {
            Ok(page) => {
                if let Ok(final_url) = normalize(page.final_url.as_str(), None) {
                    if final_url != url {
                        tracing::debug!("{} redirected to {}", url, final_url);
                        frontier.mark_visited(final_url);
                    }
                }

                let mut added = 0;
                for link in &page.links {
                    if frontier.discover(link, &page.final_url) {
                        added += 1;
                    }
                }
                tracing::trace!(
                    "{} new links queued from {} ({})",
                    added,
                    url,
                    page.title.as_deref().unwrap_or("untitled")
                );

                result.pages.push(CrawledPage {
                    url,
                    content: Some(page.content),
                    failure: None,
                });
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", url, e);
                result.pages.push(CrawledPage {
                    url,
                    content: None,
                    failure: Some(e),
                });
            }
        }

        if result.pages.len() % 10 == 0 {
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier",
                result.pages.len(),
                frontier.queued_count()
            );
        }
    }

    tracing::info!(
        "Crawl finished: {} pages ({} failed)",
        result.len(),
        result.failed_count()
    );

    result
}
