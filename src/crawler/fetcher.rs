//! Page fetcher implementation
//!
//! This module handles retrieving pages for the crawler, including:
//! - Building HTTP clients with a user agent and navigation timeout
//! - GET requests following redirects
//! - Content-Type checks
//! - Error classification into typed kinds

use crate::config::CrawlSettings;
use crate::crawler::parser::parse_html;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Content types accepted as pages
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Classification of a failed page load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Navigation did not finish within the timeout
    Timeout,
    /// Connection refused, DNS failure, TLS error, broken body stream
    Network,
    /// Server answered with a non-success status
    HttpStatus(u16),
    /// Response was not an HTML page
    UnsupportedContent(String),
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::UnsupportedContent(ct) => write!(f, "unsupported content type '{}'", ct),
        }
    }
}

/// A page load failure
#[derive(Debug, Clone, Error)]
#[error("{kind} while fetching {url}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }
}

/// A successfully loaded page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,

    /// Page title, if any
    pub title: Option<String>,

    /// Readable page content
    pub content: String,

    /// Outbound anchor targets, absolute but not yet normalized
    pub links: Vec<String>,
}

/// Retrieves a page's content and outbound links
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Page fetcher over a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests time out after the navigation timeout
    ///
    /// # Example
    ///
    /// ```no_run
    /// use site_distiller::config::CrawlSettings;
    /// use site_distiller::crawler::HttpFetcher;
    ///
    /// let fetcher = HttpFetcher::new(&CrawlSettings::default()).unwrap();
    /// ```
    pub fn new(settings: &CrawlSettings) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(settings)?,
        })
    }
}

/// Builds an HTTP client with proper configuration
pub fn build_http_client(settings: &CrawlSettings) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(settings.navigation_timeout_secs);

    Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::HttpStatus(status.as_u16()),
                url.as_str(),
                status.to_string(),
            ));
        }

        let final_url = response.url().clone();

        // A missing Content-Type is treated as HTML
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !is_html(ct) {
                return Err(FetchError::new(
                    FetchErrorKind::UnsupportedContent(ct.to_string()),
                    url.as_str(),
                    "expected an HTML page",
                ));
            }
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;
        let parsed = parse_html(&body, &final_url);

        tracing::trace!(
            "Fetched {} ({} chars of text, {} links)",
            final_url,
            parsed.text.len(),
            parsed.links.len()
        );

        Ok(FetchedPage {
            final_url,
            title: parsed.title,
            content: parsed.text,
            links: parsed.links,
        })
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    HTML_CONTENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(mime))
}

/// Classifies a reqwest error through its typed predicates
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    let kind = if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if let Some(status) = error.status() {
        FetchErrorKind::HttpStatus(status.as_u16())
    } else {
        FetchErrorKind::Network
    };
    FetchError::new(kind, url.as_str(), error.to_string())
}
