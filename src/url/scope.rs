use url::{Origin, Url};

/// Crawl scope: the start URL's origin, its path prefix and excluded segments
///
/// A URL is in scope when it shares the start origin, its path segments begin
/// with the start path's segments, and none of its segments equals an excluded
/// segment. Exclusions match whole segments only: excluding `/admin` does not
/// exclude `/administration`.
#[derive(Debug, Clone)]
pub struct Scope {
    origin: Origin,
    start_segments: Vec<String>,
    exclusions: Vec<String>,
}

impl Scope {
    /// Creates a scope rooted at an already-normalized start URL
    ///
    /// Exclusions are trimmed of enclosing slashes (`"/admin/"` becomes `"admin"`).
    pub fn new(start: &Url, exclusions: &[String]) -> Self {
        let exclusions = exclusions
            .iter()
            .map(|e| e.trim().trim_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            origin: start.origin(),
            start_segments: path_segments(start).map(str::to_string).collect(),
            exclusions,
        }
    }

    /// Returns true if the URL may be crawled and processed
    pub fn in_scope(&self, url: &Url) -> bool {
        if url.origin() != self.origin {
            return false;
        }

        let segments: Vec<&str> = path_segments(url).collect();

        if segments.len() < self.start_segments.len()
            || segments
                .iter()
                .zip(&self.start_segments)
                .any(|(seg, start)| *seg != start.as_str())
        {
            return false;
        }

        !segments
            .iter()
            .any(|seg| self.exclusions.iter().any(|excluded| excluded == seg))
    }

    /// Path segments of the start URL, used to derive artifact paths
    pub fn start_segments(&self) -> &[String] {
        &self.start_segments
    }

    /// Excluded segments after trimming
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }
}

/// Non-empty path segments of a URL
pub(crate) fn path_segments(url: &Url) -> impl Iterator<Item = &str> {
    url.path().split('/').filter(|s| !s.is_empty())
}
