//! Deterministic artifact paths
//!
//! The relative path of a page's artifact is a pure function of its URL and the
//! crawl start path. The same function decides whether a page is skipped at
//! materialization and where its artifact is saved, which is what makes runs
//! resumable.

use crate::url::scope::path_segments;
use sha2::{Digest, Sha256};
use url::Url;

/// Extension of every artifact file
pub const ARTIFACT_EXTENSION: &str = "md";

/// Name of the index file inside the project directory
pub const INDEX_FILE_NAME: &str = "index.md";

/// Artifact name used when a URL has no path segments below the start path.
/// Sanitization strips `_`, so no page can sanitize to this name.
pub const ROOT_ARTIFACT_NAME: &str = "_root.md";

const SEPARATOR: char = '-';

/// Derives the artifact path (relative to the project directory) for a URL
///
/// Takes the URL's path segments, strips a leading run matching the start path's
/// segments, joins the remainder with `-` and sanitizes the result.
///
/// # Examples
///
/// ```
/// use site_distiller::url::relative_path_for;
/// use url::Url;
///
/// let start = vec!["docs".to_string()];
/// let url = Url::parse("https://example.com/docs/Getting_Started/Install").unwrap();
/// assert_eq!(relative_path_for(&url, &start), "gettingstarted-install.md");
///
/// let url = Url::parse("https://example.com/docs").unwrap();
/// assert_eq!(relative_path_for(&url, &start), "_root.md");
/// ```
pub fn relative_path_for(url: &Url, start_segments: &[String]) -> String {
    let segments: Vec<&str> = path_segments(url).collect();

    let strips_prefix = segments.len() >= start_segments.len()
        && segments
            .iter()
            .zip(start_segments)
            .all(|(seg, start)| *seg == start.as_str());

    let remainder = if strips_prefix {
        &segments[start_segments.len()..]
    } else {
        &segments[..]
    };

    let stem = sanitize(&remainder.join("-"));

    if stem.is_empty() {
        return ROOT_ARTIFACT_NAME.to_string();
    }

    let file_name = format!("{}.{}", stem, ARTIFACT_EXTENSION);
    if file_name == INDEX_FILE_NAME {
        // A page called "index" must not replace the manifest
        return format!("{}-page.{}", stem, ARTIFACT_EXTENSION);
    }
    file_name
}

/// Lowercases, keeps only ASCII alphanumerics and `-`, collapses repeated `-`
/// and trims `-` from both ends
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_separator = false;

    for c in input.chars() {
        if c == SEPARATOR {
            if !prev_separator {
                out.push(SEPARATOR);
            }
            prev_separator = true;
        } else if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            prev_separator = false;
        }
    }

    out.trim_matches(SEPARATOR).to_string()
}

/// Appends a short URL hash before the extension, for colliding relative paths
///
/// ```
/// use site_distiller::url::disambiguate;
///
/// let a = disambiguate("guide.md", "https://example.com/docs/Guide");
/// let b = disambiguate("guide.md", "https://example.com/docs/guide");
/// assert!(a.starts_with("guide-") && a.ends_with(".md"));
/// assert_ne!(a, b);
/// ```
pub fn disambiguate(relative_path: &str, url: &str) -> String {
    let stem = relative_path
        .strip_suffix(&format!(".{}", ARTIFACT_EXTENSION))
        .unwrap_or(relative_path);
    format!("{}-{}.{}", stem, short_hash(url), ARTIFACT_EXTENSION)
}

/// Human-readable title derived from an artifact file name
pub fn title_from_relative_path(relative_path: &str) -> String {
    let stem = relative_path
        .strip_suffix(&format!(".{}", ARTIFACT_EXTENSION))
        .unwrap_or(relative_path);
    if format!("{}.{}", stem, ARTIFACT_EXTENSION) == ROOT_ARTIFACT_NAME {
        return "Home".to_string();
    }
    stem.to_string()
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_strips_start_prefix() {
        let start = start(&["docs"]);
        assert_eq!(
            relative_path_for(&url("https://example.com/docs/guide/intro"), &start),
            "guide-intro.md"
        );
    }

    #[test]
    fn test_root_of_section() {
        let start = start(&["docs"]);
        assert_eq!(
            relative_path_for(&url("https://example.com/docs"), &start),
            ROOT_ARTIFACT_NAME
        );
        assert_eq!(
            relative_path_for(&url("https://example.com/"), &[]),
            ROOT_ARTIFACT_NAME
        );
    }

    #[test]
    fn test_reserved_names_never_produced() {
        assert_ne!(ROOT_ARTIFACT_NAME, INDEX_FILE_NAME);

        let start = start(&["docs"]);
        let path = relative_path_for(&url("https://example.com/docs/Index"), &start);
        assert_eq!(path, "index-page.md");

        let path = relative_path_for(&url("https://example.com/docs/_root"), &start);
        assert_eq!(path, "root.md");
    }

    #[test]
    fn test_non_matching_prefix_is_kept() {
        let start = start(&["docs"]);
        assert_eq!(
            relative_path_for(&url("https://example.com/blog/post"), &start),
            "blog-post.md"
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Getting Started"), "gettingstarted");
        assert_eq!(sanitize("a--b---c"), "a-b-c");
        assert_eq!(sanitize("-leading-and-trailing-"), "leading-and-trailing");
        assert_eq!(sanitize("API_v2.html"), "apiv2html");
        assert_eq!(sanitize("%C3%A9t%C3%A9"), "c3a9tc3a9");
        assert_eq!(sanitize("___"), "");
    }

    #[test]
    fn test_separator_runs_from_empty_segments_collapse() {
        let start = start(&["docs"]);
        assert_eq!(
            relative_path_for(&url("https://example.com/docs/a/!!!/b"), &start),
            "a-b.md"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let start = start(&["docs"]);
        let u = url("https://example.com/docs/Reference/CLI");
        assert_eq!(relative_path_for(&u, &start), relative_path_for(&u, &start));
    }

    #[test]
    fn test_disambiguate_is_stable() {
        let a = disambiguate("guide.md", "https://example.com/docs/Guide");
        let again = disambiguate("guide.md", "https://example.com/docs/Guide");
        assert_eq!(a, again);
        assert_eq!(a.len(), "guide-".len() + 8 + ".md".len());
    }

    #[test]
    fn test_title_from_relative_path() {
        assert_eq!(title_from_relative_path("guide-intro.md"), "guide-intro");
        assert_eq!(title_from_relative_path(ROOT_ARTIFACT_NAME), "Home");
    }
}
