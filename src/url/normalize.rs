use crate::UrlError;
use url::Url;

/// Normalizes a URL according to Site-Distiller's canonical form
///
/// # Normalization Steps
///
/// 1. Resolve against `base` when given, otherwise parse as absolute; reject if malformed
/// 2. Require an http or https scheme and a host
/// 3. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (the root path stays `/`)
/// 4. Remove fragment (everything after #)
/// 5. Remove the query string
///
/// The host is lowercased by the parser. Applying `normalize` to its own output
/// returns the same URL.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize, absolute or relative to `base`
/// * `base` - Optional base URL for resolving relative references
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use site_distiller::url::normalize;
///
/// let url = normalize("HTTPS://Example.COM/docs/guide/#intro", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/guide");
///
/// let base = normalize("https://example.com/docs/guide", None).unwrap();
/// let url = normalize("../api/", Some(&base)).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/api");
/// ```
pub fn normalize(url_str: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let parsed = match base {
        Some(base) => base.join(url_str.trim()),
        None => Url::parse(url_str.trim()),
    };
    let mut url = parsed.map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);
    url.set_fragment(None);
    url.set_query(None);

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            // Parent directory - pop the last segment if possible
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}
