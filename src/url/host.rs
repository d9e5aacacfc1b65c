use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the admission-control host from a URL string
///
/// The host is lowercased and excludes the port, so `https://Example.com:8443/a`
/// and `https://example.com/b` share one per-host budget.
///
/// # Errors
///
/// * `UrlError::Parse` - The string is not an absolute URL
/// * `UrlError::MissingHost` - The URL has no host (e.g. `mailto:` or `file:`)
///
/// # Examples
///
/// ```
/// use ripple_crawler::url::host_of;
///
/// assert_eq!(host_of("https://EXAMPLE.com/path").unwrap(), "example.com");
/// assert!(host_of("not a url").is_err());
/// ```
pub fn host_of(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    parsed
        .host_str()
        .map(|h| h.to_lowercase())
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))
}
