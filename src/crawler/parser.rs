//! HTML link extraction
//!
//! # Link Extraction Rules
//!
//! **Include:**
//! - `<a href="...">` tags
//! - `<link rel="canonical" href="...">`
//!
//! **Exclude:**
//! - `<a href="..." download>`
//! - `javascript:`, `mailto:`, `tel:` links
//! - Data URIs
//! - Fragment-only links
//! - Anything that is not http(s) after resolution

use crate::crawler::Document;
use scraper::{Html, Selector};
use std::io;
use url::Url;

/// A downloaded HTML page
///
/// The body is kept as text and only parsed when links are extracted, which
/// happens on an extraction worker.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    url: Url,
    body: String,
}

impl HtmlDocument {
    /// Creates a document; `url` is the final URL used to resolve relative links
    pub fn new(url: Url, body: String) -> Self {
        Self { url, body }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Document for HtmlDocument {
    fn extract_links(&self) -> io::Result<Vec<String>> {
        Ok(extract_links(&self.body, &self.url))
    }
}

/// Extracts all followable links from HTML as absolute URLs
///
/// # Example
///
/// ```
/// use ripple_crawler::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_links(html, &base_url), vec!["https://example.com/page"]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL, or None if it should be skipped
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
