//! HTTP downloader implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Mapping transport and status failures onto `io::Error` kinds

use crate::config::UserAgentConfig;
use crate::crawler::parser::HtmlDocument;
use crate::crawler::{Document, Downloader};
use crate::Result;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use ripple_crawler::config::UserAgentConfig;
/// use ripple_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Downloader` that fetches pages over HTTP(S)
///
/// Non-2xx responses are failures. Responses that are not `text/html` count as
/// downloaded but contribute no links.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(config: &UserAgentConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> io::Result<Arc<dyn Document>> {
        Url::parse(url).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            let kind = if status == reqwest::StatusCode::NOT_FOUND {
                io::ErrorKind::NotFound
            } else {
                io::ErrorKind::Other
            };
            return Err(io::Error::new(
                kind,
                format!("HTTP {} for {}", status.as_u16(), url),
            ));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.contains("text/html"));

        if !is_html {
            tracing::debug!("{} is not HTML, skipping body", url);
            return Ok(Arc::new(HtmlDocument::new(final_url, String::new())));
        }

        let body = response.text().await.map_err(classify)?;
        Ok(Arc::new(HtmlDocument::new(final_url, body)))
    }
}

/// Maps a reqwest failure onto the closest `io::ErrorKind`
fn classify(err: reqwest::Error) -> io::Error {
    let kind = if err.is_timeout() {
        io::ErrorKind::TimedOut
    } else if err.is_connect() {
        io::ErrorKind::ConnectionRefused
    } else {
        io::ErrorKind::Other
    };
    io::Error::new(kind, err)
}
