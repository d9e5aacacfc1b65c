use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Ripple-Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawl shape configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from the seed URL (the seed is depth 1)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Size of the download worker pool
    #[serde(default = "default_downloaders")]
    pub downloaders: usize,

    /// Size of the link-extraction worker pool
    #[serde(default = "default_extractors")]
    pub extractors: usize,

    /// Maximum number of simultaneous downloads against one host
    #[serde(rename = "per-host", default = "default_per_host")]
    pub per_host: usize,

    /// How long `close` waits for running tasks before giving up (seconds)
    #[serde(
        rename = "shutdown-timeout-secs",
        default = "default_shutdown_timeout_secs"
    )]
    pub shutdown_timeout_secs: u64,
}

impl CrawlerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            downloaders: default_downloaders(),
            extractors: default_extractors(),
            per_host: default_per_host(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// User agent identification for the HTTP downloader
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_downloaders() -> usize {
    8
}

fn default_extractors() -> usize {
    4
}

fn default_per_host() -> usize {
    2
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_crawler_name() -> String {
    "RippleCrawler".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}
