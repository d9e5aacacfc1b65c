//! Ripple-Crawler: a depth-bounded concurrent web crawler
//!
//! This crate crawls pages breadth-first from a seed URL, follows discovered links
//! up to a maximum depth, and never runs more than a configured number of downloads
//! against any single host at the same time.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-Crawler operations
///
/// Per-URL download failures are not represented here; they are collected in
/// [`crawler::CrawlResult::errors`] and never abort a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid crawl depth {0}: depth must be at least 1")]
    InvalidDepth(u32),

    #[error("Worker pool has been shut down")]
    PoolClosed,

    #[error("Task for {url} panicked")]
    TaskPanicked { url: String },

    #[error("Task for {url} was cancelled")]
    TaskCancelled { url: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

impl From<UrlError> for std::io::Error {
    fn from(err: UrlError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    }
}

/// Result type alias for Ripple-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlResult, Crawler, Document, Downloader};
pub use state::{Admission, HostAdmission, UrlState};
pub use url::host_of;
