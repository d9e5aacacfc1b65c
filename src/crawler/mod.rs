//! Crawler module for depth-bounded concurrent crawling
//!
//! This module contains the core crawling logic, including:
//! - The `Downloader` / `Document` capabilities the crawler consumes
//! - Fixed-size worker pools for downloading and link extraction
//! - The per-call crawl session that drives the traversal
//! - The `Crawler` entry point that owns the pools
//! - HTTP and HTML implementations of the capabilities

mod coordinator;
mod fetcher;
mod parser;
mod pool;
mod session;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, HttpDownloader};
pub use parser::{extract_links, HtmlDocument};
pub use pool::WorkerPool;
pub use session::{CrawlResult, CrawlSession};

use async_trait::async_trait;
use std::io;
use std::sync::Arc;

/// A downloaded page
///
/// Extraction runs on a blocking worker thread, so implementations are free to
/// do CPU-heavy parsing here.
pub trait Document: Send + Sync {
    /// Returns every link on the page as an absolute URL string
    fn extract_links(&self) -> io::Result<Vec<String>>;
}

/// Turns a URL into a `Document`
///
/// Any `Err` is treated as a per-URL failure: it is recorded in
/// [`CrawlResult::errors`] and the crawl carries on.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> io::Result<Arc<dyn Document>>;
}
