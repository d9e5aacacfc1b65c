//! Crawler - public entry point
//!
//! Owns the download and extraction pools for its whole lifetime and runs one
//! `CrawlSession` per `download` call. Sessions share the pools but nothing
//! else: visited sets and per-host admission are private to each call, so two
//! concurrent crawls on the same host each get the full per-host budget.

use crate::config::CrawlerConfig;
use crate::crawler::pool::WorkerPool;
use crate::crawler::session::{CrawlResult, CrawlSession};
use crate::crawler::Downloader;
use crate::{ConfigError, CrawlError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Depth-bounded concurrent web crawler
pub struct Crawler {
    downloader: Arc<dyn Downloader>,
    downloads: WorkerPool,
    extracts: WorkerPool,
    per_host: usize,
    shutdown_timeout: Duration,
}

impl Crawler {
    /// Creates a crawler
    ///
    /// # Arguments
    ///
    /// * `downloader` - Turns URLs into documents
    /// * `downloaders` - Number of simultaneous downloads overall
    /// * `extractors` - Number of simultaneous link extractions
    /// * `per_host` - Number of simultaneous downloads against one host
    ///
    /// # Errors
    ///
    /// `CrawlError::Config` if any of the sizes is zero.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ripple_crawler::config::UserAgentConfig;
    /// use ripple_crawler::crawler::{Crawler, HttpDownloader};
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let downloader = HttpDownloader::new(&UserAgentConfig::default())?;
    /// let crawler = Crawler::new(Arc::new(downloader), 8, 4, 2)?;
    ///
    /// let result = crawler.download("https://example.com/", 2).await?;
    /// println!("{} pages downloaded", result.downloaded.len());
    ///
    /// crawler.close().await;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        downloader: Arc<dyn Downloader>,
        downloaders: usize,
        extractors: usize,
        per_host: usize,
    ) -> Result<Self> {
        for (name, value) in [
            ("downloaders", downloaders),
            ("extractors", extractors),
            ("per_host", per_host),
        ] {
            if value < 1 {
                return Err(ConfigError::Validation(format!(
                    "{} must be >= 1, got {}",
                    name, value
                ))
                .into());
            }
        }

        Ok(Self {
            downloader,
            downloads: WorkerPool::new("download", downloaders),
            extracts: WorkerPool::new("extract", extractors),
            per_host,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        })
    }

    /// Creates a crawler from the `[crawler]` configuration section
    pub fn from_config(downloader: Arc<dyn Downloader>, config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::new(
            downloader,
            config.downloaders,
            config.extractors,
            config.per_host,
        )?
        .with_shutdown_timeout(config.shutdown_timeout()))
    }

    /// Sets how long `close` waits for running tasks
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn per_host(&self) -> usize {
        self.per_host
    }

    /// Crawls from `url`, downloading pages up to `max_depth` links away
    ///
    /// The seed is depth 1; pages at `max_depth` are downloaded but their links
    /// are not followed.
    ///
    /// Dropping the returned future abandons the crawl: queued tasks are aborted
    /// and no result is produced.
    ///
    /// # Errors
    ///
    /// * `InvalidDepth` - `max_depth` is zero
    /// * `PoolClosed` - the crawler was closed before or during the crawl
    /// * `TaskPanicked` / `TaskCancelled` - a worker died unexpectedly
    pub async fn download(&self, url: &str, max_depth: u32) -> Result<CrawlResult> {
        if max_depth < 1 {
            return Err(CrawlError::InvalidDepth(max_depth));
        }
        if self.downloads.is_closed() || self.extracts.is_closed() {
            return Err(CrawlError::PoolClosed);
        }

        tracing::info!("Starting crawl of {} (max depth {})", url, max_depth);
        let start_time = Instant::now();

        let mut session = CrawlSession::new(
            Arc::clone(&self.downloader),
            self.downloads.clone(),
            self.extracts.clone(),
            self.per_host,
            max_depth,
        );

        match session.run(url).await {
            Ok(result) => {
                tracing::info!(
                    "Crawl of {} completed: {} downloaded, {} failed in {:?}",
                    url,
                    result.downloaded.len(),
                    result.errors.len(),
                    start_time.elapsed()
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!("Crawl of {} aborted: {}", url, e);
                Err(e)
            }
        }
    }

    /// Shuts down both pools
    ///
    /// Waits up to the shutdown timeout for running tasks. Crawls still in
    /// progress fail with `PoolClosed` and later `download` calls are rejected.
    pub async fn close(&self) {
        let (downloads, extracts) = tokio::join!(
            self.downloads.close(self.shutdown_timeout),
            self.extracts.close(self.shutdown_timeout)
        );

        if downloads && extracts {
            tracing::info!("Crawler shut down");
        } else {
            tracing::warn!("Crawler shut down with tasks still running");
        }
    }

    /// Returns true once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.downloads.is_closed()
    }
}
