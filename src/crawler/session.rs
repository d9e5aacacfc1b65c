//! Crawl session - one traversal from a seed URL
//!
//! A session owns everything that lives for the duration of a single
//! `Crawler::download` call:
//! - the visited map (each URL is submitted at most once)
//! - the per-host admission controller
//! - the FIFO of pending task handles
//! - the downloaded list and the per-URL error map
//!
//! Workers never touch the result accumulators. Each finished task returns an
//! event through its handle and the session loop, the only consumer, folds it
//! into the result and submits follow-on work.

use crate::crawler::pool::{PoolHandle, WorkerPool};
use crate::crawler::{Document, Downloader};
use crate::state::{Admission, HostAdmission, UrlState};
use crate::url::host_of;
use crate::{CrawlError, Result};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;

/// Outcome of a crawl
#[derive(Debug, Default)]
pub struct CrawlResult {
    /// Successfully downloaded URLs, in the order the session consumed them
    pub downloaded: Vec<String>,

    /// URLs whose download failed, with the failure
    pub errors: HashMap<String, io::Error>,
}

impl CrawlResult {
    /// Number of URLs the crawl attempted
    pub fn attempted(&self) -> usize {
        self.downloaded.len() + self.errors.len()
    }

    /// Returns true if no download failed
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A download waiting for (or holding) a host slot
#[derive(Debug)]
struct DownloadJob {
    url: String,
    host: String,
    depth: u32,
}

/// What a finished task reports back to the session loop
enum TaskEvent {
    Download {
        job: DownloadJob,
        result: io::Result<Arc<dyn Document>>,
        /// Deferred job that inherited this job's host slot, already submitted
        handoff: Option<(TaskHandle, String)>,
    },
    Extract {
        url: String,
        depth: u32,
        links: io::Result<Vec<String>>,
    },
}

type TaskHandle = PoolHandle<TaskEvent>;

/// State shared between the session loop and its download workers
struct SessionShared {
    downloader: Arc<dyn Downloader>,
    downloads: WorkerPool,
    admission: HostAdmission<DownloadJob>,
}

/// Submits an admitted job to the download pool
///
/// When the download finishes (successfully or not) the worker releases the
/// host slot right away; if a deferred job takes it over, that job is submitted
/// from the worker and its handle rides back on the event.
fn spawn_download(shared: &Arc<SessionShared>, job: DownloadJob) -> TaskHandle {
    let ctx = Arc::clone(shared);
    shared.downloads.submit(async move {
        tracing::debug!("Downloading {} (depth {})", job.url, job.depth);
        let result = ctx.downloader.download(&job.url).await;

        let handoff = ctx.admission.release(&job.host).map(|next| {
            let url = next.url.clone();
            (spawn_download(&ctx, next), url)
        });

        TaskEvent::Download {
            job,
            result,
            handoff,
        }
    })
}

/// The traversal state for one `download(url, depth)` call
pub struct CrawlSession {
    shared: Arc<SessionShared>,
    extracts: WorkerPool,
    max_depth: u32,
    visited: HashMap<String, UrlState>,
    pending: VecDeque<(TaskHandle, String)>,
    downloaded: Vec<String>,
    errors: HashMap<String, io::Error>,
}

impl CrawlSession {
    /// Creates a session with fresh visited, admission, and result state
    ///
    /// # Arguments
    ///
    /// * `downloader` - Turns URLs into documents
    /// * `downloads` - Pool running download jobs
    /// * `extracts` - Pool running link extraction
    /// * `per_host` - Maximum simultaneous downloads per host
    /// * `max_depth` - Depth of the deepest pages to download (seed is 1)
    pub fn new(
        downloader: Arc<dyn Downloader>,
        downloads: WorkerPool,
        extracts: WorkerPool,
        per_host: usize,
        max_depth: u32,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                downloader,
                downloads,
                admission: HostAdmission::new(per_host),
            }),
            extracts,
            max_depth,
            visited: HashMap::new(),
            pending: VecDeque::new(),
            downloaded: Vec::new(),
            errors: HashMap::new(),
        }
    }

    /// Crawls from `seed` until no work is left
    ///
    /// Handles are awaited in submission order, which keeps `downloaded` close to
    /// breadth-first order while later tasks keep running in the background.
    ///
    /// # Errors
    ///
    /// Per-URL I/O failures end up in the result. Only fatal conditions abort:
    /// a closed pool (`PoolClosed`), a panicking task (`TaskPanicked`) or a task
    /// cancelled by the runtime (`TaskCancelled`).
    pub async fn run(&mut self, seed: &str) -> Result<CrawlResult> {
        self.discover(seed.to_string(), 1);

        while let Some((handle, url)) = self.pending.pop_front() {
            let event = match handle.await {
                Ok(event) => event?,
                Err(e) if e.is_panic() => return Err(CrawlError::TaskPanicked { url }),
                Err(_) => return Err(CrawlError::TaskCancelled { url }),
            };

            match event {
                TaskEvent::Download {
                    job,
                    result,
                    handoff,
                } => self.on_download(job, result, handoff),
                TaskEvent::Extract { url, depth, links } => self.on_extract(url, depth, links),
            }
        }

        Ok(CrawlResult {
            downloaded: std::mem::take(&mut self.downloaded),
            errors: std::mem::take(&mut self.errors),
        })
    }

    /// Current state of `url`, or `None` if the session never saw it
    pub fn state_of(&self, url: &str) -> Option<UrlState> {
        self.visited.get(url).copied()
    }

    /// Number of distinct URLs seen so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Marks `url` visited and submits it for download at `depth`
    ///
    /// URLs that were already visited are ignored. A URL whose host cannot be
    /// determined fails immediately without taking a slot.
    fn discover(&mut self, url: String, depth: u32) {
        if self.visited.contains_key(&url) {
            tracing::trace!("Skipping already visited {}", url);
            return;
        }
        self.visited.insert(url.clone(), UrlState::Discovered);

        let host = match host_of(&url) {
            Ok(host) => host,
            Err(e) => {
                tracing::debug!("Cannot resolve host of {}: {}", url, e);
                self.advance(&url, UrlState::Failed);
                self.errors.insert(url, e.into());
                return;
            }
        };

        let job = DownloadJob {
            url: url.clone(),
            host: host.clone(),
            depth,
        };
        let admission = self.shared.admission.try_admit(&host, job);
        match admission {
            Admission::Admitted(job) => {
                self.advance(&url, UrlState::Admitted);
                let handle = spawn_download(&self.shared, job);
                self.pending.push_back((handle, url));
            }
            Admission::Deferred => {
                tracing::debug!("Host {} is at capacity, deferring {}", host, url);
                self.advance(&url, UrlState::Deferred);
            }
        }
    }

    fn on_download(
        &mut self,
        job: DownloadJob,
        result: io::Result<Arc<dyn Document>>,
        handoff: Option<(TaskHandle, String)>,
    ) {
        let DownloadJob { url, depth, .. } = job;

        match result {
            Ok(document) => {
                self.advance(&url, UrlState::Downloaded);
                self.downloaded.push(url.clone());
                self.push_handoff(handoff);

                if depth < self.max_depth {
                    self.advance(&url, UrlState::Extracting);
                    let source = url.clone();
                    let handle = self.extracts.submit_blocking(move || TaskEvent::Extract {
                        links: document.extract_links(),
                        url: source,
                        depth,
                    });
                    self.pending.push_back((handle, url));
                }
            }
            Err(e) => {
                tracing::debug!("Download of {} failed: {}", url, e);
                self.advance(&url, UrlState::Failed);
                self.errors.insert(url, e);
                self.push_handoff(handoff);
            }
        }
    }

    fn on_extract(&mut self, url: String, depth: u32, links: io::Result<Vec<String>>) {
        self.advance(&url, UrlState::Extracted);

        match links {
            Ok(links) => {
                tracing::debug!("Found {} links on {}", links.len(), url);
                for link in links {
                    self.discover(link, depth + 1);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to extract links from {}: {}", url, e);
            }
        }
    }

    fn push_handoff(&mut self, handoff: Option<(TaskHandle, String)>) {
        if let Some((handle, url)) = handoff {
            self.advance(&url, UrlState::Admitted);
            self.pending.push_back((handle, url));
        }
    }

    fn advance(&mut self, url: &str, next: UrlState) {
        if let Some(state) = self.visited.get_mut(url) {
            if !state.can_transition_to(next) {
                tracing::warn!("Unexpected transition for {}: {} -> {}", url, state, next);
            }
            *state = next;
        }
    }
}

impl Drop for CrawlSession {
    /// Tears down whatever is still in flight when the session ends early
    /// (fatal error, or the `download` future being dropped).
    fn drop(&mut self) {
        let deferred = self.shared.admission.abandon();
        let pending = self.pending.len();
        for (handle, _) in self.pending.drain(..) {
            handle.abort();
        }

        if deferred > 0 || pending > 0 {
            tracing::debug!(
                "Abandoned crawl session: {} pending tasks aborted, {} deferred downloads dropped",
                pending,
                deferred
            );
        }
    }
}
