//! Fixed-size worker pools
//!
//! A pool of size N is a semaphore with N permits: every submitted job is spawned
//! onto the runtime immediately but only runs once it holds a permit, so at most
//! N jobs from the pool execute at any moment. Waiting jobs are served in
//! submission order (tokio semaphores are fair).

use crate::{CrawlError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Handle to a job submitted to a `WorkerPool`
pub type PoolHandle<T> = JoinHandle<Result<T>>;

/// A named, fixed-size pool of workers
///
/// Cloning is cheap and yields another handle to the same pool.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    size: usize,
    permits: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Creates a pool running at most `size` jobs at once
    ///
    /// Does not touch the runtime, so pools can be built outside of one.
    pub fn new(name: &'static str, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name,
            size,
            permits: Arc::new(Semaphore::new(size)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Submits an async job
    ///
    /// The returned handle resolves to `Err(CrawlError::PoolClosed)` if the pool
    /// was closed before the job got a worker.
    pub fn submit<F, T>(&self, job: F) -> PoolHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let closed = Arc::clone(&self.closed);

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Err(CrawlError::PoolClosed),
            };
            if closed.load(Ordering::Acquire) {
                return Err(CrawlError::PoolClosed);
            }
            Ok(job.await)
        })
    }

    /// Submits a blocking (CPU-bound) job
    ///
    /// The job runs on tokio's blocking thread pool while holding one of this
    /// pool's permits. A panic inside the job is re-raised so that it surfaces
    /// as a panicked handle, same as for `submit`.
    pub fn submit_blocking<F, T>(&self, job: F) -> PoolHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let closed = Arc::clone(&self.closed);

        tokio::spawn(async move {
            let permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Err(CrawlError::PoolClosed),
            };
            if closed.load(Ordering::Acquire) {
                return Err(CrawlError::PoolClosed);
            }

            let outcome = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job()
            })
            .await;

            match outcome {
                Ok(value) => Ok(value),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => Err(CrawlError::PoolClosed),
            }
        })
    }

    /// Stops accepting work and waits for running jobs to finish
    ///
    /// Jobs still waiting for a worker fail with `PoolClosed`. Returns false if
    /// running jobs did not finish within `timeout`; the pool is closed either way.
    pub async fn close(&self, timeout: Duration) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return true;
        }

        let all = u32::try_from(self.size).unwrap_or(u32::MAX);
        let drained = matches!(
            tokio::time::timeout(timeout, self.permits.acquire_many(all)).await,
            Ok(Ok(_))
        );
        self.permits.close();

        if drained {
            tracing::debug!("{} pool shut down", self.name);
        } else {
            tracing::warn!(
                "{} pool did not drain within {:?}; abandoning running jobs",
                self.name,
                timeout
            );
        }
        drained
    }
}
