//! Statistics for a finished crawl
//!
//! This module turns a `CrawlResult` into counts and renders them for the
//! command-line front end.

use crate::crawler::CrawlResult;
use crate::url::host_of;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::io;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Number of URLs attempted (downloaded + failed)
    pub total_attempted: usize,

    /// Number of URLs downloaded successfully
    pub downloaded: usize,

    /// Number of URLs that failed
    pub failed: usize,

    /// Downloaded pages per host
    pub pages_by_host: BTreeMap<String, usize>,

    /// Failures grouped by I/O error kind
    pub errors_by_kind: HashMap<io::ErrorKind, usize>,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Computes statistics from a crawl result
    pub fn from_result(result: &CrawlResult, elapsed: Duration) -> Self {
        let mut pages_by_host = BTreeMap::new();
        for url in &result.downloaded {
            let host = host_of(url).unwrap_or_else(|_| "<unknown>".to_string());
            *pages_by_host.entry(host).or_insert(0) += 1;
        }

        let mut errors_by_kind = HashMap::new();
        for err in result.errors.values() {
            *errors_by_kind.entry(err.kind()).or_insert(0) += 1;
        }

        Self {
            total_attempted: result.attempted(),
            downloaded: result.downloaded.len(),
            failed: result.errors.len(),
            pages_by_host,
            errors_by_kind,
            elapsed,
        }
    }

    /// Percentage of attempted URLs that were downloaded
    pub fn success_rate(&self) -> f64 {
        if self.total_attempted > 0 {
            (self.downloaded as f64 / self.total_attempted as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Renders a crawl result and its statistics as console text
pub fn format_statistics(result: &CrawlResult, stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  URLs attempted: {}", stats.total_attempted);
    let _ = writeln!(out, "  Downloaded: {}", stats.downloaded);
    let _ = writeln!(out, "  Failed: {}", stats.failed);
    let _ = writeln!(out, "  Elapsed: {:.2?}", stats.elapsed);
    let _ = writeln!(out);

    if !stats.pages_by_host.is_empty() {
        let _ = writeln!(out, "Pages by Host:");
        let mut host_counts: Vec<_> = stats.pages_by_host.iter().collect();
        host_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (host, count) in host_counts {
            let _ = writeln!(out, "  {}: {}", host, count);
        }
        let _ = writeln!(out);
    }

    if !stats.errors_by_kind.is_empty() {
        let _ = writeln!(out, "Failures by Kind:");
        let mut kind_counts: Vec<_> = stats.errors_by_kind.iter().collect();
        kind_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (kind, count) in kind_counts {
            let _ = writeln!(out, "  {:?}: {}", kind, count);
        }
        let _ = writeln!(out);
    }

    if !result.downloaded.is_empty() {
        let _ = writeln!(out, "Downloaded:");
        for url in &result.downloaded {
            let _ = writeln!(out, "  {}", url);
        }
        let _ = writeln!(out);
    }

    if !result.errors.is_empty() {
        let _ = writeln!(out, "Errors:");
        let mut errors: Vec<_> = result.errors.iter().collect();
        errors.sort_by(|a, b| a.0.cmp(b.0));
        for (url, err) in errors {
            let _ = writeln!(out, "  {}: {}", url, err);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} URLs downloaded)",
        stats.success_rate(),
        stats.downloaded,
        stats.total_attempted
    );

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(result: &CrawlResult, stats: &CrawlStatistics) {
    print!("{}", format_statistics(result, stats));
}
