//! Output module for reporting crawl results
//!
//! This module handles:
//! - Summarising a `CrawlResult` into statistics
//! - Rendering those statistics for the console

pub mod stats;

pub use stats::{format_statistics, print_statistics, CrawlStatistics};
