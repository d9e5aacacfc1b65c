//! Configuration module for Ripple-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a missing file section falls back to sane values.
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::validate;
