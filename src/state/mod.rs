//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `HostAdmission`: per-host in-flight counters and deferred download queues
//! - `UrlState`: lifecycle of a single URL within one crawl session

mod host_admission;
mod url_state;

// Re-export main types
pub use host_admission::{Admission, HostAdmission};
pub use url_state::UrlState;
