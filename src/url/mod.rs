//! URL handling module for Ripple-Crawler
//!
//! URLs are opaque strings everywhere in the crawler: two URLs are the same page
//! exactly when their strings are equal. The only structure the crawler ever
//! looks at is the host, which keys per-host admission control.

mod host;

pub use host::host_of;
