use std::fmt;

/// Lifecycle states of a URL within one crawl session
///
/// ```text
/// Discovered -> Admitted | Deferred | Failed
/// Deferred   -> Admitted
/// Admitted   -> Downloaded | Failed
/// Downloaded -> Extracting -> Extracted
/// ```
///
/// `Admitted` covers both "waiting for a download worker" and "downloading":
/// the per-host in-flight counter treats the two the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// Seen for the first time; not yet submitted anywhere
    Discovered,

    /// Holds a host slot and is queued on or running in the download pool
    Admitted,

    /// Parked until a slot on its host is handed off
    Deferred,

    /// Links are being extracted from the downloaded page
    Extracting,

    // ===== Terminal States =====
    /// Downloaded and at the depth limit, so never extracted
    Downloaded,

    /// Downloaded and its links have been enumerated
    Extracted,

    /// The download (or host resolution) failed with an I/O error
    Failed,
}

impl UrlState {
    /// Returns true if this URL will not be touched again in this session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Downloaded | Self::Extracted | Self::Failed)
    }

    /// Returns true if the page body was fetched successfully
    pub fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded | Self::Extracting | Self::Extracted)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        use UrlState::*;
        matches!(
            (self, next),
            (Discovered, Admitted)
                | (Discovered, Deferred)
                | (Discovered, Failed)
                | (Deferred, Admitted)
                | (Admitted, Downloaded)
                | (Admitted, Failed)
                | (Downloaded, Extracting)
                | (Extracting, Extracted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Admitted => "admitted",
            Self::Deferred => "deferred",
            Self::Extracting => "extracting",
            Self::Downloaded => "downloaded",
            Self::Extracted => "extracted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
