use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// The rendering engine could not start or stopped responding. Fatal for
    /// the whole crawl.
    #[error("rendering session failed: {0}")]
    Session(String),

    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element \"{selector}\" did not appear within {timeout_ms}ms")]
    ElementTimeout { selector: String, timeout_ms: u64 },

    #[error("page script failed: {0}")]
    Script(String),

    #[error("invalid location \"{location}\": {reason}")]
    InvalidLocation { location: String, reason: String },
}

impl ScraperError {
    /// Only a broken rendering session aborts a crawl; everything else is
    /// resolved per card.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScraperError::Session(_))
    }
}

/// Why a single listing card was dropped from the batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("card {index} has no name")]
    MissingName { index: usize },

    #[error("card {index} ({name}) has no detail link")]
    MissingDetailLink { index: usize, name: String },

    #[error("card {index} ({name}) has an unusable detail link \"{href}\"")]
    InvalidDetailLink {
        index: usize,
        name: String,
        href: String,
    },
}

/// Failures of the robots.txt lookup.
#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("robots.txt at {url} could not be parsed: {reason}")]
    Parse { url: String, reason: String },

    #[error("invalid domain \"{domain}\": {reason}")]
    InvalidDomain { domain: String, reason: String },
}
