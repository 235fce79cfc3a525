use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime settings for a crawl, the table writer, and the robots lookup.
///
/// Every field has a default; see [`crate::config::load_app_config`] for the
/// variable names.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub search_base_url: String,
    pub user_agent: String,
    pub accept_language: String,
    pub headless: bool,
    pub navigation_timeout_secs: u64,
    pub card_wait_secs: u64,
    pub consent_wait_secs: u64,
    pub facility_wait_secs: u64,
    /// Lower bound of the random gap enforced between two navigations.
    pub pacing_min_ms: u64,
    /// Upper bound of the random gap enforced between two navigations.
    pub pacing_max_ms: u64,
    /// Fixed wait after a detail page has loaded, before facilities are read.
    pub detail_settle_ms: u64,
    pub output_dir: PathBuf,
    pub robots_domain: String,
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
    pub http_backoff_base_secs: u64,
}
