pub mod assemble;
pub mod card;
pub mod detail;
pub mod error;
pub mod facilities;
pub mod listing;
pub mod pipeline;
pub mod query;
pub(crate) mod rate_limit;
pub mod robots;
pub mod session;

pub use assemble::assemble_record;
pub use card::summarize_card;
pub use detail::DetailFetcher;
pub use error::{CardError, RobotsError, ScraperError};
pub use facilities::{FacilityResolver, FacilityStrategy};
pub use listing::{collect_cards, CardSnapshot, ListingWaits};
pub use pipeline::{crawl_with_chromium, run_crawl, CardOutcome, CrawlOptions};
pub use query::build_search_url;
pub use robots::{RobotsAdvisor, RobotsReport, RobotsSource};
pub use session::{
    BrowsingContext, ChromiumEngine, ChromiumSettings, PacingPolicy, RenderingEngine,
    RenderingSession, SessionSettings,
};
