//! End-to-end crawl: listings page, cards, detail pages, records.

use std::time::Duration;

use reqwest::Url;
use staycrawl_core::{AppConfig, CrawlResult, EmptyReason, Facilities, HotelRecord, SearchRequest};

use crate::assemble::assemble_record;
use crate::card::summarize_card;
use crate::detail::DetailFetcher;
use crate::error::{CardError, ScraperError};
use crate::facilities::FacilityResolver;
use crate::listing::{collect_cards, CardSnapshot, ListingWaits};
use crate::query::build_search_url;
use crate::session::{
    ChromiumEngine, ChromiumSettings, PacingPolicy, RenderingEngine, RenderingSession,
    SessionSettings,
};

/// Slack added on top of the worst-case detail visit.
const DETAIL_BUDGET_SLACK: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub search_base_url: String,
    pub listing_waits: ListingWaits,
    /// Container wait for each facility strategy.
    pub facility_wait: Duration,
    /// Overall time allowed for one detail page.
    pub detail_budget: Duration,
    pub session: SessionSettings,
}

impl CrawlOptions {
    /// Derives crawl options from the application configuration.
    ///
    /// The detail budget covers one pacing gap, a full navigation timeout,
    /// the settle delay, and two facility container waits.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidLocation`] if the configured search base
    /// URL is not an absolute URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Url::parse(&config.search_base_url).map_err(|e| ScraperError::InvalidLocation {
            location: config.search_base_url.clone(),
            reason: e.to_string(),
        })?;

        let pacing = PacingPolicy {
            min_gap: Duration::from_millis(config.pacing_min_ms),
            max_gap: Duration::from_millis(config.pacing_max_ms),
            detail_settle: Duration::from_millis(config.detail_settle_ms),
            ..PacingPolicy::default()
        };
        let session = SessionSettings {
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            pacing,
        };
        let facility_wait = Duration::from_secs(config.facility_wait_secs);
        let detail_budget = pacing.max_gap
            + session.navigation_timeout
            + pacing.detail_settle
            + facility_wait * 2
            + DETAIL_BUDGET_SLACK;

        Ok(Self {
            search_base_url: config.search_base_url.clone(),
            listing_waits: ListingWaits {
                consent: Duration::from_secs(config.consent_wait_secs),
                cards: Duration::from_secs(config.card_wait_secs),
            },
            facility_wait,
            detail_budget,
            session,
        })
    }
}

/// What happened to one listing card.
#[derive(Debug)]
pub enum CardOutcome {
    Assembled(Box<HotelRecord>),
    Skipped(CardError),
}

/// Runs one crawl on an already launched session.
///
/// Cards are processed one at a time in results-page order. A malformed
/// card is skipped and a detail page that fails to load yields
/// [`Facilities::Unavailable`]; neither stops the batch. The session is left
/// open for the caller to close.
///
/// # Errors
///
/// Returns [`ScraperError::Session`] if the browser dies. No partial result
/// is returned in that case.
pub async fn run_crawl<E: RenderingEngine>(
    session: &RenderingSession<E>,
    request: &SearchRequest,
    options: &CrawlOptions,
) -> Result<CrawlResult, ScraperError> {
    let listings_url = match build_search_url(&options.search_base_url, request) {
        Ok(url) => url,
        Err(e) => return Ok(unavailable(&e)),
    };
    tracing::info!(
        destination = request.destination(),
        url = %listings_url,
        cap = request.result_cap(),
        "starting crawl"
    );

    let listings = match session.open(listings_url.as_str()).await {
        Ok(tab) => tab,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => return Ok(unavailable(&e)),
    };

    let cap = request.result_cap();
    let cards = match collect_cards(session, listings, &options.listing_waits, cap).await {
        Ok(cards) => cards,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => return Ok(unavailable(&e)),
    };
    if cards.is_empty() {
        return Ok(CrawlResult::empty(EmptyReason::NoListings));
    }

    let fetcher = DetailFetcher::new(
        FacilityResolver::with_wait(options.facility_wait),
        options.detail_budget,
    );

    let mut result = CrawlResult {
        cards_seen: cards.len(),
        ..CrawlResult::default()
    };
    for card in &cards {
        match process_card(session, &fetcher, card, &listings_url, cards.len()).await? {
            CardOutcome::Assembled(record) => result.records.push(*record),
            CardOutcome::Skipped(e) => {
                tracing::warn!(card = card.index, error = %e, "skipping malformed card");
                result.cards_skipped += 1;
            }
        }
    }

    if result.records.is_empty() {
        result.empty_reason = Some(EmptyReason::AllCardsSkipped);
    }
    tracing::info!(
        cards_seen = result.cards_seen,
        cards_skipped = result.cards_skipped,
        records = result.records_assembled(),
        "crawl finished"
    );
    Ok(result)
}

async fn process_card<E: RenderingEngine>(
    session: &RenderingSession<E>,
    fetcher: &DetailFetcher,
    card: &CardSnapshot,
    listings_url: &Url,
    total: usize,
) -> Result<CardOutcome, ScraperError> {
    let summary = match summarize_card(card, listings_url) {
        Ok(summary) => summary,
        Err(e) => return Ok(CardOutcome::Skipped(e)),
    };
    tracing::info!(
        card = card.index + 1,
        total,
        name = %summary.name,
        "processing listing"
    );

    let facilities = match fetcher.fetch(session, &summary.detail_url).await {
        Ok(facilities) => facilities,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            tracing::warn!(url = %summary.detail_url, error = %e, "could not open detail tab");
            Facilities::Unavailable
        }
    };

    Ok(CardOutcome::Assembled(Box::new(assemble_record(
        summary, facilities,
    ))))
}

fn unavailable(err: &ScraperError) -> CrawlResult {
    tracing::warn!(error = %err, "results page unavailable");
    CrawlResult::empty(EmptyReason::ListingsUnavailable {
        reason: err.to_string(),
    })
}

/// Launches headless Chromium, runs one crawl, and shuts the browser down.
///
/// # Errors
///
/// - [`ScraperError::InvalidLocation`] for an unusable search base URL.
/// - [`ScraperError::Session`] if the browser cannot start or dies mid-crawl.
pub async fn crawl_with_chromium(
    config: &AppConfig,
    request: &SearchRequest,
) -> Result<CrawlResult, ScraperError> {
    let options = CrawlOptions::from_config(config)?;
    let engine = ChromiumEngine::launch(ChromiumSettings {
        headless: config.headless,
        user_agent: config.user_agent.clone(),
        accept_language: config.accept_language.clone(),
    })
    .await?;
    let session = RenderingSession::new(engine, options.session);

    let outcome = run_crawl(&session, request, &options).await;
    let closed = session.close().await;

    match (outcome, closed) {
        (Ok(result), Ok(())) => Ok(result),
        (Ok(result), Err(e)) => {
            tracing::warn!(error = %e, "browser did not shut down cleanly");
            Ok(result)
        }
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                tracing::debug!(error = %close_err, "browser shutdown after failure");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
