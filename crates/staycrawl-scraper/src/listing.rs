//! Listing collection from the rendered search-results page.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{Html, Selector};

use crate::error::ScraperError;
use crate::session::{BrowsingContext, RenderingEngine, RenderingSession};

pub(crate) const CONSENT_BUTTON: &str = "button#onetrust-accept-btn-handler";
pub(crate) const PROPERTY_CARD: &str = r#"div[data-testid="property-card"]"#;

static PROPERTY_CARD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(PROPERTY_CARD).expect("valid property card selector"));

/// Outer HTML of one listing card, captured from the rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSnapshot {
    /// Zero-based position on the results page.
    pub index: usize,
    pub html: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ListingWaits {
    /// How long the consent button may take to appear.
    pub consent: Duration,
    /// How long the first listing card may take to appear.
    pub cards: Duration,
}

impl Default for ListingWaits {
    fn default() -> Self {
        Self {
            consent: Duration::from_secs(5),
            cards: Duration::from_secs(30),
        }
    }
}

/// Collects up to `cap` cards, in document order, from the listings tab.
///
/// A missing consent overlay is ignored. If no card shows up within
/// `waits.cards` the result is an empty list.
///
/// # Errors
///
/// - [`ScraperError::Session`] if the browser dies.
/// - Any error reading the rendered document.
pub async fn collect_cards<E: RenderingEngine>(
    session: &RenderingSession<E>,
    listings: &E::Context,
    waits: &ListingWaits,
    cap: usize,
) -> Result<Vec<CardSnapshot>, ScraperError> {
    dismiss_consent(session, listings, waits.consent).await?;

    match listings.wait_for_selector(PROPERTY_CARD, waits.cards).await {
        Ok(()) => {}
        Err(e) if e.is_fatal() => return Err(e),
        Err(ScraperError::ElementTimeout { .. }) => {
            tracing::info!(
                wait_secs = waits.cards.as_secs(),
                "no listing cards appeared"
            );
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    }

    let html = listings.content().await?;
    let cards = snapshot_cards(&html, cap);
    tracing::info!(cards = cards.len(), cap, "collected listing cards");
    Ok(cards)
}

async fn dismiss_consent<E: RenderingEngine>(
    session: &RenderingSession<E>,
    listings: &E::Context,
    wait: Duration,
) -> Result<(), ScraperError> {
    match listings.click(CONSENT_BUTTON, wait).await {
        Ok(()) => {
            tracing::debug!("consent overlay dismissed");
            session.settle_consent().await;
            Ok(())
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "no consent overlay to dismiss");
            Ok(())
        }
    }
}

/// Selects property cards in document order, keeping at most `cap`.
pub(crate) fn snapshot_cards(html: &str, cap: usize) -> Vec<CardSnapshot> {
    let document = Html::parse_document(html);
    document
        .select(&PROPERTY_CARD_SELECTOR)
        .take(cap)
        .enumerate()
        .map(|(index, card)| CardSnapshot {
            index,
            html: card.html(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fake::{FakeEngine, FakePage};
    use crate::session::{PacingPolicy, SessionSettings};

    fn card(name: &str) -> String {
        format!(
            r#"<div data-testid="property-card"><div data-testid="title">{name}</div><a href="/hotel/{name}.html">x</a></div>"#
        )
    }

    fn page(body: &str) -> String {
        format!("<html><body>{body}</body></html>")
    }

    fn session(engine: FakeEngine) -> RenderingSession<FakeEngine> {
        RenderingSession::new(
            engine,
            SessionSettings {
                navigation_timeout: Duration::from_secs(60),
                pacing: PacingPolicy::none(),
            },
        )
    }

    #[test]
    fn snapshot_keeps_document_order_and_cap() {
        let html = page(&[card("a"), card("b"), card("c")].concat());
        let cards = snapshot_cards(&html, 2);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].index, 0);
        assert!(cards[0].html.contains(">a<"));
        assert!(cards[1].html.contains(">b<"));
    }

    #[test]
    fn snapshot_of_page_without_cards_is_empty() {
        assert!(snapshot_cards(&page("<p>nothing</p>"), 20).is_empty());
    }

    #[tokio::test]
    async fn clicks_consent_when_present() {
        let body = format!(
            r#"<button id="onetrust-accept-btn-handler">OK</button>{}"#,
            card("a")
        );
        let engine = FakeEngine::new().with_page("https://x/list", FakePage::html(&page(&body)));
        let stats = engine.stats();
        let session = session(engine);
        let tab = session.open("https://x/list").await.unwrap();

        let cards = collect_cards(&session, tab, &ListingWaits::default(), 20)
            .await
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(stats.clicks(), vec![CONSENT_BUTTON.to_owned()]);
    }

    #[tokio::test]
    async fn missing_consent_and_cards_yield_empty_list() {
        let engine = FakeEngine::new().with_page(
            "https://x/list",
            FakePage::html(&page("<p>Sorry, no results</p>")),
        );
        let stats = engine.stats();
        let session = session(engine);
        let tab = session.open("https://x/list").await.unwrap();

        let cards = collect_cards(&session, tab, &ListingWaits::default(), 20)
            .await
            .unwrap();
        assert!(cards.is_empty());
        assert!(stats.clicks().is_empty());
    }
}
