//! Detail-page visits in isolated tabs.

use std::time::Duration;

use staycrawl_core::Facilities;

use crate::error::ScraperError;
use crate::facilities::FacilityResolver;
use crate::session::{BrowsingContext, RenderingEngine, RenderingSession};

pub struct DetailFetcher {
    resolver: FacilityResolver,
    /// Upper bound for navigation, settling, and facility resolution of one
    /// detail page together.
    budget: Duration,
}

impl DetailFetcher {
    #[must_use]
    pub fn new(resolver: FacilityResolver, budget: Duration) -> Self {
        Self { resolver, budget }
    }

    /// Opens `detail_url` in a fresh tab, resolves its facilities, and closes
    /// the tab again whatever happened in between.
    ///
    /// A detail page that fails to load, or that does not finish within the
    /// budget, yields [`Facilities::Unavailable`].
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Session`] if the browser dies.
    /// - Any error opening the tab itself.
    pub async fn fetch<E: RenderingEngine>(
        &self,
        session: &RenderingSession<E>,
        detail_url: &str,
    ) -> Result<Facilities, ScraperError> {
        let tab = session.new_isolated_context().await?;

        let visit = async {
            session.navigate(&tab, detail_url).await?;
            session.settle_detail().await;
            self.resolver.resolve(&tab).await
        };
        let outcome = tokio::time::timeout(self.budget, visit).await;

        if let Err(e) = tab.close().await {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::warn!(url = detail_url, error = %e, "failed to close detail tab");
        }

        match outcome {
            Ok(Ok(facilities)) => Ok(facilities),
            Ok(Err(e)) if e.is_fatal() => Err(e),
            Ok(Err(e)) => {
                tracing::warn!(url = detail_url, error = %e, "detail page unavailable");
                Ok(Facilities::Unavailable)
            }
            Err(_) => {
                tracing::warn!(
                    url = detail_url,
                    budget_secs = self.budget.as_secs(),
                    "detail page exceeded its time budget"
                );
                Ok(Facilities::Unavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fake::{FakeEngine, FakePage};
    use crate::session::{PacingPolicy, SessionSettings};

    const DETAIL: &str = r#"<html><body><ul>
        <li><span data-testid="facility-icon"></span><div class="b99b6ef58f">Lift</div></li>
    </ul></body></html>"#;

    fn session(engine: FakeEngine) -> RenderingSession<FakeEngine> {
        RenderingSession::new(
            engine,
            SessionSettings {
                navigation_timeout: Duration::from_secs(60),
                pacing: PacingPolicy::none(),
            },
        )
    }

    fn fetcher() -> DetailFetcher {
        DetailFetcher::new(
            FacilityResolver::with_wait(Duration::from_millis(10)),
            Duration::from_secs(90),
        )
    }

    #[tokio::test]
    async fn resolves_and_closes_tab() {
        let engine = FakeEngine::new().with_page("https://x/h1", FakePage::html(DETAIL));
        let stats = engine.stats();
        let session = session(engine);

        let facilities = fetcher().fetch(&session, "https://x/h1").await.unwrap();
        assert_eq!(facilities.labels(), vec!["Lift"]);
        assert_eq!(stats.opened(), 1);
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn failed_navigation_is_unavailable_and_closes_tab() {
        let engine = FakeEngine::new().with_page("https://x/h1", FakePage::Fail);
        let stats = engine.stats();
        let session = session(engine);

        let facilities = fetcher().fetch(&session, "https://x/h1").await.unwrap();
        assert_eq!(facilities, Facilities::Unavailable);
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_page_is_cut_off_by_budget() {
        let engine = FakeEngine::new().with_page("https://x/h1", FakePage::Hang);
        let stats = engine.stats();
        let session = session(engine);
        let fetcher = DetailFetcher::new(FacilityResolver::default(), Duration::from_secs(10));

        let facilities = fetcher.fetch(&session, "https://x/h1").await.unwrap();
        assert_eq!(facilities, Facilities::Unavailable);
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn crashed_browser_is_fatal() {
        let engine = FakeEngine::new().with_page("https://x/h1", FakePage::Crash);
        let stats = engine.stats();
        let session = session(engine);

        let err = fetcher().fetch(&session, "https://x/h1").await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(stats.closed(), 1);
    }
}
