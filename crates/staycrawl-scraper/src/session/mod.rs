//! Rendering session: one browser engine, its default tab, and the pacing
//! and timeout rules every navigation goes through.
//!
//! The engine sits behind [`RenderingEngine`] / [`BrowsingContext`] so the
//! pipeline can run against headless Chromium in production and against an
//! in-memory engine in tests.

mod chromium;
#[cfg(test)]
pub(crate) mod fake;
mod pacing;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

pub use chromium::{ChromiumContext, ChromiumEngine, ChromiumSettings};
pub use pacing::PacingPolicy;

use pacing::Pacer;

/// One tab of the rendering engine.
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    /// Loads `url` in this tab. Unbounded; [`RenderingSession::navigate`]
    /// applies the timeout.
    async fn navigate(&self, url: &str) -> Result<(), ScraperError>;

    /// Resolves once an element matching `selector` exists, or fails with
    /// [`ScraperError::ElementTimeout`] after `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), ScraperError>;

    /// Clicks the first element matching `selector`, waiting up to `timeout`
    /// for it to appear.
    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// Rendered HTML of the current document.
    async fn content(&self) -> Result<String, ScraperError>;

    async fn close(&self) -> Result<(), ScraperError>;
}

/// A running browser engine with one default tab.
#[async_trait]
pub trait RenderingEngine: Send + Sync {
    type Context: BrowsingContext;

    fn default_context(&self) -> &Self::Context;

    /// Opens a fresh blank tab with the session's headers applied.
    async fn new_context(&self) -> Result<Self::Context, ScraperError>;

    async fn shutdown(self) -> Result<(), ScraperError>;
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub navigation_timeout: Duration,
    pub pacing: PacingPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            pacing: PacingPolicy::default(),
        }
    }
}

/// Single-owner wrapper around an engine. Not meant to be shared between
/// concurrent crawls; each crawl owns its own session.
pub struct RenderingSession<E: RenderingEngine> {
    engine: E,
    pacer: Pacer,
    navigation_timeout: Duration,
}

impl<E: RenderingEngine> RenderingSession<E> {
    pub fn new(engine: E, settings: SessionSettings) -> Self {
        Self {
            engine,
            pacer: Pacer::new(settings.pacing),
            navigation_timeout: settings.navigation_timeout,
        }
    }

    /// Navigates the default tab to `location` and returns it.
    ///
    /// # Errors
    ///
    /// See [`Self::navigate`].
    pub async fn open(&self, location: &str) -> Result<&E::Context, ScraperError> {
        let context = self.engine.default_context();
        self.navigate(context, location).await?;
        Ok(context)
    }

    /// Opens a new tab, isolated from the default one.
    ///
    /// # Errors
    ///
    /// Propagates the engine's error; a [`ScraperError::Session`] here means
    /// the browser is gone.
    pub async fn new_isolated_context(&self) -> Result<E::Context, ScraperError> {
        self.engine.new_context().await
    }

    /// Paced, time-bounded navigation of `context`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::NavigationTimeout`] if the page does not load in time.
    /// - Any error the engine reports for the navigation itself.
    pub async fn navigate(&self, context: &E::Context, location: &str) -> Result<(), ScraperError> {
        self.pacer.wait_turn().await;
        tracing::debug!(url = location, "navigating");
        let outcome =
            tokio::time::timeout(self.navigation_timeout, context.navigate(location)).await;
        self.pacer.mark_done().await;
        match outcome {
            Ok(result) => result,
            Err(_) => Err(ScraperError::NavigationTimeout {
                url: location.to_owned(),
                timeout_secs: self.navigation_timeout.as_secs(),
            }),
        }
    }

    pub async fn settle_detail(&self) {
        sleep_unless_zero(self.pacer.policy().detail_settle).await;
    }

    pub async fn settle_consent(&self) {
        sleep_unless_zero(self.pacer.policy().consent_settle).await;
    }

    /// Shuts the engine down. Consumes the session so it can only happen once.
    ///
    /// # Errors
    ///
    /// Propagates the engine's shutdown error.
    pub async fn close(self) -> Result<(), ScraperError> {
        self.engine.shutdown().await
    }
}

async fn sleep_unless_zero(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
