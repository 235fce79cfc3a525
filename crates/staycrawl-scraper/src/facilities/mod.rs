//! Facility extraction from a hotel detail page.
//!
//! Detail pages come in several layouts. [`FacilityResolver`] tries one
//! [`FacilityStrategy`] per layout, in order, and stops at the first one that
//! yields at least one label after de-duplication. A strategy that errs (its
//! container never appears, the DOM cannot be read) and a strategy that
//! finds nothing are treated the same way: the resolver moves on.

mod strategies;

use std::time::Duration;

use async_trait::async_trait;
use staycrawl_core::{Facilities, FacilityList};

use crate::error::ScraperError;
use crate::session::BrowsingContext;

pub use strategies::{FacilityIcons, Highlights, PopularFacilities};

/// One page layout the resolver knows how to read.
#[async_trait]
pub trait FacilityStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw labels found on the current page of `context`. `wait` bounds how
    /// long the strategy may wait for its container.
    async fn attempt(
        &self,
        context: &dyn BrowsingContext,
        wait: Duration,
    ) -> Result<Vec<String>, ScraperError>;
}

pub struct FacilityResolver {
    strategies: Vec<Box<dyn FacilityStrategy>>,
    wait: Duration,
}

impl Default for FacilityResolver {
    /// Highlights, then popular facilities, then bare facility icons, with a
    /// 3 s container wait.
    fn default() -> Self {
        Self::new(
            vec![
                Box::new(Highlights),
                Box::new(PopularFacilities),
                Box::new(FacilityIcons),
            ],
            Duration::from_secs(3),
        )
    }
}

impl FacilityResolver {
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn FacilityStrategy>>, wait: Duration) -> Self {
        Self { strategies, wait }
    }

    /// Default strategy chain with a custom container wait.
    #[must_use]
    pub fn with_wait(wait: Duration) -> Self {
        Self {
            wait,
            ..Self::default()
        }
    }

    /// Runs the strategy chain against the page currently loaded in
    /// `context`.
    ///
    /// Returns [`Facilities::NotFound`] when every strategy came up empty.
    ///
    /// # Errors
    ///
    /// Only [`ScraperError::Session`] is returned; every other strategy
    /// failure advances the chain.
    pub async fn resolve(&self, context: &dyn BrowsingContext) -> Result<Facilities, ScraperError> {
        for strategy in &self.strategies {
            match strategy.attempt(context, self.wait).await {
                Ok(raw) => {
                    let list = FacilityList::from_labels(raw);
                    if list.is_empty() {
                        tracing::debug!(strategy = strategy.name(), "strategy found no facilities");
                        continue;
                    }
                    tracing::debug!(
                        strategy = strategy.name(),
                        facilities = list.len(),
                        "facilities resolved"
                    );
                    return Ok(Facilities::Listed(list));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::debug!(strategy = strategy.name(), error = %e, "strategy failed");
                }
            }
        }
        Ok(Facilities::NotFound)
    }
}
