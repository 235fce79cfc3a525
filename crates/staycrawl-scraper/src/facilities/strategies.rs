use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::FacilityStrategy;
use crate::card::collapse_whitespace;
use crate::error::ScraperError;
use crate::session::BrowsingContext;

const HIGHLIGHTS_CONTAINER: &str = r#"div[data-testid="property-highlights"]"#;
const POPULAR_CONTAINER: &str = r#"div[data-testid="property-most-popular-facilities-wrapper"]"#;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid facility selector")
}

static HIGHLIGHTS_SCOPE: LazyLock<Selector> = LazyLock::new(|| selector(HIGHLIGHTS_CONTAINER));
static POPULAR_SCOPE: LazyLock<Selector> = LazyLock::new(|| selector(POPULAR_CONTAINER));
static ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static HIGHLIGHT_LABEL: LazyLock<Selector> =
    LazyLock::new(|| selector("div.b99b6ef58f.b2b0196c65"));
static POPULAR_LABEL: LazyLock<Selector> = LazyLock::new(|| selector("span.f6b6d2a959"));
static GENERIC_LABEL: LazyLock<Selector> = LazyLock::new(|| selector("div.b99b6ef58f"));
static FACILITY_ICON: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-testid="facility-icon"]"#));

/// The highlights strip near the top of the page.
pub struct Highlights;

/// The "most popular facilities" block.
pub struct PopularFacilities;

/// Any list item carrying a facility icon, wherever it sits on the page.
pub struct FacilityIcons;

#[async_trait]
impl FacilityStrategy for Highlights {
    fn name(&self) -> &'static str {
        "highlights"
    }

    async fn attempt(
        &self,
        context: &dyn BrowsingContext,
        wait: Duration,
    ) -> Result<Vec<String>, ScraperError> {
        context.wait_for_selector(HIGHLIGHTS_CONTAINER, wait).await?;
        let html = context.content().await?;
        Ok(scoped_labels(&html, &HIGHLIGHTS_SCOPE, &[&HIGHLIGHT_LABEL]))
    }
}

#[async_trait]
impl FacilityStrategy for PopularFacilities {
    fn name(&self) -> &'static str {
        "popular"
    }

    async fn attempt(
        &self,
        context: &dyn BrowsingContext,
        wait: Duration,
    ) -> Result<Vec<String>, ScraperError> {
        context.wait_for_selector(POPULAR_CONTAINER, wait).await?;
        let html = context.content().await?;
        Ok(scoped_labels(
            &html,
            &POPULAR_SCOPE,
            &[&POPULAR_LABEL, &GENERIC_LABEL],
        ))
    }
}

#[async_trait]
impl FacilityStrategy for FacilityIcons {
    fn name(&self) -> &'static str {
        "facility-icons"
    }

    async fn attempt(
        &self,
        context: &dyn BrowsingContext,
        _wait: Duration,
    ) -> Result<Vec<String>, ScraperError> {
        let html = context.content().await?;
        Ok(icon_labels(&html))
    }
}

/// Labels of the `li` items inside every `scope` container. For each item the
/// first label selector that matches wins.
fn scoped_labels(html: &str, scope: &Selector, labels: &[&Selector]) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(scope)
        .flat_map(|container| container.select(&ITEM))
        .filter_map(|item| {
            labels
                .iter()
                .find_map(|label| item.select(label).next())
                .map(text_of)
        })
        .collect()
}

fn icon_labels(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&FACILITY_ICON)
        .filter_map(nearest_list_item)
        .filter_map(|item| item.select(&GENERIC_LABEL).next())
        .map(text_of)
        .collect()
}

fn nearest_list_item(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "li")
}

fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
