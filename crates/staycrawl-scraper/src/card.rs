//! Field extraction from a single listing card.

use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use staycrawl_core::ListingCardSummary;

use crate::error::CardError;
use crate::listing::CardSnapshot;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid card field selector")
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[data-testid="title"]"#));
static PRICE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[data-testid="price-and-discounted-price"]"#));
static SCORE: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[data-testid="review-score"]"#));
static ADDRESS: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[data-testid="address"]"#));
static DISTANCE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[data-testid="distance"]"#));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));

/// Reads the summary fields of one card. Relative detail links are resolved
/// against `listings_url`.
///
/// # Errors
///
/// Returns a [`CardError`] when the card has no name or no usable detail
/// link; the card should then be skipped.
pub fn summarize_card(
    card: &CardSnapshot,
    listings_url: &Url,
) -> Result<ListingCardSummary, CardError> {
    let fragment = Html::parse_fragment(&card.html);
    let root = fragment.root_element();

    let name = field(root, &TITLE).ok_or(CardError::MissingName { index: card.index })?;

    let href = root
        .select(&LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| CardError::MissingDetailLink {
            index: card.index,
            name: name.clone(),
        })?;

    let detail_url = listings_url
        .join(href)
        .map_err(|_| CardError::InvalidDetailLink {
            index: card.index,
            name: name.clone(),
            href: href.to_owned(),
        })?;

    Ok(ListingCardSummary {
        price: field(root, &PRICE),
        score: field(root, &SCORE),
        location: field(root, &ADDRESS),
        distance: field(root, &DISTANCE),
        detail_url: detail_url.to_string(),
        name,
    })
}

/// Whitespace-collapsed text of the first match; empty text counts as absent.
fn field(root: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let element = root.select(selector).next()?;
    let text = collapse_whitespace(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listings_url() -> Url {
        Url::parse("https://www.booking.com/searchresults.html?ss=Paris").unwrap()
    }

    fn snapshot(html: &str) -> CardSnapshot {
        CardSnapshot {
            index: 3,
            html: html.to_owned(),
        }
    }

    #[test]
    fn reads_every_field() {
        let card = snapshot(
            r#"<div data-testid="property-card">
                 <a href="/hotel/fr/lumiere.html?aid=1"><img></a>
                 <div data-testid="title">  Hotel
                   Lumière </div>
                 <span data-testid="price-and-discounted-price">€ 1,234</span>
                 <div data-testid="review-score"><div>Scored 8.7</div><div>Fabulous</div></div>
                 <span data-testid="address">7th arr., Paris</span>
                 <span data-testid="distance">1.2 km from centre</span>
               </div>"#,
        );
        let summary = summarize_card(&card, &listings_url()).unwrap();
        assert_eq!(summary.name, "Hotel Lumière");
        assert_eq!(summary.price.as_deref(), Some("€ 1,234"));
        assert_eq!(summary.score.as_deref(), Some("Scored 8.7Fabulous"));
        assert_eq!(summary.location.as_deref(), Some("7th arr., Paris"));
        assert_eq!(summary.distance.as_deref(), Some("1.2 km from centre"));
        assert_eq!(
            summary.detail_url,
            "https://www.booking.com/hotel/fr/lumiere.html?aid=1"
        );
    }

    #[test]
    fn missing_optional_fields_are_none() {
        let card = snapshot(
            r#"<div><div data-testid="title">Plain</div><a href="https://other.example/h">h</a></div>"#,
        );
        let summary = summarize_card(&card, &listings_url()).unwrap();
        assert_eq!(summary.price, None);
        assert_eq!(summary.score, None);
        assert_eq!(summary.location, None);
        assert_eq!(summary.distance, None);
        assert_eq!(summary.detail_url, "https://other.example/h");
    }

    #[test]
    fn blank_optional_field_is_none() {
        let card = snapshot(
            r#"<div><div data-testid="title">X</div><span data-testid="distance">   </span><a href="/h">h</a></div>"#,
        );
        assert_eq!(summarize_card(&card, &listings_url()).unwrap().distance, None);
    }

    #[test]
    fn card_without_name_is_rejected() {
        let card = snapshot(r#"<div><div data-testid="title"> </div><a href="/h">h</a></div>"#);
        assert_eq!(
            summarize_card(&card, &listings_url()).unwrap_err(),
            CardError::MissingName { index: 3 }
        );
    }

    #[test]
    fn card_without_link_is_rejected() {
        let card = snapshot(r#"<div><div data-testid="title">Nowhere Inn</div><a>no href</a></div>"#);
        assert_eq!(
            summarize_card(&card, &listings_url()).unwrap_err(),
            CardError::MissingDetailLink {
                index: 3,
                name: "Nowhere Inn".to_owned()
            }
        );
    }

    #[test]
    fn only_the_first_anchor_is_considered() {
        let card = snapshot(
            r#"<div><div data-testid="title">Twin Inn</div><a>photos</a><a href="/h">h</a></div>"#,
        );
        assert_eq!(
            summarize_card(&card, &listings_url()).unwrap_err(),
            CardError::MissingDetailLink {
                index: 3,
                name: "Twin Inn".to_owned()
            }
        );
    }

    #[test]
    fn collapse_whitespace_joins_runs() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
