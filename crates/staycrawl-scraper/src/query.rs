//! Search-results URL construction.

use reqwest::Url;
use staycrawl_core::SearchRequest;

use crate::error::ScraperError;

/// Travel-purpose marker sent with every search.
const TRAVEL_PURPOSE: &str = "leisure";

/// Builds the search-results URL for `request` on top of `base`.
///
/// Query parameters: `ss`, `checkin`, `checkout`, `group_adults`,
/// `group_children`, `no_rooms`, `sb_travel_purpose`. Any query already on
/// `base` is kept.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidLocation`] if `base` is not an absolute URL.
pub fn build_search_url(base: &str, request: &SearchRequest) -> Result<Url, ScraperError> {
    let mut url = Url::parse(base).map_err(|e| ScraperError::InvalidLocation {
        location: base.to_owned(),
        reason: e.to_string(),
    })?;

    let occupancy = request.occupancy();
    url.query_pairs_mut()
        .append_pair("ss", request.destination())
        .append_pair("checkin", &request.check_in().format("%Y-%m-%d").to_string())
        .append_pair("checkout", &request.check_out().format("%Y-%m-%d").to_string())
        .append_pair("group_adults", &occupancy.adults.to_string())
        .append_pair("group_children", &occupancy.children.to_string())
        .append_pair("no_rooms", &occupancy.rooms.to_string())
        .append_pair("sb_travel_purpose", TRAVEL_PURPOSE);

    Ok(url)
}
