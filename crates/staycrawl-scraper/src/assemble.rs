use staycrawl_core::{
    parse_price_numeric, parse_score_clean, Facilities, HotelRecord, ListingCardSummary,
};

/// Merges a card summary with its facilities and derives the numeric price
/// and score.
#[must_use]
pub fn assemble_record(summary: ListingCardSummary, facilities: Facilities) -> HotelRecord {
    let price_numeric = summary.price.as_deref().and_then(parse_price_numeric);
    let score_clean = summary.score.as_deref().and_then(parse_score_clean);
    HotelRecord {
        name: summary.name,
        price: summary.price,
        score: summary.score,
        location: summary.location,
        distance: summary.distance,
        facilities,
        detail_url: summary.detail_url,
        price_numeric,
        score_clean,
    }
}

#[cfg(test)]
mod tests {
    use staycrawl_core::FacilityList;

    use super::*;

    fn summary(price: Option<&str>, score: Option<&str>) -> ListingCardSummary {
        ListingCardSummary {
            name: "Hotel Lumière".to_owned(),
            price: price.map(str::to_owned),
            score: score.map(str::to_owned),
            location: Some("Paris".to_owned()),
            distance: None,
            detail_url: "https://x/h".to_owned(),
        }
    }

    #[test]
    fn derives_numeric_fields() {
        let record = assemble_record(
            summary(Some("US$1,234.50"), Some("Scored 8.7 Fabulous")),
            Facilities::Listed(FacilityList::from_labels(["Pool"])),
        );
        assert_eq!(record.price_numeric.map(|p| p.to_string()).as_deref(), Some("1234.50"));
        assert_eq!(record.score_clean, Some(8.7));
        assert_eq!(record.facilities.display(), "Pool");
        assert_eq!(record.location.as_deref(), Some("Paris"));
    }

    #[test]
    fn missing_display_values_leave_numerics_empty() {
        let record = assemble_record(summary(None, None), Facilities::Unavailable);
        assert_eq!(record.price_numeric, None);
        assert_eq!(record.score_clean, None);
        assert_eq!(record.facilities.display(), "N/A");
    }

    #[test]
    fn integer_score_has_no_clean_value() {
        let record = assemble_record(summary(Some("€ 90"), Some("9")), Facilities::NotFound);
        assert_eq!(record.price_numeric.map(|p| p.to_string()).as_deref(), Some("90"));
        assert_eq!(record.score_clean, None);
    }
}
