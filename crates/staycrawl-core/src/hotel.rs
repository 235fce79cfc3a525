//! Listing, facility, and record types produced by the crawl pipeline.
//!
//! Missing data is modelled with `Option` and the [`Facilities`] enum. The
//! placeholder strings below only appear when a value is rendered for the
//! tabular export.

use std::collections::HashSet;

use rust_decimal::Decimal;

/// Rendered in place of any card field that could not be read.
pub const NOT_AVAILABLE: &str = "N/A";

/// Rendered when every facility layout was tried and none produced a label.
pub const FACILITIES_NOT_FOUND: &str = "Facilities not found";

/// Rendered for a facility list that exists but holds no labels.
pub const NO_FACILITIES_LISTED: &str = "No facilities listed";

/// Separator between facility labels in the exported table.
pub const FACILITY_SEPARATOR: &str = ", ";

/// Stands in for a [`FACILITY_SEPARATOR`] found inside a single label.
pub const LABEL_SEPARATOR_REPLACEMENT: &str = " - ";

/// Fields read from one search-results card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCardSummary {
    pub name: String,
    pub price: Option<String>,
    pub score: Option<String>,
    pub location: Option<String>,
    pub distance: Option<String>,
    /// Absolute URL of the hotel's detail page.
    pub detail_url: String,
}

/// Ordered, distinct facility labels.
///
/// Labels are trimmed, empty labels are dropped, and duplicates are removed
/// case-sensitively keeping the first occurrence. An inner
/// [`FACILITY_SEPARATOR`] is rewritten to [`LABEL_SEPARATOR_REPLACEMENT`] so
/// the joined display form always splits back into the same labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacilityList(Vec<String>);

impl FacilityList {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let deduped = labels
            .into_iter()
            .map(|label| {
                label
                    .as_ref()
                    .replace(FACILITY_SEPARATOR, LABEL_SEPARATOR_REPLACEMENT)
                    .trim()
                    .to_owned()
            })
            .filter(|label| !label.is_empty() && seen.insert(label.clone()))
            .collect();
        Self(deduped)
    }

    /// Rebuilds a list from its exported display form.
    #[must_use]
    pub fn parse_display(display: &str) -> Self {
        if display == NO_FACILITIES_LISTED {
            return Self::default();
        }
        Self::from_labels(display.split(FACILITY_SEPARATOR))
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn display(&self) -> String {
        if self.0.is_empty() {
            NO_FACILITIES_LISTED.to_owned()
        } else {
            self.0.join(FACILITY_SEPARATOR)
        }
    }
}

/// Outcome of facility extraction for one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Facilities {
    Listed(FacilityList),
    /// Every layout was tried and none yielded a label.
    NotFound,
    /// The detail page never loaded.
    Unavailable,
}

impl Facilities {
    /// Labels for downstream consumers. Never empty for the two sentinel
    /// variants: each yields exactly one placeholder label.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Facilities::Listed(list) => list.labels().iter().map(String::as_str).collect(),
            Facilities::NotFound => vec![FACILITIES_NOT_FOUND],
            Facilities::Unavailable => vec![NOT_AVAILABLE],
        }
    }

    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Facilities::Listed(list) => list.display(),
            Facilities::NotFound => FACILITIES_NOT_FOUND.to_owned(),
            Facilities::Unavailable => NOT_AVAILABLE.to_owned(),
        }
    }

    /// Inverse of [`Self::display`].
    #[must_use]
    pub fn parse_display(display: &str) -> Self {
        match display {
            FACILITIES_NOT_FOUND => Facilities::NotFound,
            NOT_AVAILABLE => Facilities::Unavailable,
            listed => Facilities::Listed(FacilityList::parse_display(listed)),
        }
    }

    /// True unless at least one real facility label is present.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Facilities::Listed(list) if !list.is_empty())
    }
}

/// One assembled output row.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelRecord {
    pub name: String,
    pub price: Option<String>,
    pub score: Option<String>,
    pub location: Option<String>,
    pub distance: Option<String>,
    pub facilities: Facilities,
    pub detail_url: String,
    pub price_numeric: Option<Decimal>,
    pub score_clean: Option<f64>,
}

/// Why a crawl produced no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// The results page loaded but no listing card appeared in time.
    NoListings,
    /// The results page itself could not be loaded.
    ListingsUnavailable { reason: String },
    /// Cards were found but every one of them was malformed.
    AllCardsSkipped,
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmptyReason::NoListings => write!(f, "no listings appeared on the results page"),
            EmptyReason::ListingsUnavailable { reason } => {
                write!(f, "results page could not be loaded: {reason}")
            }
            EmptyReason::AllCardsSkipped => write!(f, "every listing card was malformed"),
        }
    }
}

/// Records of one crawl in results-page order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrawlResult {
    pub records: Vec<HotelRecord>,
    pub cards_seen: usize,
    pub cards_skipped: usize,
    pub empty_reason: Option<EmptyReason>,
}

impl CrawlResult {
    #[must_use]
    pub fn empty(reason: EmptyReason) -> Self {
        Self {
            empty_reason: Some(reason),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn records_assembled(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
