//! Validated search request handed to the crawl pipeline.

use chrono::NaiveDate;
use thiserror::Error;

/// Default number of listing cards to follow when the caller does not say.
pub const DEFAULT_RESULT_CAP: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("destination must not be empty")]
    EmptyDestination,

    #[error("check-in {check_in} must be before check-out {check_out}")]
    DateOrder {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("result cap must be at least 1")]
    ZeroResultCap,

    #[error("{field} must not be negative (got {value})")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("invalid date \"{input}\": expected YYYY-MM-DD")]
    InvalidDate { input: String },
}

/// Guest and room counts for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub adults: u32,
    pub children: u32,
    pub rooms: u32,
}

impl Default for Occupancy {
    fn default() -> Self {
        Self {
            adults: 2,
            children: 0,
            rooms: 1,
        }
    }
}

impl Occupancy {
    /// Builds an occupancy from signed counts as typed by a user.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeCount`] for the first negative count.
    pub fn from_signed(adults: i64, children: i64, rooms: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            adults: non_negative("adults", adults)?,
            children: non_negative("children", children)?,
            rooms: non_negative("rooms", rooms)?,
        })
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::NegativeCount { field, value })
}

/// One crawl's query. Immutable once built; the constructor enforces
/// `check_in < check_out`, a non-empty destination, and `result_cap >= 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    destination: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    occupancy: Occupancy,
    result_cap: usize,
}

impl SearchRequest {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when any invariant is violated.
    pub fn new(
        destination: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        occupancy: Occupancy,
        result_cap: usize,
    ) -> Result<Self, ValidationError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(ValidationError::EmptyDestination);
        }
        if check_in >= check_out {
            return Err(ValidationError::DateOrder {
                check_in,
                check_out,
            });
        }
        if result_cap == 0 {
            return Err(ValidationError::ZeroResultCap);
        }

        Ok(Self {
            destination: destination.to_owned(),
            check_in,
            check_out,
            occupancy,
            result_cap,
        })
    }

    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    #[must_use]
    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    #[must_use]
    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    #[must_use]
    pub fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    #[must_use]
    pub fn result_cap(&self) -> usize {
        self.result_cap
    }
}

/// Parses a `YYYY-MM-DD` date as typed on the command line.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] if the input is not a calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        input: input.to_owned(),
    })
}
