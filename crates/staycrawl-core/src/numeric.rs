//! Numeric columns derived from the display text of a listing card.
//!
//! Both parsers fail soft: anything that does not yield a number becomes
//! `None` and the record is still emitted.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

/// Parses a display price such as `"$1,234.50"` or `"€ 89"` into a decimal.
///
/// Every character other than an ASCII digit or `.` is dropped before
/// parsing, so thousands separators and currency symbols disappear.
#[must_use]
pub fn parse_price_numeric(display: &str) -> Option<Decimal> {
    let digits: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return None;
    }
    Decimal::from_str(&digits).ok()
}

/// Extracts the first decimal number (`8.7` in `"Scored 8.7 Very good"`)
/// from a display score.
///
/// Integer-only scores such as `"10"` do not match.
#[must_use]
pub fn parse_score_clean(display: &str) -> Option<f64> {
    let re = Regex::new(r"\d+\.\d+").expect("valid score regex");
    re.find(display).and_then(|m| m.as_str().parse::<f64>().ok())
}
