//! Delimited-table export of crawl results, and the tolerant reader used by
//! the `report` command.
//!
//! Column order is fixed: `name, price, score, location,
//! distance_from_center, facilities, url, price_numeric, score_clean`.
//! Consumers depend on these names.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hotel::{CrawlResult, Facilities, HotelRecord, NOT_AVAILABLE};
use crate::numeric::{parse_price_numeric, parse_score_clean};

/// Substituted when a table file has no `facilities` column at all.
pub const MISSING_FACILITIES_PLACEHOLDER: &str = "No data available";

/// File-name prefix shared by every exported table.
pub const TABLE_FILE_PREFIX: &str = "hotels_data_";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error for {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no {TABLE_FILE_PREFIX}*.csv file found in {dir}")]
    NoTableFound { dir: String },
}

/// One row of the exported table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    #[serde(default = "not_available")]
    pub price: String,
    #[serde(default = "not_available")]
    pub score: String,
    #[serde(default = "not_available")]
    pub location: String,
    #[serde(default = "not_available")]
    pub distance_from_center: String,
    #[serde(default = "missing_facilities")]
    pub facilities: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub price_numeric: Option<Decimal>,
    #[serde(default)]
    pub score_clean: Option<f64>,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_owned()
}

fn missing_facilities() -> String {
    MISSING_FACILITIES_PLACEHOLDER.to_owned()
}

impl From<&HotelRecord> for TableRow {
    fn from(record: &HotelRecord) -> Self {
        let or_na = |field: &Option<String>| field.clone().unwrap_or_else(not_available);
        Self {
            name: record.name.clone(),
            price: or_na(&record.price),
            score: or_na(&record.score),
            location: or_na(&record.location),
            distance_from_center: or_na(&record.distance),
            facilities: record.facilities.display(),
            url: record.detail_url.clone(),
            price_numeric: record.price_numeric,
            score_clean: record.score_clean,
        }
    }
}

impl TableRow {
    /// Fills derived numeric columns that are absent by re-parsing the
    /// display text.
    fn backfill_numeric(mut self) -> Self {
        if self.price_numeric.is_none() {
            self.price_numeric = parse_price_numeric(&self.price);
        }
        if self.score_clean.is_none() {
            self.score_clean = parse_score_clean(&self.score);
        }
        self
    }

    /// Typed view of the `facilities` cell. A missing or blank column reads
    /// as [`Facilities::Unavailable`].
    #[must_use]
    pub fn facilities(&self) -> Facilities {
        let cell = self.facilities.trim();
        if cell.is_empty() || cell == MISSING_FACILITIES_PLACEHOLDER {
            Facilities::Unavailable
        } else {
            Facilities::parse_display(cell)
        }
    }
}

/// Builds the output file name for a destination and crawl date, e.g.
/// `hotels_data_Paris_Madrid_20260517.csv` for `"Paris, Madrid"`.
#[must_use]
pub fn table_file_name(destination: &str, date: NaiveDate) -> String {
    let slug = destination.replace(',', "").replace(' ', "_");
    format!("{TABLE_FILE_PREFIX}{slug}_{}.csv", date.format("%Y%m%d"))
}

/// Writes every record of `result` to `path`, header first.
///
/// # Errors
///
/// Returns [`TableError::Io`] if the file cannot be created and
/// [`TableError::Csv`] if a row cannot be written.
pub fn write_table(path: &Path, result: &CrawlResult) -> Result<(), TableError> {
    let file = std::fs::File::create(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_rows(file, result.records.iter().map(TableRow::from), &path.display().to_string())?;
    Ok(())
}

fn write_rows<W, I>(out: W, rows: I, target: &str) -> Result<W, TableError>
where
    W: std::io::Write,
    I: IntoIterator<Item = TableRow>,
{
    let csv_err = |source| TableError::Csv {
        path: target.to_owned(),
        source,
    };
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.into_inner().map_err(|e| TableError::Io {
        path: target.to_owned(),
        source: e.into_error(),
    })
}

/// Reads rows from CSV text, tolerating missing derived columns and a
/// missing `facilities` column.
///
/// # Errors
///
/// Returns [`TableError::Csv`] if the text is not a readable table.
pub fn read_rows<R: std::io::Read>(
    reader: R,
    source_name: &str,
) -> Result<Vec<TableRow>, TableError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<TableRow>()
        .map(|row| {
            row.map(TableRow::backfill_numeric)
                .map_err(|source| TableError::Csv {
                    path: source_name.to_owned(),
                    source,
                })
        })
        .collect()
}

/// Reads a table file from disk. A file that is not valid UTF-8 is decoded
/// as Latin-1 instead.
///
/// # Errors
///
/// Returns [`TableError::Io`] if the file cannot be read and
/// [`TableError::Csv`] if it cannot be parsed.
pub fn read_table(path: &Path) -> Result<Vec<TableRow>, TableError> {
    let bytes = std::fs::read(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), "table is not UTF-8, decoding as Latin-1");
            decode_latin1(e.as_bytes())
        }
    };
    read_rows(text.as_bytes(), &path.display().to_string())
}

/// Every Latin-1 byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Finds the most recently modified `hotels_data_*.csv` in `dir`.
///
/// # Errors
///
/// Returns [`TableError::Io`] if the directory cannot be listed and
/// [`TableError::NoTableFound`] if it holds no table file.
pub fn latest_table(dir: &Path) -> Result<PathBuf, TableError> {
    let io_err = |source| TableError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let is_table = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(TABLE_FILE_PREFIX) && n.ends_with(".csv"));
        if !is_table {
            continue;
        }
        let modified = entry.metadata().and_then(|m| m.modified()).map_err(io_err)?;
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| TableError::NoTableFound {
            dir: dir.display().to_string(),
        })
}
