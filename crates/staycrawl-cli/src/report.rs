//! `report` command: key metrics of an exported table.

use std::collections::HashMap;
use std::path::PathBuf;

use rust_decimal::Decimal;
use staycrawl_core::{latest_table, read_table, AppConfig, TableRow, NOT_AVAILABLE};

use crate::ReportArgs;

/// Number of facilities listed in the frequency ranking.
const TOP_FACILITIES: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct RangeFilter {
    pub(crate) min_price: Option<Decimal>,
    pub(crate) max_price: Option<Decimal>,
    pub(crate) min_score: Option<f64>,
    pub(crate) max_score: Option<f64>,
}

impl RangeFilter {
    fn from_args(args: &ReportArgs) -> Self {
        Self {
            min_price: args.min_price,
            max_price: args.max_price,
            min_score: args.min_score,
            max_score: args.max_score,
        }
    }

    /// A bound on a column excludes rows whose value in that column is
    /// missing.
    fn accepts(&self, row: &TableRow) -> bool {
        let price_ok = match (self.min_price, self.max_price) {
            (None, None) => true,
            (min, max) => row.price_numeric.is_some_and(|p| {
                min.is_none_or(|m| p >= m) && max.is_none_or(|m| p <= m)
            }),
        };
        let score_ok = match (self.min_score, self.max_score) {
            (None, None) => true,
            (min, max) => row.score_clean.is_some_and(|s| {
                min.is_none_or(|m| s >= m) && max.is_none_or(|m| s <= m)
            }),
        };
        price_ok && score_ok
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct ReportMetrics {
    pub(crate) total: usize,
    pub(crate) average_price: Option<Decimal>,
    pub(crate) average_score: Option<f64>,
    pub(crate) highest_rated: Option<String>,
    pub(crate) top_facilities: Vec<(String, usize)>,
}

pub(crate) fn compute_metrics(rows: &[TableRow]) -> ReportMetrics {
    let prices: Vec<Decimal> = rows.iter().filter_map(|r| r.price_numeric).collect();
    let average_price = if prices.is_empty() {
        None
    } else {
        let sum: Decimal = prices.iter().sum();
        Some((sum / Decimal::from(prices.len())).round_dp(2))
    };

    let scores: Vec<f64> = rows.iter().filter_map(|r| r.score_clean).collect();
    #[allow(clippy::cast_precision_loss)]
    let average_score =
        (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);

    // First row wins on ties.
    let highest_rated = rows
        .iter()
        .filter_map(|r| r.score_clean.map(|s| (s, r)))
        .fold(None::<(f64, &TableRow)>, |best, (s, r)| match best {
            Some((b, _)) if b >= s => best,
            _ => Some((s, r)),
        })
        .map(|(_, r)| r.name.clone());

    ReportMetrics {
        total: rows.len(),
        average_price,
        average_score,
        highest_rated,
        top_facilities: facility_ranking(rows),
    }
}

/// Most frequent facilities, highest count first, then alphabetically.
/// Rows without real facility labels are skipped.
fn facility_ranking(rows: &[TableRow]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for facilities in rows.iter().map(TableRow::facilities) {
        if facilities.is_sentinel() {
            continue;
        }
        for label in facilities.labels() {
            *counts.entry(label.to_owned()).or_default() += 1;
        }
    }
    let mut ranking: Vec<(String, usize)> = counts.into_iter().collect();
    ranking.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranking.truncate(TOP_FACILITIES);
    ranking
}

pub(crate) fn run_report(config: &AppConfig, args: &ReportArgs) -> anyhow::Result<()> {
    let path: PathBuf = match &args.file {
        Some(file) => file.clone(),
        None => latest_table(args.dir.as_deref().unwrap_or(config.output_dir.as_path()))?,
    };
    let rows = read_table(&path)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "table loaded");

    let filter = RangeFilter::from_args(args);
    let filtered: Vec<TableRow> = rows.into_iter().filter(|r| filter.accepts(r)).collect();
    let metrics = compute_metrics(&filtered);

    println!("Report for {}", path.display());
    println!("Total hotels: {}", metrics.total);
    match metrics.average_price {
        Some(price) => println!("Average price: ${price:.2}"),
        None => println!("Average price: {NOT_AVAILABLE}"),
    }
    match metrics.average_score {
        Some(score) => println!("Average rating: {score:.1}/10"),
        None => println!("Average rating: {NOT_AVAILABLE}"),
    }
    println!(
        "Highest rated: {}",
        metrics.highest_rated.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    if metrics.top_facilities.is_empty() {
        println!("Top facilities: {NOT_AVAILABLE}");
    } else {
        println!("Top facilities:");
        for (label, count) in &metrics.top_facilities {
            println!("  {count:>3}  {label}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use staycrawl_core::{
        FACILITIES_NOT_FOUND, MISSING_FACILITIES_PLACEHOLDER, NO_FACILITIES_LISTED,
    };

    use super::*;

    fn row(name: &str, price: Option<&str>, score: Option<f64>, facilities: &str) -> TableRow {
        TableRow {
            name: name.to_owned(),
            price: price.unwrap_or(NOT_AVAILABLE).to_owned(),
            score: NOT_AVAILABLE.to_owned(),
            location: NOT_AVAILABLE.to_owned(),
            distance_from_center: NOT_AVAILABLE.to_owned(),
            facilities: facilities.to_owned(),
            url: String::new(),
            price_numeric: price.map(|p| Decimal::from_str(p).unwrap()),
            score_clean: score,
        }
    }

    fn sample() -> Vec<TableRow> {
        vec![
            row("Alfama Inn", Some("100"), Some(8.0), "Free WiFi, Pool"),
            row("Baixa Suites", Some("200"), Some(9.5), "Free WiFi, Spa"),
            row("Chiado House", None, None, NOT_AVAILABLE),
            row("Douro Lodge", Some("150"), Some(9.5), FACILITIES_NOT_FOUND),
        ]
    }

    #[test]
    fn metrics_over_all_rows() {
        let metrics = compute_metrics(&sample());
        assert_eq!(metrics.total, 4);
        assert_eq!(metrics.average_price, Some(Decimal::from(150)));
        assert!((metrics.average_score.unwrap() - 9.0).abs() < 1e-9);
        assert_eq!(metrics.highest_rated.as_deref(), Some("Baixa Suites"));
    }

    #[test]
    fn facility_ranking_skips_placeholders() {
        let metrics = compute_metrics(&sample());
        assert_eq!(
            metrics.top_facilities,
            vec![
                ("Free WiFi".to_owned(), 2),
                ("Pool".to_owned(), 1),
                ("Spa".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn facility_ranking_keeps_labels_with_inner_dash_whole() {
        let rows = vec![
            row("Evora Stay", None, None, "Parking - free, Pool"),
            row("Faro Rooms", None, None, "Parking - free"),
            row("Guarda Loft", None, None, NO_FACILITIES_LISTED),
            row("Horta Villa", None, None, MISSING_FACILITIES_PLACEHOLDER),
        ];
        assert_eq!(
            facility_ranking(&rows),
            vec![("Parking - free".to_owned(), 2), ("Pool".to_owned(), 1)]
        );
    }

    #[test]
    fn empty_table_has_no_averages() {
        let metrics = compute_metrics(&[]);
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.average_price, None);
        assert_eq!(metrics.average_score, None);
        assert_eq!(metrics.highest_rated, None);
        assert!(metrics.top_facilities.is_empty());
    }

    #[test]
    fn price_bounds_drop_rows_without_price() {
        let filter = RangeFilter {
            min_price: Some(Decimal::from(120)),
            ..RangeFilter::default()
        };
        let kept: Vec<_> = sample()
            .into_iter()
            .filter(|r| filter.accepts(r))
            .map(|r| r.name)
            .collect();
        assert_eq!(kept, ["Baixa Suites", "Douro Lodge"]);
    }

    #[test]
    fn score_bounds_are_inclusive() {
        let filter = RangeFilter {
            min_score: Some(8.0),
            max_score: Some(9.0),
            ..RangeFilter::default()
        };
        let kept: Vec<_> = sample()
            .into_iter()
            .filter(|r| filter.accepts(r))
            .map(|r| r.name)
            .collect();
        assert_eq!(kept, ["Alfama Inn"]);
    }

    #[test]
    fn no_bounds_keep_everything() {
        let filter = RangeFilter::default();
        assert!(sample().iter().all(|r| filter.accepts(r)));
    }
}
