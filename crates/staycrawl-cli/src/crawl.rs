//! `crawl` command: validate input, run the pipeline, write the table.

use std::path::PathBuf;

use chrono::{Days, Local, NaiveDate};
use staycrawl_core::{parse_date, table_file_name, write_table, AppConfig, Occupancy, SearchRequest};

use crate::CrawlArgs;

/// Nights between the default check-in and check-out dates.
const DEFAULT_STAY_NIGHTS: u64 = 7;

/// Turns command-line input into a validated request. Missing dates default
/// to `today` and a week after `today`.
pub(crate) fn build_request(args: &CrawlArgs, today: NaiveDate) -> anyhow::Result<SearchRequest> {
    let check_in = match args.checkin.as_deref() {
        Some(input) => parse_date(input)?,
        None => today,
    };
    let check_out = match args.checkout.as_deref() {
        Some(input) => parse_date(input)?,
        None => today
            .checked_add_days(Days::new(DEFAULT_STAY_NIGHTS))
            .ok_or_else(|| anyhow::anyhow!("default check-out date is out of range"))?,
    };
    let occupancy = Occupancy::from_signed(args.adults, args.children, args.rooms)?;
    Ok(SearchRequest::new(
        &args.destination,
        check_in,
        check_out,
        occupancy,
        args.max_results,
    )?)
}

/// Runs one crawl with Chromium and writes its table file.
///
/// # Errors
///
/// Returns an error for invalid input, a browser that cannot start or
/// dies mid-crawl, or a table file that cannot be written.
pub(crate) async fn run_crawl_command(config: &AppConfig, args: &CrawlArgs) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let request = build_request(args, today)?;

    let mut config = config.clone();
    if args.headed {
        config.headless = false;
    }

    let result = staycrawl_scraper::crawl_with_chromium(&config, &request).await?;

    if let Some(reason) = &result.empty_reason {
        println!("No hotels were scraped: {reason}");
        return Ok(());
    }

    let dir: PathBuf = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", dir.display()))?;
    let path = dir.join(table_file_name(request.destination(), today));
    write_table(&path, &result)?;

    println!(
        "Scraped {} hotels ({} of {} cards skipped). Saved to {}",
        result.records_assembled(),
        result.cards_skipped,
        result.cards_seen,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use staycrawl_core::ValidationError;

    use super::*;

    fn args(destination: &str) -> CrawlArgs {
        CrawlArgs {
            destination: destination.to_owned(),
            checkin: None,
            checkout: None,
            adults: 2,
            children: 0,
            rooms: 1,
            max_results: 20,
            headed: false,
            output_dir: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn dates_default_to_a_week_from_today() {
        let request = build_request(&args("Porto"), today()).unwrap();
        assert_eq!(request.check_in(), today());
        assert_eq!(
            request.check_out(),
            NaiveDate::from_ymd_opt(2026, 10, 24).unwrap()
        );
        assert_eq!(request.result_cap(), 20);
    }

    #[test]
    fn explicit_dates_are_parsed() {
        let mut a = args("Porto");
        a.checkin = Some("2026-12-01".to_owned());
        a.checkout = Some("2026-12-03".to_owned());
        let request = build_request(&a, today()).unwrap();
        assert_eq!(request.check_in(), NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let mut a = args("Porto");
        a.checkin = Some("2026-12-03".to_owned());
        a.checkout = Some("2026-12-01".to_owned());
        let err = build_request(&a, today()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::DateOrder { .. })
        ));
    }

    #[test]
    fn negative_counts_are_rejected() {
        let mut a = args("Porto");
        a.children = -1;
        let err = build_request(&a, today()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::NegativeCount { field: "children", .. })
        ));
    }

    #[test]
    fn blank_destination_is_rejected() {
        let err = build_request(&args("   "), today()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::EmptyDestination)
        ));
    }
}
