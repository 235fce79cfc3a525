mod crawl;
mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "staycrawl")]
#[command(about = "Hotel listing crawler and report tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl search results for a destination and write a table file.
    Crawl(CrawlArgs),
    /// Summarize the most recent (or a given) table file.
    Report(ReportArgs),
    /// Show what a site's robots.txt says about generic crawlers.
    Robots {
        /// Site origin, e.g. `https://www.booking.com`. Defaults to
        /// `STAYCRAWL_ROBOTS_DOMAIN`.
        #[arg(long)]
        domain: Option<String>,
    },
}

#[derive(Debug, Args)]
struct CrawlArgs {
    #[arg(long)]
    destination: String,
    /// Check-in date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    checkin: Option<String>,
    /// Check-out date (YYYY-MM-DD). Defaults to a week after today.
    #[arg(long)]
    checkout: Option<String>,
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    adults: i64,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    children: i64,
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    rooms: i64,
    #[arg(long, default_value_t = staycrawl_core::DEFAULT_RESULT_CAP)]
    max_results: usize,
    /// Show the browser window.
    #[arg(long)]
    headed: bool,
    /// Directory for the table file. Defaults to `STAYCRAWL_OUTPUT_DIR`.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// Table file to read. Overrides `--dir`.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Directory searched for the newest table file. Defaults to
    /// `STAYCRAWL_OUTPUT_DIR`.
    #[arg(long)]
    dir: Option<PathBuf>,
    #[arg(long)]
    min_price: Option<Decimal>,
    #[arg(long)]
    max_price: Option<Decimal>,
    #[arg(long)]
    min_score: Option<f64>,
    #[arg(long)]
    max_score: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = staycrawl_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Crawl(args) => crawl::run_crawl_command(&config, &args).await,
        Commands::Report(args) => report::run_report(&config, &args),
        Commands::Robots { domain } => {
            let domain = domain.as_deref().unwrap_or(&config.robots_domain);
            run_robots(&config, domain).await
        }
    }
}

async fn run_robots(config: &staycrawl_core::AppConfig, domain: &str) -> anyhow::Result<()> {
    let advisor = staycrawl_scraper::RobotsAdvisor::new(
        config.http_timeout_secs,
        &config.user_agent,
        config.http_max_retries,
        config.http_backoff_base_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
    let report = advisor.analyze(domain).await?;

    println!("robots.txt: {}", report.robots_url);
    match report.crawl_delay {
        Some(delay) => println!("crawl delay: {delay}s"),
        None => println!("crawl delay: not set"),
    }
    if report.sitemaps.is_empty() {
        println!("sitemaps: none");
    } else {
        println!("sitemaps:");
        for sitemap in &report.sitemaps {
            println!("  {sitemap}");
        }
    }
    println!("can fetch /: {}", report.can_fetch_home);
    println!(
        "can fetch {}: {}",
        staycrawl_scraper::robots::SEARCH_RESULTS_PATH,
        report.can_fetch_search
    );
    Ok(())
}
