//! Advisory robots.txt lookup.
//!
//! Reports what a site's robots.txt says about generic crawlers. The crawl
//! pipeline never consults it.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use texting_robots::Robot;

use crate::error::RobotsError;
use crate::rate_limit::retry_with_backoff;

/// Agent the rules are evaluated for.
const GENERIC_AGENT: &str = "*";

/// Path of the search-results page checked against the rules.
pub const SEARCH_RESULTS_PATH: &str = "/searchresults.en-us.html";

/// How the robots file was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotsSource {
    Fetched,
    /// Client error other than 401/403: treated as "allow everything".
    Missing,
    /// 401 or 403: treated as "disallow everything".
    Forbidden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RobotsReport {
    pub robots_url: String,
    pub source: RobotsSource,
    pub crawl_delay: Option<f32>,
    pub sitemaps: Vec<String>,
    pub can_fetch_home: bool,
    pub can_fetch_search: bool,
}

pub struct RobotsAdvisor {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl RobotsAdvisor {
    /// # Errors
    ///
    /// Returns [`RobotsError::Http`] if the HTTP client cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, RobotsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches `<domain>/robots.txt` and evaluates it for the generic agent.
    ///
    /// # Errors
    ///
    /// - [`RobotsError::InvalidDomain`] if `domain` is not an absolute URL.
    /// - [`RobotsError::RateLimited`] / [`RobotsError::Http`] once retries are
    ///   exhausted.
    /// - [`RobotsError::UnexpectedStatus`] for 5xx and other unexpected
    ///   statuses (not retried).
    /// - [`RobotsError::Parse`] if the file cannot be parsed.
    pub async fn analyze(&self, domain: &str) -> Result<RobotsReport, RobotsError> {
        let origin = Url::parse(domain.trim_end_matches('/')).map_err(|e| {
            RobotsError::InvalidDomain {
                domain: domain.to_owned(),
                reason: e.to_string(),
            }
        })?;
        let robots_url = origin
            .join("/robots.txt")
            .map_err(|e| RobotsError::InvalidDomain {
                domain: domain.to_owned(),
                reason: e.to_string(),
            })?;

        let (source, body) = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.fetch(&robots_url)
        })
        .await?;

        let report = evaluate(&origin, robots_url.as_str(), source, &body)?;
        tracing::info!(
            url = %report.robots_url,
            source = ?report.source,
            crawl_delay = ?report.crawl_delay,
            sitemaps = report.sitemaps.len(),
            "robots.txt analyzed"
        );
        Ok(report)
    }

    async fn fetch(&self, url: &Url) -> Result<(RobotsSource, String), RobotsError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(RobotsError::RateLimited {
                domain: url.host_str().unwrap_or_default().to_owned(),
                retry_after_secs,
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok((RobotsSource::Forbidden, String::new()));
        }
        if status.is_client_error() {
            return Ok((RobotsSource::Missing, String::new()));
        }
        if !status.is_success() {
            return Err(RobotsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok((RobotsSource::Fetched, response.text().await?))
    }
}

fn evaluate(
    origin: &Url,
    robots_url: &str,
    source: RobotsSource,
    body: &str,
) -> Result<RobotsReport, RobotsError> {
    let base = RobotsReport {
        robots_url: robots_url.to_owned(),
        source,
        crawl_delay: None,
        sitemaps: Vec::new(),
        can_fetch_home: true,
        can_fetch_search: true,
    };
    match source {
        RobotsSource::Missing => return Ok(base),
        RobotsSource::Forbidden => {
            return Ok(RobotsReport {
                can_fetch_home: false,
                can_fetch_search: false,
                ..base
            })
        }
        RobotsSource::Fetched => {}
    }

    let robot = Robot::new(GENERIC_AGENT, body.as_bytes()).map_err(|e| RobotsError::Parse {
        url: robots_url.to_owned(),
        reason: e.to_string(),
    })?;
    let allowed = |path: &str| {
        origin
            .join(path)
            .is_ok_and(|url| robot.allowed(url.as_str()))
    };

    Ok(RobotsReport {
        crawl_delay: robot.delay,
        sitemaps: robot.sitemaps.clone(),
        can_fetch_home: allowed("/"),
        can_fetch_search: allowed(SEARCH_RESULTS_PATH),
        ..base
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://hotels.test").unwrap()
    }

    fn fetched(body: &str) -> RobotsReport {
        evaluate(
            &origin(),
            "https://hotels.test/robots.txt",
            RobotsSource::Fetched,
            body,
        )
        .unwrap()
    }

    #[test]
    fn disallowed_search_path_is_reported() {
        let report = fetched(
            "User-agent: *\nDisallow: /searchresults\nCrawl-delay: 2\nSitemap: https://hotels.test/sitemap.xml\n",
        );
        assert!(report.can_fetch_home);
        assert!(!report.can_fetch_search);
        assert_eq!(report.crawl_delay, Some(2.0));
        assert_eq!(report.sitemaps, ["https://hotels.test/sitemap.xml"]);
    }

    #[test]
    fn rules_for_other_agents_do_not_apply() {
        let report = fetched("User-agent: BadBot\nDisallow: /\n");
        assert!(report.can_fetch_home);
        assert!(report.can_fetch_search);
        assert_eq!(report.crawl_delay, None);
    }

    #[test]
    fn missing_file_allows_everything() {
        let report = evaluate(&origin(), "u", RobotsSource::Missing, "").unwrap();
        assert!(report.can_fetch_home && report.can_fetch_search);
    }

    #[test]
    fn forbidden_file_disallows_everything() {
        let report = evaluate(&origin(), "u", RobotsSource::Forbidden, "").unwrap();
        assert!(!report.can_fetch_home && !report.can_fetch_search);
    }
}
