use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_SEARCH_BASE_URL: &str = "https://www.booking.com/searchresults.html";

pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let env = parse_environment(&or_default("STAYCRAWL_ENV", "development"))?;
    let log_level = or_default("STAYCRAWL_LOG_LEVEL", "info");
    let search_base_url = or_default("STAYCRAWL_SEARCH_BASE_URL", DEFAULT_SEARCH_BASE_URL);
    let user_agent = or_default("STAYCRAWL_USER_AGENT", DEFAULT_USER_AGENT);
    let accept_language = or_default("STAYCRAWL_ACCEPT_LANGUAGE", "en-US,en;q=0.9");
    let headless = parse_bool("STAYCRAWL_HEADLESS", "true")?;

    let navigation_timeout_secs = parse_u64("STAYCRAWL_NAVIGATION_TIMEOUT_SECS", "60")?;
    let card_wait_secs = parse_u64("STAYCRAWL_CARD_WAIT_SECS", "30")?;
    let consent_wait_secs = parse_u64("STAYCRAWL_CONSENT_WAIT_SECS", "5")?;
    let facility_wait_secs = parse_u64("STAYCRAWL_FACILITY_WAIT_SECS", "3")?;

    let pacing_min_ms = parse_u64("STAYCRAWL_PACING_MIN_MS", "3000")?;
    let pacing_max_ms = parse_u64("STAYCRAWL_PACING_MAX_MS", "7000")?;
    if pacing_min_ms > pacing_max_ms {
        return Err(invalid(
            "STAYCRAWL_PACING_MIN_MS",
            format!("{pacing_min_ms} is greater than STAYCRAWL_PACING_MAX_MS ({pacing_max_ms})"),
        ));
    }
    let detail_settle_ms = parse_u64("STAYCRAWL_DETAIL_SETTLE_MS", "3000")?;

    let output_dir = PathBuf::from(or_default("STAYCRAWL_OUTPUT_DIR", "."));
    let robots_domain = or_default("STAYCRAWL_ROBOTS_DOMAIN", "https://www.booking.com");
    let http_timeout_secs = parse_u64("STAYCRAWL_HTTP_TIMEOUT_SECS", "30")?;
    let http_max_retries = parse_u32("STAYCRAWL_HTTP_MAX_RETRIES", "3")?;
    let http_backoff_base_secs = parse_u64("STAYCRAWL_HTTP_BACKOFF_BASE_SECS", "1")?;

    Ok(AppConfig {
        env,
        log_level,
        search_base_url,
        user_agent,
        accept_language,
        headless,
        navigation_timeout_secs,
        card_wait_secs,
        consent_wait_secs,
        facility_wait_secs,
        pacing_min_ms,
        pacing_max_ms,
        detail_settle_ms,
        output_dir,
        robots_domain,
        http_timeout_secs,
        http_max_retries,
        http_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STAYCRAWL_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
