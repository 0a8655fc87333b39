use std::path::PathBuf;

use chrono::NaiveTime;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so only malformed values fail.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
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

    let backend_url = or_default(
        "PRICEFEED_BACKEND_URL",
        "http://localhost:5000/api/scraper/price",
    );
    if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
        return Err(invalid(
            "PRICEFEED_BACKEND_URL",
            format!("expected an http(s) URL, got \"{backend_url}\""),
        ));
    }

    let state_path = PathBuf::from(or_default("PRICEFEED_STATE_PATH", "last_run.json"));
    let sites_path = lookup("PRICEFEED_SITES_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let log_level = or_default("PRICEFEED_LOG_LEVEL", "info");

    let page_load_timeout_secs = parse_u64("PRICEFEED_PAGE_LOAD_TIMEOUT_SECS", "30")?;
    let submit_timeout_secs = parse_u64("PRICEFEED_SUBMIT_TIMEOUT_SECS", "10")?;
    let submit_delay_ms = parse_u64("PRICEFEED_SUBMIT_DELAY_MS", "500")?;
    let fetch_max_retries = parse_u32("PRICEFEED_FETCH_MAX_RETRIES", "2")?;
    let fetch_backoff_base_secs = parse_u64("PRICEFEED_FETCH_BACKOFF_BASE_SECS", "3")?;
    let run_interval_days = parse_u32("PRICEFEED_RUN_INTERVAL_DAYS", "2")?;
    let schedule_time = parse_schedule_time(&or_default("PRICEFEED_SCHEDULE_TIME", "02:00"))
        .map_err(|reason| invalid("PRICEFEED_SCHEDULE_TIME", reason))?;

    Ok(AppConfig {
        backend_url,
        state_path,
        sites_path,
        log_level,
        page_load_timeout_secs,
        submit_timeout_secs,
        submit_delay_ms,
        fetch_max_retries,
        fetch_backoff_base_secs,
        run_interval_days,
        schedule_time,
    })
}

/// Parse a 24-hour `HH:MM` time of day.
fn parse_schedule_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM, got \"{raw}\": {e}"))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
