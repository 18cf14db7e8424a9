//! Runtime settings for data acquisition.
//!
//! Precedence: built-in defaults, then environment (including `.env`), then CLI flags.

use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_QUOTE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Settings shared by the fetch pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the chart endpoint; the symbol is appended as a path segment.
    pub quote_url: String,
    /// Per-attempt download timeout.
    pub timeout: Duration,
    /// Maximum number of download attempts before falling back.
    pub retries: u32,
    /// Linear backoff unit; attempt `k` is followed by a wait of `k * backoff_step`.
    pub backoff_step: Duration,
    /// Calendar days of history requested per prediction.
    pub history_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quote_url: DEFAULT_QUOTE_URL.to_string(),
            timeout: Duration::from_secs(15),
            retries: 3,
            backoff_step: Duration::from_secs(5),
            history_days: 365,
        }
    }
}

impl Settings {
    /// Load settings from the process environment (after reading `.env`, if any).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(url) = lookup("FORECAST_QUOTE_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                return Err(AppError::new(2, "FORECAST_QUOTE_URL must not be empty."));
            }
            settings.quote_url = url;
        }
        if let Some(raw) = lookup("FORECAST_TIMEOUT_SECS") {
            let secs = parse_number::<u64>("FORECAST_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(AppError::new(2, "FORECAST_TIMEOUT_SECS must be > 0."));
            }
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("FORECAST_RETRIES") {
            settings.retries = parse_number("FORECAST_RETRIES", &raw)?;
        }
        if let Some(raw) = lookup("FORECAST_BACKOFF_SECS") {
            let secs = parse_number("FORECAST_BACKOFF_SECS", &raw)?;
            settings.backoff_step = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("FORECAST_HISTORY_DAYS") {
            let days = parse_number::<u32>("FORECAST_HISTORY_DAYS", &raw)?;
            if days == 0 {
                return Err(AppError::new(2, "FORECAST_HISTORY_DAYS must be > 0."));
            }
            settings.history_days = days;
        }

        Ok(settings)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::new(2, format!("Invalid value for {key}: '{raw}'.")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.retries, 3);
        assert_eq!(settings.timeout, Duration::from_secs(15));
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("FORECAST_QUOTE_URL", "http://localhost:9000/chart/"),
            ("FORECAST_RETRIES", "5"),
            ("FORECAST_BACKOFF_SECS", "0"),
            ("FORECAST_HISTORY_DAYS", " 120 "),
        ]))
        .unwrap();
        assert_eq!(settings.quote_url, "http://localhost:9000/chart");
        assert_eq!(settings.retries, 5);
        assert_eq!(settings.backoff_step, Duration::ZERO);
        assert_eq!(settings.history_days, 120);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Settings::from_lookup(lookup_from(&[("FORECAST_RETRIES", "many")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err =
            Settings::from_lookup(lookup_from(&[("FORECAST_TIMEOUT_SECS", "0")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
