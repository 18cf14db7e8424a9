//! Fetch-with-retry and synthetic fallback.
//!
//! `StockFetcher::fetch` never fails for data reasons: when every download
//! attempt errors or comes back empty, it returns the deterministic demo series.

use std::time::Duration;

use chrono::{Duration as DateDuration, Local, NaiveDate};
use tracing::{info, warn};

use crate::config::Settings;
use crate::data::demo::generate_demo_until;
use crate::data::quotes::{QuoteSource, normalize_bars};
use crate::domain::{DataOrigin, PriceHistory};
use crate::error::AppError;

/// Attempt budget and linear backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub timeout: Duration,
    pub backoff_step: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            retries: settings.retries,
            timeout: settings.timeout,
            backoff_step: settings.backoff_step,
        }
    }

    /// Wait after the 1-based `attempt`, or `None` after the final attempt.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.retries {
            return None;
        }
        Some(self.backoff_step * attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Downloads daily history from a `QuoteSource`, falling back to demo data.
pub struct StockFetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: QuoteSource> StockFetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Fetch `days` calendar days of history ending today.
    pub fn fetch(&self, symbol: &str, days: u32) -> Result<PriceHistory, AppError> {
        self.fetch_until(symbol, days, Local::now().date_naive())
    }

    /// Fetch `days` calendar days of history ending at `end`.
    ///
    /// Only an error from the synthetic generator itself is returned.
    pub fn fetch_until(
        &self,
        symbol: &str,
        days: u32,
        end: NaiveDate,
    ) -> Result<PriceHistory, AppError> {
        let start = end - DateDuration::days(i64::from(days));
        info!(%symbol, %start, %end, "fetching price history");

        for attempt in 1..=self.policy.retries {
            info!(%symbol, attempt, retries = self.policy.retries, "download attempt");
            match self.source.download(symbol, start, end, self.policy.timeout) {
                Ok(bars) => {
                    let bars = normalize_bars(bars);
                    if !bars.is_empty() {
                        info!(%symbol, records = bars.len(), "fetched price history");
                        return Ok(PriceHistory::new(symbol, DataOrigin::Remote, bars));
                    }
                    warn!(%symbol, attempt, "quote source returned no data");
                }
                Err(err) => warn!(%symbol, attempt, error = %err, "download attempt failed"),
            }

            if let Some(wait) = self.policy.delay_after(attempt) {
                if !wait.is_zero() {
                    info!(%symbol, wait_secs = wait.as_secs_f64(), "backing off before retry");
                    std::thread::sleep(wait);
                }
            }
        }

        warn!(%symbol, retries = self.policy.retries, "data unavailable, using demo data");
        fallback(symbol, days, end)
    }
}

/// Synthetic history of exactly `days` bars ending at `end`.
pub fn fallback(symbol: &str, days: u32, end: NaiveDate) -> Result<PriceHistory, AppError> {
    let history = generate_demo_until(symbol, days as usize, end)?;
    info!(%symbol, records = history.len(), "generated demo history");
    Ok(history)
}
