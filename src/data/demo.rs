//! Deterministic synthetic price history used when the quote source is unavailable.
//!
//! The series is a geometric random walk seeded from the symbol, so repeated calls
//! for the same symbol and length reproduce the same data.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, Uniform};

use crate::domain::{DataOrigin, PriceBar, PriceHistory};
use crate::error::AppError;

/// Symbols with a known demo base price.
pub const SUPPORTED_SYMBOLS: [&str; 10] = [
    "AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "META", "NFLX", "NVDA", "AMD", "INTC",
];

const DEFAULT_BASE_PRICE: f64 = 100.0;

/// Daily log-return drift.
const RETURN_MEAN: f64 = 0.0005;
/// Daily log-return volatility.
const RETURN_STD: f64 = 0.02;

const VOLUME_MIN: u64 = 50_000_000;
const VOLUME_MAX: u64 = 100_000_000;

/// Starting price for the demo walk of `symbol`.
pub fn base_price(symbol: &str) -> f64 {
    match symbol {
        "AAPL" => 150.0,
        "GOOGL" => 140.0,
        "MSFT" => 380.0,
        "AMZN" => 170.0,
        "TSLA" => 240.0,
        "META" => 300.0,
        "NFLX" => 450.0,
        "NVDA" => 875.0,
        "AMD" => 140.0,
        "INTC" => 35.0,
        _ => DEFAULT_BASE_PRICE,
    }
}

/// Generate `days` consecutive daily bars ending at `end`.
pub fn generate_demo_until(
    symbol: &str,
    days: usize,
    end: NaiveDate,
) -> Result<PriceHistory, AppError> {
    if days == 0 {
        return Err(AppError::new(4, "Demo data requires at least one day."));
    }

    let mut rng = StdRng::seed_from_u64(symbol_seed(symbol));
    let returns = Normal::new(RETURN_MEAN, RETURN_STD)
        .map_err(|e| AppError::new(4, format!("Return distribution error: {e}")))?;

    let base = base_price(symbol);
    let mut cumulative = 0.0;
    let closes: Vec<f64> = (0..days)
        .map(|_| {
            cumulative += returns.sample(&mut rng);
            base * cumulative.exp()
        })
        .collect();

    // Each OHLCV column is drawn as a block, one value per day.
    let open_noise = Uniform::new(-0.01, 0.01);
    let high_noise = Uniform::new(0.01, 0.03);
    let low_noise = Uniform::new(-0.03, -0.01);
    let volume = Uniform::new(VOLUME_MIN, VOLUME_MAX);

    let opens: Vec<f64> = closes.iter().map(|c| c * (1.0 + open_noise.sample(&mut rng))).collect();
    let highs: Vec<f64> = closes.iter().map(|c| c * (1.0 + high_noise.sample(&mut rng))).collect();
    let lows: Vec<f64> = closes.iter().map(|c| c * (1.0 + low_noise.sample(&mut rng))).collect();
    let volumes: Vec<u64> = (0..days).map(|_| volume.sample(&mut rng)).collect();

    let start = end - Duration::days(days as i64 - 1);
    let bars = (0..days)
        .map(|i| PriceBar {
            date: start + Duration::days(i as i64),
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            adj_close: closes[i],
            volume: volumes[i],
        })
        .collect::<Vec<_>>();

    if bars.iter().any(|b| !(b.close.is_finite() && b.close > 0.0)) {
        return Err(AppError::new(4, "Demo generator produced a non-positive price."));
    }

    Ok(PriceHistory::new(symbol, DataOrigin::Synthetic, bars))
}

fn symbol_seed(symbol: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    symbol.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn demo_has_exact_length_and_ascending_dates() {
        let history = generate_demo_until("ZZZZ", 365, end()).unwrap();
        assert_eq!(history.len(), 365);
        assert_eq!(history.origin, DataOrigin::Synthetic);
        assert_eq!(history.last_date(), Some(end()));
        assert!(history.bars.windows(2).all(|w| w[1].date - w[0].date == Duration::days(1)));
    }

    #[test]
    fn demo_is_reproducible_per_symbol() {
        let a = generate_demo_until("UNKNOWN", 120, end()).unwrap();
        let b = generate_demo_until("UNKNOWN", 120, end()).unwrap();
        assert_eq!(a.bars, b.bars);

        let other = generate_demo_until("OTHER", 120, end()).unwrap();
        assert_ne!(a.closes(), other.closes());
    }

    #[test]
    fn demo_ohlcv_respects_offsets() {
        let history = generate_demo_until("AAPL", 200, end()).unwrap();
        for b in &history.bars {
            assert!(b.close > 0.0);
            assert!(b.high >= b.close * 1.01 - 1e-9 && b.high <= b.close * 1.03 + 1e-9);
            assert!(b.low <= b.close * 0.99 + 1e-9 && b.low >= b.close * 0.97 - 1e-9);
            assert!((b.open / b.close - 1.0).abs() <= 0.01 + 1e-12);
            assert!((VOLUME_MIN..VOLUME_MAX).contains(&b.volume));
            assert_eq!(b.adj_close, b.close);
        }
    }

    #[test]
    fn demo_starts_near_base_price() {
        let history = generate_demo_until("NVDA", 30, end()).unwrap();
        let first = history.bars[0].close;
        // One daily step away from the base; ±5 sigma is generous.
        assert!((first / 875.0).ln().abs() < 0.1, "first close {first}");
        assert_eq!(base_price("NOPE"), 100.0);
    }

    #[test]
    fn zero_days_is_an_error() {
        let err = generate_demo_until("AAPL", 0, end()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
