//! Shared "prediction pipeline" logic used by the CLI subcommands.
//!
//! validate request -> fetch history (or demo data) -> ensemble -> bundle
//!
//! Presentation (text, JSON, plot) is left to the caller.

use chrono::Local;
use tracing::info;

use crate::config::Settings;
use crate::data::fetcher::fallback;
use crate::data::{QuoteSource, RetryPolicy, StockFetcher, YahooClient};
use crate::domain::{ModelBundle, PriceHistory};
use crate::ensemble::{EnsembleConfig, predict_all_models_with};
use crate::error::AppError;

/// Longest forecast a request may ask for.
pub const MAX_HORIZON: usize = 30;

/// Fewest closes the ensemble will run on.
pub const MIN_HISTORY: usize = 60;

/// A validated-on-use prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub symbol: String,
    pub horizon: usize,
    pub days: u32,
    pub offline: bool,
}

impl PredictRequest {
    pub fn new(symbol: impl Into<String>, horizon: usize, settings: &Settings) -> Self {
        Self {
            symbol: symbol.into(),
            horizon,
            days: settings.history_days,
            offline: false,
        }
    }
}

/// All computed outputs of a single prediction request.
#[derive(Debug, Clone)]
pub struct PredictionRun {
    pub history: PriceHistory,
    pub horizon: usize,
    pub bundle: ModelBundle,
}

/// Trim and uppercase a ticker; empty input is rejected.
pub fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::new(2, "Symbol must not be empty."));
    }
    Ok(symbol)
}

pub fn validate_horizon(horizon: usize) -> Result<usize, AppError> {
    if !(1..=MAX_HORIZON).contains(&horizon) {
        return Err(AppError::new(
            2,
            format!("Horizon must be between 1 and {MAX_HORIZON} days (got {horizon})."),
        ));
    }
    Ok(horizon)
}

/// Load `days` of history, from the network unless `offline`.
pub fn load_history(
    symbol: &str,
    days: u32,
    offline: bool,
    settings: &Settings,
) -> Result<PriceHistory, AppError> {
    if days == 0 {
        return Err(AppError::new(2, "History must cover at least one day."));
    }
    if offline {
        info!(%symbol, days, "offline mode, using demo data");
        return fallback(symbol, days, Local::now().date_naive());
    }
    let fetcher = StockFetcher::new(
        YahooClient::new(settings.quote_url.clone()),
        RetryPolicy::from_settings(settings),
    );
    fetcher.fetch(symbol, days)
}

/// Execute the full pipeline against the configured quote source.
pub fn run_prediction(
    request: &PredictRequest,
    settings: &Settings,
) -> Result<PredictionRun, AppError> {
    let symbol = normalize_symbol(&request.symbol)?;
    let horizon = validate_horizon(request.horizon)?;
    let history = load_history(&symbol, request.days, request.offline, settings)?;
    run_prediction_on(history, horizon, &EnsembleConfig::default())
}

/// Execute the pipeline with a caller-supplied quote source.
pub fn run_prediction_with<S: QuoteSource>(
    request: &PredictRequest,
    fetcher: &StockFetcher<S>,
    config: &EnsembleConfig,
) -> Result<PredictionRun, AppError> {
    let symbol = normalize_symbol(&request.symbol)?;
    let horizon = validate_horizon(request.horizon)?;
    let history = fetcher.fetch(&symbol, request.days)?;
    run_prediction_on(history, horizon, config)
}

/// Run the ensemble on already-loaded history.
pub fn run_prediction_on(
    history: PriceHistory,
    horizon: usize,
    config: &EnsembleConfig,
) -> Result<PredictionRun, AppError> {
    let horizon = validate_horizon(horizon)?;
    if history.len() < MIN_HISTORY {
        return Err(AppError::new(
            3,
            format!(
                "Insufficient data for {}: need at least {MIN_HISTORY} closes, have {}.",
                history.symbol,
                history.len()
            ),
        ));
    }

    info!(symbol = %history.symbol, records = history.len(), horizon, "running models");
    let bundle = predict_all_models_with(&history.closes(), horizon, config);

    Ok(PredictionRun {
        history,
        horizon,
        bundle,
    })
}

/// Convenience entry point: environment settings, remote data, default models.
pub fn predict(symbol: &str, horizon: usize) -> Result<PredictionRun, AppError> {
    let settings = Settings::from_env()?;
    run_prediction(&PredictRequest::new(symbol, horizon, &settings), &settings)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::data::generate_demo_until;
    use crate::domain::{ModelKind, PriceBar};
    use crate::models::{ForestConfig, LstmConfig};

    fn quick_config() -> EnsembleConfig {
        EnsembleConfig {
            lstm: LstmConfig {
                lookback: 10,
                layers: vec![4],
                epochs: 2,
                ..LstmConfig::default()
            },
            forest: ForestConfig {
                n_trees: 8,
                ..ForestConfig::default()
            },
            ..EnsembleConfig::default()
        }
    }

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    struct DownSource;

    impl QuoteSource for DownSource {
        fn download(
            &self,
            _: &str,
            _: NaiveDate,
            _: NaiveDate,
            _: Duration,
        ) -> Result<Vec<PriceBar>, AppError> {
            Err(AppError::new(4, "connection refused"))
        }
    }

    #[test]
    fn symbol_is_trimmed_and_uppercased() {
        assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("   ").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn horizon_must_be_one_to_thirty() {
        assert_eq!(validate_horizon(0).unwrap_err().exit_code(), 2);
        assert_eq!(validate_horizon(31).unwrap_err().exit_code(), 2);
        assert_eq!(validate_horizon(1).unwrap(), 1);
        assert_eq!(validate_horizon(30).unwrap(), 30);
    }

    #[test]
    fn fewer_than_sixty_closes_is_insufficient() {
        let history = generate_demo_until("AAPL", 59, end()).unwrap();
        let err = run_prediction_on(history, 5, &quick_config()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("Insufficient data"));
    }

    #[test]
    fn demo_history_yields_full_bundle() {
        let history = generate_demo_until("MSFT", 120, end()).unwrap();
        let run = run_prediction_on(history, 5, &quick_config()).unwrap();
        assert_eq!(run.horizon, 5);
        assert_eq!(run.bundle.len(), 4);
        for kind in ModelKind::ALL {
            assert_eq!(run.bundle.forecast(kind).unwrap().predictions.len(), 5, "{kind:?}");
        }
    }

    #[test]
    fn unreachable_source_still_produces_a_run() {
        let policy = RetryPolicy {
            retries: 2,
            timeout: Duration::from_secs(1),
            backoff_step: Duration::ZERO,
        };
        let fetcher = StockFetcher::new(DownSource, policy);
        let request = PredictRequest {
            symbol: " tsla".into(),
            horizon: 3,
            days: 90,
            offline: false,
        };
        let run = run_prediction_with(&request, &fetcher, &quick_config()).unwrap();
        assert_eq!(run.history.symbol, "TSLA");
        assert_eq!(run.history.len(), 90);
        assert_eq!(run.bundle.len(), 4);
    }

    #[test]
    fn invalid_horizon_is_rejected_before_fetching() {
        let fetcher = StockFetcher::new(DownSource, RetryPolicy::default());
        let request = PredictRequest {
            symbol: "AAPL".into(),
            horizon: 45,
            days: 90,
            offline: false,
        };
        let err = run_prediction_with(&request, &fetcher, &quick_config()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
