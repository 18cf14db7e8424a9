//! Runs every forecaster on one series and collects their outcomes.
//!
//! A model that cannot fit is recorded as absent; it never stops the others.

use std::time::Instant;

use tracing::{info, warn};

use crate::domain::{ModelBundle, ModelOutcome};
use crate::models::{
    ExponentialSmoothing, ForestConfig, ForestForecaster, Forecaster, LinearTrendForecaster,
    LstmConfig, LstmForecaster,
};

/// Per-model settings for one ensemble run.
#[derive(Debug, Clone, Default)]
pub struct EnsembleConfig {
    pub lstm: LstmConfig,
    pub forest: ForestConfig,
    pub smoothing: ExponentialSmoothing,
}

impl EnsembleConfig {
    fn forecasters(&self) -> Vec<Box<dyn Forecaster>> {
        vec![
            Box::new(LstmForecaster::new(self.lstm.clone())),
            Box::new(LinearTrendForecaster),
            Box::new(ForestForecaster::new(self.forest)),
            Box::new(self.smoothing),
        ]
    }
}

/// Forecast `horizon` steps with all four models using default settings.
pub fn predict_all_models(series: &[f64], horizon: usize) -> ModelBundle {
    predict_all_models_with(series, horizon, &EnsembleConfig::default())
}

/// Forecast `horizon` steps with all four models.
///
/// The returned bundle always has an entry for every model kind.
pub fn predict_all_models_with(
    series: &[f64],
    horizon: usize,
    config: &EnsembleConfig,
) -> ModelBundle {
    let mut bundle = ModelBundle::new();

    for model in config.forecasters() {
        let kind = model.kind();
        let started = Instant::now();
        info!(model = kind.key(), points = series.len(), horizon, "fitting model");

        let outcome = ModelOutcome::from(model.forecast(series, horizon));
        match &outcome {
            ModelOutcome::Forecast(result) => info!(
                model = kind.key(),
                rmse = result.rmse,
                mae = result.mae,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "model finished"
            ),
            ModelOutcome::Absent { reason } => {
                warn!(model = kind.key(), %reason, "model produced no forecast")
            }
        }
        bundle.insert(kind, outcome);
    }

    bundle
}
